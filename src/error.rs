use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use thiserror::Error;
use tracing::{error, warn};

#[derive(Error, Debug)]
pub enum PortalError {
    #[error("No valid session - please sign in")]
    Unauthenticated,

    #[error("Access denied: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

impl IntoResponse for PortalError {
    fn into_response(self) -> Response {
        match self {
            PortalError::Unauthenticated => Redirect::to("/login").into_response(),
            PortalError::Forbidden(reason) => {
                warn!(%reason, "forbidden");
                (StatusCode::FORBIDDEN, format!("Access denied: {reason}")).into_response()
            }
            PortalError::NotFound(what) => {
                (StatusCode::NOT_FOUND, format!("Not found: {what}")).into_response()
            }
            PortalError::Database(err) => {
                error!(error = %err, "query failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
            PortalError::Template(err) => {
                error!(error = %err, "template render failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthenticated_redirects_to_login() {
        let response = PortalError::Unauthenticated.into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get("location").and_then(|v| v.to_str().ok()),
            Some("/login")
        );
    }

    #[test]
    fn status_codes_follow_variant() {
        assert_eq!(
            PortalError::Forbidden("teacher".into()).into_response().status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            PortalError::NotFound("student".into()).into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            PortalError::Database(sqlx::Error::RowNotFound)
                .into_response()
                .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn internal_failures_do_not_leak_details() {
        let response = PortalError::Database(sqlx::Error::PoolTimedOut).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.headers().get("location").is_none());
    }
}
