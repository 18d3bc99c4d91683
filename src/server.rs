use askama::Template;
use axum::body::Body;
use axum::extract::{FromRequestParts, Query, State};
use axum::http::request::Parts;
use axum::http::{header, HeaderValue, Request, StatusCode};
use axum::middleware::{from_fn, Next};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Form, Router};
use chrono::Utc;
use serde::Deserialize;
use sqlx::PgPool;
use tokio::net::TcpListener;
use tracing::{info, warn, Instrument};
use uuid::Uuid;

use crate::db;
use crate::error::PortalError;
use crate::pages::{
    AttendancePage, CoursesPage, DashboardPage, GradesPage, LibraryPage, LoginPage, PaymentsPage,
    ProfilePage,
};
use crate::profile::ProfileForm;
use crate::session::{self, StudentSession};

const STYLESHEET: &str = include_str!("../static/portal.css");

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
}

#[axum::async_trait]
impl FromRequestParts<AppState> for StudentSession {
    type Rejection = PortalError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = session::session_token(&parts.headers).ok_or(PortalError::Unauthenticated)?;
        let record = db::find_session(&state.pool, token).await?;
        session::authorize_student(record, Utc::now())
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { Redirect::to("/student/dashboard") }))
        .route("/healthz", get(healthz))
        .route("/static/portal.css", get(stylesheet))
        .route("/login", get(login))
        .route("/logout", get(logout))
        .route("/student/dashboard", get(dashboard))
        .route("/student/attendance", get(attendance))
        .route("/student/courses", get(courses))
        .route("/student/grades", get(grades))
        .route("/student/payments", get(payments))
        .route("/student/library", get(library))
        .route("/student/profile", get(profile).post(update_profile))
        .layer(from_fn(request_tracing_middleware))
        .with_state(state)
}

async fn request_tracing_middleware(request: Request<Body>, next: Next) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let span = tracing::info_span!(
        "http.request",
        request_id = %request_id,
        method = %request.method(),
        route = %request.uri().path(),
    );

    let mut response = next.run(request).instrument(span).await;
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert("x-request-id", value);
    }
    response
}

fn render<T: Template>(page: &T) -> Result<Html<String>, PortalError> {
    Ok(Html(page.render()?))
}

async fn healthz() -> &'static str {
    "ok"
}

async fn stylesheet() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/css; charset=utf-8")], STYLESHEET)
}

#[derive(Debug, Default, Deserialize)]
struct LoginParams {
    #[serde(default)]
    signed_out: bool,
}

async fn login(Query(params): Query<LoginParams>) -> Result<Html<String>, PortalError> {
    render(&LoginPage {
        signed_out: params.signed_out,
    })
}

async fn logout(State(state): State<AppState>, headers: axum::http::HeaderMap) -> Result<Response, PortalError> {
    if let Some(token) = session::session_token(&headers) {
        db::close_session(&state.pool, token).await?;
        info!("session closed");
    }
    Ok((
        [(header::SET_COOKIE, session::cleared_session_cookie())],
        Redirect::to("/login?signed_out=true"),
    )
        .into_response())
}

async fn dashboard(
    State(state): State<AppState>,
    student: StudentSession,
) -> Result<Html<String>, PortalError> {
    render(&DashboardPage::load(&state.pool, student.profile_id).await?)
}

async fn attendance(
    State(state): State<AppState>,
    student: StudentSession,
) -> Result<Html<String>, PortalError> {
    render(&AttendancePage::load(&state.pool, student.profile_id).await?)
}

async fn courses(
    State(state): State<AppState>,
    student: StudentSession,
) -> Result<Html<String>, PortalError> {
    render(&CoursesPage::load(&state.pool, student.profile_id).await?)
}

async fn grades(
    State(state): State<AppState>,
    student: StudentSession,
) -> Result<Html<String>, PortalError> {
    render(&GradesPage::load(&state.pool, student.profile_id).await?)
}

async fn payments(
    State(state): State<AppState>,
    student: StudentSession,
) -> Result<Html<String>, PortalError> {
    render(&PaymentsPage::load(&state.pool, student.profile_id).await?)
}

async fn library(
    State(state): State<AppState>,
    student: StudentSession,
) -> Result<Html<String>, PortalError> {
    render(&LibraryPage::load(&state.pool, student.profile_id).await?)
}

#[derive(Debug, Default, Deserialize)]
struct ProfileParams {
    #[serde(default)]
    saved: bool,
}

async fn profile(
    State(state): State<AppState>,
    student: StudentSession,
    Query(params): Query<ProfileParams>,
) -> Result<Html<String>, PortalError> {
    render(&ProfilePage::load(&state.pool, student.profile_id, params.saved).await?)
}

async fn update_profile(
    State(state): State<AppState>,
    student: StudentSession,
    Form(form): Form<ProfileForm>,
) -> Result<Response, PortalError> {
    let update = match form.validate() {
        Ok(update) => update,
        Err(errors) => return profile_errors(&state, student, form, errors).await,
    };

    match db::update_profile(&state.pool, student.profile_id, &update).await {
        Ok(true) => {
            info!(student_id = %student.profile_id, "profile updated");
            Ok(Redirect::to("/student/profile?saved=true").into_response())
        }
        Ok(false) => Err(PortalError::NotFound(format!("student {}", student.profile_id))),
        Err(sqlx::Error::Database(err)) if err.is_unique_violation() => {
            warn!(student_id = %student.profile_id, "profile email already in use");
            let errors = vec!["That email address is already in use.".to_string()];
            profile_errors(&state, student, form, errors).await
        }
        Err(err) => Err(err.into()),
    }
}

async fn profile_errors(
    state: &AppState,
    student: StudentSession,
    form: ProfileForm,
    errors: Vec<String>,
) -> Result<Response, PortalError> {
    let current = db::student_profile(&state.pool, student.profile_id)
        .await?
        .ok_or_else(|| PortalError::NotFound(format!("student {}", student.profile_id)))?;
    let page = ProfilePage::with_errors(current, form, errors);
    Ok((StatusCode::UNPROCESSABLE_ENTITY, render(&page)?).into_response())
}

pub async fn serve(state: AppState, bind_addr: &str) -> anyhow::Result<()> {
    let listener = TcpListener::bind(bind_addr).await?;
    info!("campus-portal listening on {bind_addr}");
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
    }
    info!("shutdown signal received");
}
