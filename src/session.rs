use std::str::FromStr;

use axum::http::{header, HeaderMap};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::PortalError;
use crate::models::SessionRecord;

pub const SESSION_COOKIE: &str = "portal_session";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    Teacher,
    Student,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Teacher => "teacher",
            Role::Student => "student",
        }
    }
}

impl FromStr for Role {
    type Err = PortalError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "teacher" => Ok(Role::Teacher),
            "student" => Ok(Role::Student),
            other => Err(PortalError::Forbidden(format!("unknown role '{other}'"))),
        }
    }
}

/// An authenticated student bound to a profile row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StudentSession {
    pub token: Uuid,
    pub profile_id: Uuid,
}

/// Pulls the session token out of the `Cookie` header, if one parses.
pub fn session_token(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
}

pub fn session_cookie(token: Uuid, max_age_secs: i64) -> String {
    format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; Secure; SameSite=Lax; Max-Age={max_age_secs}")
}

pub fn cleared_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; Secure; SameSite=Lax; Max-Age=0")
}

/// Decides whether a looked-up session may use the student panel.
pub fn authorize_student(
    record: Option<SessionRecord>,
    now: DateTime<Utc>,
) -> Result<StudentSession, PortalError> {
    let record = record.ok_or(PortalError::Unauthenticated)?;

    if record.expires_at <= now {
        return Err(PortalError::Unauthenticated);
    }

    let role: Role = record.role.parse()?;
    if role != Role::Student {
        return Err(PortalError::Forbidden(format!(
            "role '{}' cannot open the student panel",
            role.as_str()
        )));
    }

    let profile_id = record
        .profile_id
        .ok_or_else(|| PortalError::Forbidden("session has no student profile".to_string()))?;

    Ok(StudentSession {
        token: record.token,
        profile_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use chrono::Duration;

    fn record(role: &str, profile_id: Option<Uuid>, expires_in: Duration) -> SessionRecord {
        SessionRecord {
            token: Uuid::new_v4(),
            role: role.to_string(),
            profile_id,
            expires_at: Utc::now() + expires_in,
        }
    }

    #[test]
    fn missing_session_is_unauthenticated() {
        let result = authorize_student(None, Utc::now());
        assert!(matches!(result, Err(PortalError::Unauthenticated)));
    }

    #[test]
    fn expired_session_is_unauthenticated() {
        let expired = record("student", Some(Uuid::new_v4()), Duration::minutes(-5));
        let result = authorize_student(Some(expired), Utc::now());
        assert!(matches!(result, Err(PortalError::Unauthenticated)));
    }

    #[test]
    fn teacher_role_is_forbidden() {
        let teacher = record("teacher", Some(Uuid::new_v4()), Duration::hours(1));
        let result = authorize_student(Some(teacher), Utc::now());
        assert!(matches!(result, Err(PortalError::Forbidden(_))));
    }

    #[test]
    fn unknown_role_is_forbidden() {
        let odd = record("registrar", Some(Uuid::new_v4()), Duration::hours(1));
        assert!(matches!(
            authorize_student(Some(odd), Utc::now()),
            Err(PortalError::Forbidden(_))
        ));
    }

    #[test]
    fn student_without_profile_is_forbidden() {
        let unbound = record("student", None, Duration::hours(1));
        assert!(matches!(
            authorize_student(Some(unbound), Utc::now()),
            Err(PortalError::Forbidden(_))
        ));
    }

    #[test]
    fn student_session_yields_profile_id() {
        let profile_id = Uuid::new_v4();
        let session = record("Student", Some(profile_id), Duration::hours(1));
        let token = session.token;
        let student = authorize_student(Some(session), Utc::now()).unwrap();
        assert_eq!(student.profile_id, profile_id);
        assert_eq!(student.token, token);
    }

    #[test]
    fn token_is_read_from_cookie_header() {
        let token = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("theme=dark; {SESSION_COOKIE}={token}; lang=en")).unwrap(),
        );
        assert_eq!(session_token(&headers), Some(token));
    }

    #[test]
    fn malformed_token_is_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("portal_session=not-a-uuid"),
        );
        assert_eq!(session_token(&headers), None);
        assert_eq!(session_token(&HeaderMap::new()), None);
    }

    #[test]
    fn cookie_round_trips_through_header() {
        let token = Uuid::new_v4();
        let cookie = session_cookie(token, 3600);
        let mut headers = HeaderMap::new();
        let pair = cookie.split(';').next().unwrap();
        headers.insert(header::COOKIE, HeaderValue::from_str(pair).unwrap());
        assert_eq!(session_token(&headers), Some(token));
        assert!(cleared_session_cookie().contains("Max-Age=0"));
    }

    #[test]
    fn session_cookies_are_secure_and_http_only() {
        for cookie in [session_cookie(Uuid::new_v4(), 3600), cleared_session_cookie()] {
            let attributes: Vec<&str> = cookie.split(';').map(str::trim).collect();
            assert!(attributes.contains(&"Secure"), "{cookie}");
            assert!(attributes.contains(&"HttpOnly"), "{cookie}");
            assert!(attributes.contains(&"SameSite=Lax"), "{cookie}");
        }
    }
}
