//! Patient identity extractor.

use axum::http::StatusCode;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum_extra::extract::cookie::{Cookie, CookieJar};

use crate::services::session::{self, ACCESS_TOKEN_COOKIE, PATIENT_ID_COOKIE, PATIENT_ID_HEADER, PatientSession};

// =============================================================================
// AUTH EXTRACTOR
// =============================================================================

/// Patient identity from cookies or headers.
/// Use as a handler parameter to require a patient session.
pub struct AuthPatient(pub PatientSession);

impl<S> axum::extract::FromRequestParts<S> for AuthPatient
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        session_from_parts(parts).map(Self).ok_or(StatusCode::UNAUTHORIZED)
    }
}

fn session_from_parts(parts: &Parts) -> Option<PatientSession> {
    let jar = CookieJar::from_headers(&parts.headers);
    session::resolve_session(
        jar.get(ACCESS_TOKEN_COOKIE).map(Cookie::value),
        jar.get(PATIENT_ID_COOKIE).map(Cookie::value),
        header_value(parts, AUTHORIZATION.as_str()),
        header_value(parts, PATIENT_ID_HEADER),
    )
}

fn header_value<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts.headers.get(name).and_then(|v| v.to_str().ok())
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
