//! Patient session resolution.
//!
//! ARCHITECTURE
//! ============
//! The portal does not authenticate anyone. The browser already holds a
//! backend access token and knows its patient ID; both are forwarded with
//! every request (cookies first, headers as fallback) and the token is
//! passed through to the data store, which enforces row-level access.

use uuid::Uuid;

pub const ACCESS_TOKEN_COOKIE: &str = "sb-access-token";
pub const PATIENT_ID_COOKIE: &str = "patient_id";
pub const PATIENT_ID_HEADER: &str = "x-patient-id";

/// Caller identity for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatientSession {
    pub patient_id: Uuid,
    pub access_token: String,
}

/// Combine cookie and header candidates into a session. Cookies win.
#[must_use]
pub fn resolve_session(
    cookie_token: Option<&str>,
    cookie_patient: Option<&str>,
    authorization: Option<&str>,
    header_patient: Option<&str>,
) -> Option<PatientSession> {
    let token = non_empty(cookie_token).or_else(|| authorization.and_then(bearer_token))?;
    let patient_raw = non_empty(cookie_patient).or_else(|| non_empty(header_patient))?;
    let patient_id = Uuid::parse_str(patient_raw.trim()).ok()?;
    Some(PatientSession { patient_id, access_token: token.to_string() })
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    non_empty(Some(token.trim()))
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
