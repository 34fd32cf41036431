use super::*;

const PATIENT: &str = "6f1c2b9e-3d4a-4c1e-9b7a-2e5f8d0c1a23";

#[test]
fn cookies_resolve_session() {
    let session = resolve_session(Some("tok"), Some(PATIENT), None, None).unwrap();
    assert_eq!(session.access_token, "tok");
    assert_eq!(session.patient_id.to_string(), PATIENT);
}

#[test]
fn headers_are_fallback() {
    let session = resolve_session(None, None, Some("Bearer abc.def"), Some(PATIENT)).unwrap();
    assert_eq!(session.access_token, "abc.def");
}

#[test]
fn cookie_token_wins_over_header() {
    let session = resolve_session(Some("cookie"), Some(PATIENT), Some("Bearer header"), None).unwrap();
    assert_eq!(session.access_token, "cookie");
}

#[test]
fn bearer_scheme_is_case_insensitive() {
    assert_eq!(bearer_token("bearer xyz"), Some("xyz"));
    assert_eq!(bearer_token("BEARER xyz"), Some("xyz"));
}

#[test]
fn non_bearer_scheme_is_ignored() {
    assert_eq!(bearer_token("Basic dXNlcjpwYXNz"), None);
    assert!(resolve_session(None, Some(PATIENT), Some("Basic dXNlcjpwYXNz"), None).is_none());
}

#[test]
fn missing_token_yields_none() {
    assert!(resolve_session(None, Some(PATIENT), None, None).is_none());
    assert!(resolve_session(Some("  "), Some(PATIENT), None, None).is_none());
}

#[test]
fn invalid_patient_id_yields_none() {
    assert!(resolve_session(Some("tok"), Some("not-a-uuid"), None, None).is_none());
    assert!(resolve_session(Some("tok"), None, None, None).is_none());
}
