use super::*;

#[test]
fn parse_success_response() {
    let json = serde_json::json!({
        "success": true,
        "session": {
            "id": "CS4FBB6F8C",
            "sessionData": "Ab02b4c0!BQABAgA",
            "clientKey": "test_ABC",
            "environment": "test"
        }
    })
    .to_string();
    let session = parse_session_response(&json).unwrap();
    assert_eq!(session.id, "CS4FBB6F8C");
    assert_eq!(session.session_data, "Ab02b4c0!BQABAgA");
    assert_eq!(session.client_key.as_deref(), Some("test_ABC"));
    assert_eq!(session.environment.as_deref(), Some("test"));
}

#[test]
fn parse_failure_uses_provider_error() {
    let json = r#"{"success":false,"error":"Merchant account not configured"}"#;
    let err = parse_session_response(json).unwrap_err();
    assert!(matches!(err, PaymentError::Rejected(ref m) if m == "Merchant account not configured"));
}

#[test]
fn parse_failure_without_message_uses_default() {
    let err = parse_session_response(r#"{"success":false}"#).unwrap_err();
    assert_eq!(err.to_string(), "Failed to create payment session");
}

#[test]
fn parse_success_without_session_is_parse_error() {
    let err = parse_session_response(r#"{"success":true}"#).unwrap_err();
    assert!(matches!(err, PaymentError::Parse(_)));
}

#[test]
fn parse_invalid_json() {
    let err = parse_session_response("<html>").unwrap_err();
    assert!(matches!(err, PaymentError::Parse(_)));
}
