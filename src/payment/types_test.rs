use super::*;
use crate::error::ErrorCode;

// =============================================================================
// ResultCode
// =============================================================================

#[test]
fn forward_codes_map_to_outcomes() {
    assert_eq!(ResultCode::parse("Authorised").outcome(), PaymentOutcome::Confirmed);
    assert_eq!(ResultCode::parse("Pending").outcome(), PaymentOutcome::Pending);
    assert_eq!(ResultCode::parse("Received").outcome(), PaymentOutcome::Pending);
}

#[test]
fn every_other_code_fails() {
    for raw in ["Refused", "Cancelled", "Error", "ChallengeShopper", "", "authorised"] {
        assert_eq!(ResultCode::parse(raw).outcome(), PaymentOutcome::Failed, "{raw}");
    }
}

#[test]
fn unknown_code_keeps_raw_text() {
    let code = ResultCode::parse("IdentifyShopper");
    assert_eq!(code, ResultCode::Other("IdentifyShopper".into()));
    assert_eq!(code.to_string(), "IdentifyShopper");
}

#[test]
fn parse_trims_whitespace() {
    assert_eq!(ResultCode::parse(" Authorised\n"), ResultCode::Authorised);
}

// =============================================================================
// PaymentMethod
// =============================================================================

#[test]
fn payment_method_default_is_card() {
    assert_eq!(PaymentMethod::default(), PaymentMethod::Card);
}

#[test]
fn payment_method_serde_names_match_as_str() {
    for method in PaymentMethod::ALL {
        let json = serde_json::to_value(method).unwrap();
        assert_eq!(json, method.as_str());
        assert_eq!(serde_json::from_value::<PaymentMethod>(json).unwrap(), method);
    }
    assert!(serde_json::from_str::<PaymentMethod>(r#""bitcoin""#).is_err());
}

// =============================================================================
// Session wire shape
// =============================================================================

#[test]
fn session_request_serializes_camel_case() {
    let req = PaymentSessionRequest {
        amount: Amount { value: 50_000, currency: "PHP".into() },
        reference: "APPT-0011AABBCCDD".into(),
        payment_method: PaymentMethod::GCash,
        return_url: None,
        metadata: SessionMetadata {
            patient_id: Uuid::nil(),
            clinic_id: Uuid::nil(),
            appointment_type: "consultation".into(),
        },
    };
    let json = serde_json::to_value(&req).unwrap();
    assert_eq!(json["amount"]["value"], 50_000);
    assert_eq!(json["paymentMethod"], "gcash");
    assert_eq!(json["metadata"]["appointmentType"], "consultation");
    assert!(json.get("returnUrl").is_none());
}

#[test]
fn session_deserializes_without_optional_fields() {
    let session: PaymentSession = serde_json::from_str(r#"{"id":"CS123","sessionData":"Ab02"}"#).unwrap();
    assert_eq!(session.id, "CS123");
    assert_eq!(session.session_data, "Ab02");
    assert!(session.client_key.is_none());
}

// =============================================================================
// generate_reference
// =============================================================================

#[test]
fn reference_has_prefix_and_hex_suffix() {
    let r = generate_reference();
    assert_eq!(r.len(), 17);
    assert!(r.starts_with("APPT-"));
    assert!(r[5..].chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn references_differ() {
    assert_ne!(generate_reference(), generate_reference());
}

// =============================================================================
// PaymentError
// =============================================================================

#[test]
fn rejected_error_displays_provider_message() {
    let err = PaymentError::Rejected("Invalid amount".into());
    assert_eq!(err.to_string(), "Invalid amount");
    assert_eq!(err.error_code(), "E_PAYMENT_REJECTED");
    assert!(!err.retryable());
}
