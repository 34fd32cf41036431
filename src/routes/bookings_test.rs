use super::*;
use crate::services::wizard::{WizardAction, WizardStep};
use crate::store::StoreError;

#[test]
fn booking_error_to_status_maps_not_found() {
    let err = BookingError::NotFound(Uuid::nil());
    assert_eq!(booking_error_to_status(&err), StatusCode::NOT_FOUND);
}

#[test]
fn booking_error_to_status_maps_validation() {
    assert_eq!(
        booking_error_to_status(&BookingError::Validation("bad date".into())),
        StatusCode::UNPROCESSABLE_ENTITY
    );
    assert_eq!(
        booking_error_to_status(&BookingError::Transition(TransitionError::Validation("x".into()))),
        StatusCode::UNPROCESSABLE_ENTITY
    );
}

#[test]
fn booking_error_to_status_maps_conflicts() {
    let invalid = BookingError::Transition(TransitionError::InvalidTransition {
        step: WizardStep::Review,
        action: WizardAction::Retry,
    });
    assert_eq!(booking_error_to_status(&invalid), StatusCode::CONFLICT);
    assert_eq!(booking_error_to_status(&BookingError::Transition(TransitionError::Busy)), StatusCode::CONFLICT);
}

#[test]
fn booking_error_to_status_maps_store_to_bad_gateway() {
    let err = BookingError::Store(StoreError::Request("timeout".into()));
    assert_eq!(booking_error_to_status(&err), StatusCode::BAD_GATEWAY);
}

#[test]
fn booking_error_to_status_maps_interrupted_to_internal_error() {
    let err = BookingError::Interrupted("task cancelled".into());
    assert_eq!(booking_error_to_status(&err), StatusCode::INTERNAL_SERVER_ERROR);
}

#[test]
fn booking_failure_renders_status() {
    let resp = booking_failure(BookingError::Transition(TransitionError::Busy));
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}
