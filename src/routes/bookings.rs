//! Booking wizard routes: one endpoint per wizard action.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Json, Response};
use serde::Deserialize;
use tracing::error;
use uuid::Uuid;

use super::auth::AuthPatient;
use crate::error::error_response;
use crate::services::booking::{self, BookingError, OpenBookingRequest, SelectionUpdate};
use crate::services::wizard::{TransitionError, WizardView, resolve_appointment_types};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct PaymentResultBody {
    pub result_code: String,
    #[serde(default)]
    pub psp_reference: Option<String>,
}

#[derive(Deserialize)]
pub struct PaymentErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}

pub(crate) fn booking_error_to_status(err: &BookingError) -> StatusCode {
    match err {
        BookingError::NotFound(_) => StatusCode::NOT_FOUND,
        BookingError::Validation(_) | BookingError::Transition(TransitionError::Validation(_)) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        BookingError::Transition(TransitionError::InvalidTransition { .. } | TransitionError::Busy) => {
            StatusCode::CONFLICT
        }
        BookingError::Store(_) => StatusCode::BAD_GATEWAY,
        BookingError::Interrupted(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn booking_failure(err: BookingError) -> Response {
    let status = booking_error_to_status(&err);
    if status.is_server_error() {
        error!(error = %err, "booking request failed");
    }
    error_response(status, &err)
}

/// `GET /api/clinics/:id/appointment-types`: types offered by a clinic,
/// with the fallback set applied.
pub async fn appointment_types(
    State(state): State<AppState>,
    AuthPatient(patient): AuthPatient,
    Path(clinic_id): Path<Uuid>,
) -> Result<Json<Vec<String>>, Response> {
    let types = booking::list_appointment_types(&state, clinic_id, Some(&patient.access_token))
        .await
        .map_err(booking_failure)?;
    Ok(Json(resolve_appointment_types(types)))
}

/// `POST /api/bookings`: open a wizard in `review`.
pub async fn open(
    State(state): State<AppState>,
    AuthPatient(patient): AuthPatient,
    Json(body): Json<OpenBookingRequest>,
) -> Result<(StatusCode, Json<WizardView>), Response> {
    let view = booking::open_wizard(&state, &patient, body)
        .await
        .map_err(booking_failure)?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// `GET /api/bookings/:id`
pub async fn get(
    State(state): State<AppState>,
    AuthPatient(patient): AuthPatient,
    Path(id): Path<Uuid>,
) -> Result<Json<WizardView>, Response> {
    booking::get_wizard(&state, &patient, id)
        .await
        .map(Json)
        .map_err(booking_failure)
}

/// `DELETE /api/bookings/:id`: close the wizard.
pub async fn close(
    State(state): State<AppState>,
    AuthPatient(patient): AuthPatient,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, Response> {
    booking::close_wizard(&state, &patient, id)
        .await
        .map_err(booking_failure)?;
    Ok(StatusCode::NO_CONTENT)
}

/// `PATCH /api/bookings/:id/selection`
pub async fn select(
    State(state): State<AppState>,
    AuthPatient(patient): AuthPatient,
    Path(id): Path<Uuid>,
    Json(body): Json<SelectionUpdate>,
) -> Result<Json<WizardView>, Response> {
    booking::update_selection(&state, &patient, id, body)
        .await
        .map(Json)
        .map_err(booking_failure)
}

/// `POST /api/bookings/:id/proceed`: review → payment.
pub async fn proceed(
    State(state): State<AppState>,
    AuthPatient(patient): AuthPatient,
    Path(id): Path<Uuid>,
) -> Result<Json<WizardView>, Response> {
    booking::proceed_to_payment(&state, &patient, id)
        .await
        .map(Json)
        .map_err(booking_failure)
}

/// `POST /api/bookings/:id/payment-result`: widget completion callback.
pub async fn payment_result(
    State(state): State<AppState>,
    AuthPatient(patient): AuthPatient,
    Path(id): Path<Uuid>,
    Json(body): Json<PaymentResultBody>,
) -> Result<Json<WizardView>, Response> {
    booking::record_payment_result(&state, &patient, id, &body.result_code, body.psp_reference)
        .await
        .map(Json)
        .map_err(booking_failure)
}

/// `POST /api/bookings/:id/payment-error`: widget error callback.
pub async fn payment_error(
    State(state): State<AppState>,
    AuthPatient(patient): AuthPatient,
    Path(id): Path<Uuid>,
    Json(body): Json<PaymentErrorBody>,
) -> Result<Json<WizardView>, Response> {
    let message = body.message.unwrap_or_default();
    booking::record_payment_error(&state, &patient, id, &message)
        .await
        .map(Json)
        .map_err(booking_failure)
}

/// `POST /api/bookings/:id/retry`: failed → review.
pub async fn retry(
    State(state): State<AppState>,
    AuthPatient(patient): AuthPatient,
    Path(id): Path<Uuid>,
) -> Result<Json<WizardView>, Response> {
    booking::retry(&state, &patient, id)
        .await
        .map(Json)
        .map_err(booking_failure)
}

#[cfg(test)]
#[path = "bookings_test.rs"]
mod tests;
