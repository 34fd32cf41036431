//! Appointment rating submission.
//!
//! A rating is written once per appointment. `0` means "not set"; an
//! appointment without a doctor only takes a clinic rating.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::info;
use uuid::Uuid;

use crate::error::ErrorCode;
use crate::services::session::PatientSession;
use crate::state::AppState;
use crate::store::{Filter, Query, StoreError};

const APPOINTMENTS_TABLE: &str = "appointments";
const RATINGS_TABLE: &str = "appointment_ratings";

pub const MAX_RATING: i32 = 5;

#[derive(Debug, thiserror::Error)]
pub enum RatingError {
    #[error("{0}")]
    Validation(String),
    #[error("appointment not found: {0}")]
    NotFound(Uuid),
    #[error("This appointment has already been rated.")]
    AlreadyRated,
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl ErrorCode for RatingError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "E_VALIDATION",
            Self::NotFound(_) => "E_APPOINTMENT_NOT_FOUND",
            Self::AlreadyRated => "E_ALREADY_RATED",
            Self::Store(e) => e.error_code(),
        }
    }
}

/// Body of `POST /api/ratings`.
#[derive(Debug, Clone, Deserialize)]
pub struct RatingSubmission {
    pub appointment_id: Uuid,
    #[serde(default)]
    pub clinic_rating: i32,
    #[serde(default)]
    pub doctor_rating: i32,
    #[serde(default)]
    pub feedback: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RatingReceipt {
    pub success: bool,
    /// Delay after which the client clears its form.
    pub reset_after_ms: u64,
}

/// Ratings that will be stored: `(clinic, doctor)`. The doctor rating is
/// dropped when the appointment has no doctor.
///
/// # Errors
///
/// Returns a validation error for out-of-range or all-zero ratings.
pub fn validate_ratings(clinic: i32, doctor: i32, has_doctor: bool) -> Result<(i32, Option<i32>), RatingError> {
    let in_range = |r: i32| (0..=MAX_RATING).contains(&r);
    if !in_range(clinic) || !in_range(doctor) {
        return Err(RatingError::Validation("Ratings must be between 1 and 5.".into()));
    }
    let doctor = if has_doctor { Some(doctor) } else { None };
    if clinic == 0 && doctor.unwrap_or(0) == 0 {
        return Err(RatingError::Validation("Please provide at least one rating.".into()));
    }
    Ok((clinic, doctor.filter(|r| *r > 0)))
}

fn has_doctor(appointment: &Value) -> bool {
    appointment
        .get("doctor_name")
        .and_then(Value::as_str)
        .is_some_and(|n| !n.trim().is_empty())
}

/// Validate and store a rating for one of the patient's appointments.
///
/// # Errors
///
/// Returns `Validation`, `NotFound`, `AlreadyRated`, or a store error.
pub async fn submit_rating(
    state: &AppState,
    patient: &PatientSession,
    submission: RatingSubmission,
) -> Result<RatingReceipt, RatingError> {
    let RatingSubmission { appointment_id, clinic_rating, doctor_rating, feedback } = submission;
    let token = Some(patient.access_token.as_str());

    // Range check before any I/O.
    validate_ratings(clinic_rating, doctor_rating, true)?;

    let query = Query::new().filter(Filter::eq("id", appointment_id)).limit(1);
    let appointment = state
        .store
        .select(APPOINTMENTS_TABLE, &query, token)
        .await?
        .into_iter()
        .next()
        .filter(|row| row.get("patient_id").and_then(Value::as_str) == Some(patient.patient_id.to_string().as_str()))
        .ok_or(RatingError::NotFound(appointment_id))?;

    let (clinic_rating, doctor_rating) = validate_ratings(clinic_rating, doctor_rating, has_doctor(&appointment))?;

    let existing = Query::new()
        .filter(Filter::eq("appointment_id", appointment_id))
        .limit(1);
    if !state.store.select(RATINGS_TABLE, &existing, token).await?.is_empty() {
        return Err(RatingError::AlreadyRated);
    }

    let row = json!({
        "appointment_id": appointment_id,
        "patient_id": patient.patient_id,
        "clinic_id": appointment.get("clinic_id").cloned().unwrap_or(Value::Null),
        "clinic_rating": (clinic_rating > 0).then_some(clinic_rating),
        "doctor_rating": doctor_rating,
        "feedback": feedback.filter(|f| !f.trim().is_empty()),
    });
    state.store.insert(RATINGS_TABLE, row, token).await?;
    info!(%appointment_id, patient_id = %patient.patient_id, "appointment rated");

    Ok(RatingReceipt { success: true, reset_after_ms: state.config.rating_reset_delay_ms })
}

#[cfg(test)]
#[path = "rating_test.rs"]
mod tests;
