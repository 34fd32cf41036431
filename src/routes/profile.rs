//! Patient profile routes.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Json, Response};
use tracing::error;

use super::auth::AuthPatient;
use crate::error::error_response;
use crate::services::profile::{self as profile_svc, PatientProfile, ProfileError, ProfileUpdate};
use crate::state::AppState;

pub(crate) fn profile_error_to_status(err: &ProfileError) -> StatusCode {
    match err {
        ProfileError::NotFound => StatusCode::NOT_FOUND,
        ProfileError::Store(_) => StatusCode::BAD_GATEWAY,
        ProfileError::Malformed(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn profile_failure(err: ProfileError) -> Response {
    let status = profile_error_to_status(&err);
    if status.is_server_error() {
        error!(error = %err, "profile request failed");
    }
    error_response(status, &err)
}

/// `GET /api/profile`
pub async fn get_profile(
    State(state): State<AppState>,
    AuthPatient(patient): AuthPatient,
) -> Result<Json<PatientProfile>, Response> {
    profile_svc::get_profile(&state, &patient)
        .await
        .map(Json)
        .map_err(profile_failure)
}

/// `PATCH /api/profile`: partial update.
pub async fn update_profile(
    State(state): State<AppState>,
    AuthPatient(patient): AuthPatient,
    Json(body): Json<ProfileUpdate>,
) -> Result<Json<PatientProfile>, Response> {
    profile_svc::update_profile(&state, &patient, body)
        .await
        .map(Json)
        .map_err(profile_failure)
}
