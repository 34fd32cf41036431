//! History dashboard route.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Json, Response};
use time::OffsetDateTime;
use tracing::error;

use super::auth::AuthPatient;
use crate::error::error_response;
use crate::services::history::{self as history_svc, HistoryDashboard};
use crate::state::AppState;

/// `GET /api/history`: summary cards relative to today (UTC).
pub async fn dashboard(
    State(state): State<AppState>,
    AuthPatient(patient): AuthPatient,
) -> Result<Json<HistoryDashboard>, Response> {
    let today = OffsetDateTime::now_utc().date();
    history_svc::history_dashboard(&state, &patient, today)
        .await
        .map(Json)
        .map_err(|e| {
            error!(error = %e, "history request failed");
            error_response(StatusCode::BAD_GATEWAY, &e)
        })
}
