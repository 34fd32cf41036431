//! Diagnostics route.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;

use crate::services::diagnostics::{self, DiagnosticsReport};
use crate::state::AppState;

/// `GET /api/diagnostics`: 200 when every check passes, 503 otherwise.
/// The report body is returned either way.
pub async fn run(State(state): State<AppState>) -> (StatusCode, Json<DiagnosticsReport>) {
    let report = diagnostics::run_diagnostics(&state).await;
    let status = if report.ok { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status, Json(report))
}
