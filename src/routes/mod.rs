//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! This module binds the portal's JSON API under a single Axum router. The
//! browser app is served elsewhere; every `/api` route identifies the
//! patient through `auth::AuthPatient` and returns either the service result
//! or an `{ error, code, retryable }` body.

pub mod auth;
pub mod bookings;
pub mod diagnostics;
pub mod history;
pub mod profile;
pub mod ratings;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::{get, patch, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Full API router.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/diagnostics", get(diagnostics::run))
        .route("/api/profile", get(profile::get_profile).patch(profile::update_profile))
        .route("/api/history", get(history::dashboard))
        .route("/api/clinics/{id}/appointment-types", get(bookings::appointment_types))
        .route("/api/bookings", post(bookings::open))
        .route("/api/bookings/{id}", get(bookings::get).delete(bookings::close))
        .route("/api/bookings/{id}/selection", patch(bookings::select))
        .route("/api/bookings/{id}/proceed", post(bookings::proceed))
        .route("/api/bookings/{id}/payment-result", post(bookings::payment_result))
        .route("/api/bookings/{id}/payment-error", post(bookings::payment_error))
        .route("/api/bookings/{id}/retry", post(bookings::retry))
        .route("/api/ratings", post(ratings::submit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

#[cfg(test)]
#[path = "router_test.rs"]
mod tests;
