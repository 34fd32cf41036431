//! Shared error-code seam.
//!
//! DESIGN
//! ======
//! Every service error enum implements `ErrorCode` so route handlers can
//! render a uniform JSON body (`error`, `code`, `retryable`) without knowing
//! which service produced the failure. Status-code mapping stays in the
//! route modules next to the handlers that use it.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};

pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}

/// Build an error response from any `ErrorCode` implementor.
pub fn error_response(status: StatusCode, err: &(impl ErrorCode + ?Sized)) -> Response {
    let body = serde_json::json!({
        "error": err.to_string(),
        "code": err.error_code(),
        "retryable": err.retryable(),
    });
    (status, Json(body)).into_response()
}
