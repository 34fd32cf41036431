//! Rating submission route.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Json, Response};
use tracing::error;

use super::auth::AuthPatient;
use crate::error::error_response;
use crate::services::rating::{self, RatingError, RatingReceipt, RatingSubmission};
use crate::state::AppState;

pub(crate) fn rating_error_to_status(err: &RatingError) -> StatusCode {
    match err {
        RatingError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        RatingError::NotFound(_) => StatusCode::NOT_FOUND,
        RatingError::AlreadyRated => StatusCode::CONFLICT,
        RatingError::Store(_) => StatusCode::BAD_GATEWAY,
    }
}

/// `POST /api/ratings`
pub async fn submit(
    State(state): State<AppState>,
    AuthPatient(patient): AuthPatient,
    Json(body): Json<RatingSubmission>,
) -> Result<Json<RatingReceipt>, Response> {
    rating::submit_rating(&state, &patient, body)
        .await
        .map(Json)
        .map_err(|e| {
            let status = rating_error_to_status(&e);
            if status.is_server_error() {
                error!(error = %e, "rating submission failed");
            }
            error_response(status, &e)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn rating_error_to_status_maps_variants() {
        assert_eq!(
            rating_error_to_status(&RatingError::Validation("x".into())),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(rating_error_to_status(&RatingError::NotFound(Uuid::nil())), StatusCode::NOT_FOUND);
        assert_eq!(rating_error_to_status(&RatingError::AlreadyRated), StatusCode::CONFLICT);
    }
}
