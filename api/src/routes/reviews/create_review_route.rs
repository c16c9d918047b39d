//! `POST /api/reviews` — run the full pipeline for one change source.

use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::core::app_state::{AppState, ReviewStatus};
use crate::core::http::response_envelope::error_response;
use crate::error_handler::pipeline_error_response;
use crate::routes::reviews::{review_request::CreateReviewRequest, review_response::ReviewResponse};

#[instrument(name = "create_review_route", skip(state, body))]
pub async fn create_review_route(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateReviewRequest>,
) -> Response {
    let (source, config) = match body.into_parts() {
        Ok(parts) => parts,
        Err(message) => {
            return error_response(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", message, None);
        }
    };

    let review_id = Uuid::new_v4();
    state.statuses.set(review_id, ReviewStatus::InProgress);
    info!(%review_id, "review accepted");

    match state.service.review_with_id(review_id, source, config).await {
        Ok(result) => {
            state.statuses.set(review_id, ReviewStatus::Completed);
            (StatusCode::OK, Json(ReviewResponse::from(&result))).into_response()
        }
        Err(err) => {
            state.statuses.set(review_id, ReviewStatus::Failed);
            pipeline_error_response(&err)
        }
    }
}
