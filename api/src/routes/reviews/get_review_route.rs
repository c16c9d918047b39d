//! `GET /api/reviews/{review_id}` — load one persisted review.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::instrument;
use uuid::Uuid;

use crate::core::app_state::AppState;
use crate::core::http::response_envelope::error_response;
use crate::routes::reviews::review_response::ReviewResponse;

#[instrument(name = "get_review_route", skip(state))]
pub async fn get_review_route(
    State(state): State<Arc<AppState>>,
    Path(review_id): Path<Uuid>,
) -> Response {
    match state.service.store().get(review_id).await {
        Ok(Some(result)) => (StatusCode::OK, Json(ReviewResponse::from(&result))).into_response(),
        Ok(None) => error_response(
            StatusCode::NOT_FOUND,
            "REVIEW_NOT_FOUND",
            format!("no review with id {review_id}"),
            None,
        ),
        Err(e) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "STORAGE_ERROR",
            e.to_string(),
            None,
        ),
    }
}
