//! `GET /api/reviews/{review_id}/status` — lifecycle of one review.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::instrument;
use uuid::Uuid;

use crate::core::app_state::{AppState, ReviewStatus};
use crate::core::http::response_envelope::error_response;

#[derive(Serialize)]
struct StatusResponse {
    status: ReviewStatus,
}

#[instrument(name = "review_status_route", skip(state))]
pub async fn review_status_route(
    State(state): State<Arc<AppState>>,
    Path(review_id): Path<Uuid>,
) -> Response {
    if let Some(status) = state.statuses.get(review_id) {
        return (StatusCode::OK, Json(StatusResponse { status })).into_response();
    }

    // Not in the in-memory registry (e.g. after a restart): a persisted
    // review is by definition completed.
    match state.service.store().get(review_id).await {
        Ok(Some(_)) => (
            StatusCode::OK,
            Json(StatusResponse {
                status: ReviewStatus::Completed,
            }),
        )
            .into_response(),
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
