//! `GET /health` — database round trip plus best-effort LLM probe.

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::{IntoResponse, Response}};
use serde::Serialize;
use tracing::instrument;

use llm_gateway::health_service::{self, HealthStatus};

use crate::core::app_state::AppState;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    database: &'static str,
    llm: HealthStatus,
}

#[instrument(name = "health_route", skip(state))]
pub async fn health_route(State(state): State<Arc<AppState>>) -> Response {
    let database = match state.service.store().ping().await {
        Ok(()) => "ok",
        Err(_) => "error",
    };
    let llm = health_service::check(state.service.gateway().provider_client()).await;

    let status = if database == "ok" { "ok" } else { "degraded" };
    let code = if database == "ok" {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        code,
        Json(HealthResponse {
            status,
            database,
            llm,
        }),
    )
        .into_response()
}
