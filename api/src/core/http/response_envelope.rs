//! Error envelope for every non-2xx response.
//!
//! Success payloads are endpoint-specific (the review endpoints have a
//! bit-exact wire contract), but errors share one shape: a stable
//! machine-readable code, a human message, optional details, and a
//! timestamp. Credentials never appear here; upstream errors are scrubbed
//! before they reach this layer.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Wire shape of an error response body.
#[derive(Serialize)]
pub struct ErrorBody {
    /// Stable, machine-readable error code (e.g. "VALIDATION_ERROR").
    pub error_code: &'static str,
    /// Human-friendly error message.
    pub message: String,
    /// Optional fine-grained detail (field path, hint).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Builds a complete error response.
pub fn error_response(
    status: StatusCode,
    error_code: &'static str,
    message: impl Into<String>,
    details: Option<String>,
) -> Response {
    let body = ErrorBody {
        error_code,
        message: message.into(),
        details,
        timestamp: Utc::now(),
    };
    (status, Json(body)).into_response()
}
