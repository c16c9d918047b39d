//! Error types for API startup plus the pipeline-error → HTTP mapping.

use axum::http::StatusCode;
use axum::response::Response;
use thiserror::Error;

use pr_reviewer::{Error as PipelineError, SourceError};

use crate::core::http::response_envelope::error_response;

/// Fatal startup errors for [`crate::start`].
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Config(#[from] llm_gateway::ConfigError),

    #[error(transparent)]
    Store(#[from] pr_reviewer::StoreError),

    #[error("server io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Maps a failed pipeline run to the wire contract:
/// 400 validation/parse, 401 upstream auth, 404 remote not-found,
/// 429 upstream rate limit, 500 everything internal.
pub fn pipeline_error_response(err: &PipelineError) -> Response {
    match err {
        PipelineError::Validation(msg) => error_response(
            StatusCode::BAD_REQUEST,
            "VALIDATION_ERROR",
            msg.clone(),
            None,
        ),
        PipelineError::Parse(e) => error_response(
            StatusCode::BAD_REQUEST,
            "INVALID_DIFF",
            e.to_string(),
            None,
        ),
        PipelineError::Source(source) => source_error_response(source),
        PipelineError::Store(e) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "STORAGE_ERROR",
            e.to_string(),
            None,
        ),
        PipelineError::Cancelled => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "REVIEW_CANCELLED",
            "review hit its deadline before completion",
            None,
        ),
    }
}

fn source_error_response(err: &SourceError) -> Response {
    let details = Some(format!("kind: {}", err.kind_str()));
    match err {
        SourceError::NotFound => error_response(
            StatusCode::NOT_FOUND,
            "PR_NOT_FOUND",
            "pull request not found on the provider",
            details,
        ),
        SourceError::Auth => error_response(
            StatusCode::UNAUTHORIZED,
            "PROVIDER_AUTH_FAILED",
            "provider rejected the access token",
            details,
        ),
        SourceError::RateLimited { .. } => error_response(
            StatusCode::TOO_MANY_REQUESTS,
            "PROVIDER_RATE_LIMITED",
            "provider rate limit hit; retry later",
            details,
        ),
        SourceError::UrlFormat(msg) => error_response(
            StatusCode::BAD_REQUEST,
            "INVALID_PR_URL",
            msg.clone(),
            details,
        ),
        SourceError::Transport(msg) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "PROVIDER_TRANSPORT",
            msg.clone(),
            details,
        ),
    }
}
