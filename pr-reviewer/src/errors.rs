//! Crate-wide error hierarchy for the review pipeline.
//!
//! Goals:
//! - Single root `Error` for all public functions.
//! - Provider-aware mapping (401/403→Auth, 404→NotFound, 429→RateLimited).
//! - No dynamic dispatch, ergonomic `?` via `From` impls.
//!
//! Propagation policy: validation, source, and parse errors abort the
//! pipeline before analyzers run. Per-analyzer LLM failures are captured as
//! `AnalyzerFailure` diagnostics and never surface here. Storage failures
//! during the final save and review-level cancellation do fail the review.

use thiserror::Error;

/// Convenient alias for crate-wide results.
pub type PipelineResult<T> = Result<T, Error>;

/// Root error type for the review pipeline.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed request, impossible config, or input over limits.
    #[error("validation error: {0}")]
    Validation(String),

    /// Remote change-source (hosted repo) failure.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// Unified diff unrecognizable.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Persistence failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Review-level deadline hit or client cancellation; nothing persisted.
    #[error("review cancelled before completion")]
    Cancelled,
}

/// Detailed change-source error used by the fetcher layer.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Pull request or repository does not exist (HTTP 404).
    #[error("pull request not found")]
    NotFound,

    /// Unauthorized/forbidden by the provider (HTTP 401/403).
    #[error("provider authentication failed")]
    Auth,

    /// Rate limited (HTTP 429).
    #[error("provider rate limited")]
    RateLimited { retry_after_secs: Option<u64> },

    /// Network/transport failure or unexpected status.
    #[error("provider transport error: {0}")]
    Transport(String),

    /// The change reference could not be parsed into owner/repo/number.
    #[error("invalid pull request reference: {0}")]
    UrlFormat(String),
}

impl SourceError {
    /// Stable lowercase kind used in error envelopes.
    pub fn kind_str(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Auth => "auth",
            Self::RateLimited { .. } => "rate_limited",
            Self::Transport(_) => "transport",
            Self::UrlFormat(_) => "url_format",
        }
    }

    /// Transient failures worth another fetch attempt.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::RateLimited { .. })
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            return SourceError::Transport("timeout".to_string());
        }
        if let Some(status) = e.status() {
            return match status.as_u16() {
                401 | 403 => SourceError::Auth,
                404 => SourceError::NotFound,
                429 => SourceError::RateLimited {
                    retry_after_secs: None,
                },
                code => SourceError::Transport(format!("http status {code}")),
            };
        }
        SourceError::Transport(e.to_string())
    }
}

/// Unified diff parser errors. Individual malformed hunks are skipped, so
/// the only fatal case is a payload that is not a diff at all.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("payload is not a recognizable unified diff")]
    UnrecognizedDiff,
}

/// Persistence errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("corrupt stored payload: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("corrupt stored review: {0}")]
    Invalid(String),
}
