//! Error types and validation helpers for `llm-gateway`.
//!
//! Two focused enums:
//! - [`LlmError`] — runtime failures of a model invocation, with a closed
//!   kind set (timeout/transport/auth/rate-limited/parse) that callers
//!   branch on;
//! - [`ConfigError`] — environment/config-driven setup failures.
//!
//! All config error messages include the suffix `[LLM Gateway]` so that
//! bubbled-up errors can be attributed to this library.

use thiserror::Error;

use crate::redaction::Redactor;

/// Closed classification of LLM invocation failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmErrorKind {
    Timeout,
    Transport,
    Auth,
    RateLimited,
    Parse,
}

impl LlmErrorKind {
    /// Stable lowercase name used in diagnostics and wire payloads.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Transport => "transport",
            Self::Auth => "auth",
            Self::RateLimited => "rate_limited",
            Self::Parse => "parse",
        }
    }
}

/// Runtime error for a single gateway invocation.
#[derive(Debug, Error)]
pub enum LlmError {
    /// The call exceeded its per-call deadline.
    #[error("llm call timed out after {0}s")]
    Timeout(u64),

    /// Network/transport failure or an unexpected HTTP status.
    #[error("llm transport error: {0}")]
    Transport(String),

    /// Authentication rejected by the provider (HTTP 401/403).
    #[error("llm authentication failed")]
    Auth,

    /// Provider throttled the request (HTTP 429).
    #[error("llm rate limited")]
    RateLimited { retry_after_secs: Option<u64> },

    /// The reply could not be decoded or did not contain the expected payload.
    #[error("llm response parse error: {0}")]
    Parse(String),
}

impl LlmError {
    pub fn kind(&self) -> LlmErrorKind {
        match self {
            Self::Timeout(_) => LlmErrorKind::Timeout,
            Self::Transport(_) => LlmErrorKind::Transport,
            Self::Auth => LlmErrorKind::Auth,
            Self::RateLimited { .. } => LlmErrorKind::RateLimited,
            Self::Parse(_) => LlmErrorKind::Parse,
        }
    }

    /// Transient failures worth another attempt: transport and rate-limit.
    /// Auth and deterministic client errors never retry; timeouts are bounded
    /// by the caller's overall deadline instead.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::RateLimited { .. })
    }

    /// Rewrites any registered credential substring in the carried message.
    /// Applied before an error leaves the gateway.
    pub fn scrubbed(self, redactor: &Redactor) -> Self {
        match self {
            Self::Transport(msg) => Self::Transport(redactor.scrub(&msg)),
            Self::Parse(msg) => Self::Parse(redactor.scrub(&msg)),
            other => other,
        }
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            return LlmError::Timeout(0);
        }
        if let Some(status) = e.status() {
            return status_to_error(status.as_u16(), &format!("{e}"));
        }
        LlmError::Transport(e.to_string())
    }
}

/// Maps a non-success HTTP status to the unified error kinds.
pub fn status_to_error(status: u16, detail: &str) -> LlmError {
    match status {
        401 | 403 => LlmError::Auth,
        429 => LlmError::RateLimited {
            retry_after_secs: None,
        },
        _ => LlmError::Transport(format!("unexpected HTTP status {status}: {detail}")),
    }
}

/// Builds a short single-line snippet of an HTTP body for error messages.
pub fn make_snippet(body: &str) -> String {
    let flat = body.replace(['\n', '\r'], " ");
    let trimmed = flat.trim();
    if trimmed.chars().count() <= 200 {
        trimmed.to_string()
    } else {
        let cut: String = trimmed.chars().take(200).collect();
        format!("{cut}…")
    }
}

/// Convenient result alias for config operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Error enum for environment/config-driven setup.
///
/// Keep this focused: only errors that realistically happen at config
/// load/validation time.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable is missing or empty.
    #[error("[LLM Gateway] missing required environment variable: {0}")]
    MissingVar(&'static str),

    /// A number failed to parse (ports, limits, timeouts).
    #[error("[LLM Gateway] invalid number in {var}: {reason}")]
    InvalidNumber {
        var: &'static str,
        reason: &'static str,
    },

    /// Unsupported provider in `LLM_PROVIDER`.
    #[error("[LLM Gateway] unsupported provider: {0}")]
    UnsupportedProvider(String),

    /// Value had the wrong format (e.g., invalid URL).
    #[error("[LLM Gateway] invalid format in {var}: {reason}")]
    InvalidFormat {
        var: &'static str,
        reason: &'static str,
    },

    /// Model name was empty or invalid.
    #[error("[LLM Gateway] model name must not be empty")]
    EmptyModel,

    /// API key required by the selected provider is absent.
    #[error("[LLM Gateway] missing API key for provider {0}")]
    MissingApiKey(&'static str),
}

/* ------------------------ Env helpers ------------------------ */

/// Fetches a required, non-empty environment variable.
pub fn must_env(name: &'static str) -> ConfigResult<String> {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ConfigError::MissingVar(name)),
    }
}

/// Optional, non-empty environment variable.
pub fn env_opt(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Parses an optional `u32` from env (`Ok(None)` if unset/empty).
pub fn env_opt_u32(name: &'static str) -> ConfigResult<Option<u32>> {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => {
            v.parse::<u32>()
                .map(Some)
                .map_err(|_| ConfigError::InvalidNumber {
                    var: name,
                    reason: "expected u32",
                })
        }
        _ => Ok(None),
    }
}

/// Parses an optional `u64` from env (`Ok(None)` if unset/empty).
pub fn env_opt_u64(name: &'static str) -> ConfigResult<Option<u64>> {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => {
            v.parse::<u64>()
                .map(Some)
                .map_err(|_| ConfigError::InvalidNumber {
                    var: name,
                    reason: "expected u64",
                })
        }
        _ => Ok(None),
    }
}

/* --------------------- Validation helpers --------------------- */

/// Validates that an HTTP endpoint starts with `http://` or `https://`.
pub fn validate_http_endpoint(var: &'static str, value: &str) -> ConfigResult<()> {
    if value.starts_with("http://") || value.starts_with("https://") {
        Ok(())
    } else {
        Err(ConfigError::InvalidFormat {
            var,
            reason: "must start with http:// or https://",
        })
    }
}
