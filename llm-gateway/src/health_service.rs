//! Best-effort health checks for the configured LLM backend.
//!
//! The returned [`HealthStatus`] is JSON-serializable and suitable for a
//! `/health` endpoint. [`check`] is resilient and never fails: probe errors
//! are mapped to `ok = false` with a short message.

use serde::Serialize;
use tracing::{debug, warn};

use crate::gateway::ProviderClient;

/// A serializable health snapshot for the configured provider.
#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    /// Backend/provider (e.g., "ollama", "openai").
    pub provider: String,
    /// Target endpoint base URL ("-" for the scripted backend).
    pub endpoint: String,
    /// Overall health flag.
    pub ok: bool,
    /// Measured probe latency in milliseconds.
    pub latency_ms: u128,
    /// Short human-readable message with details.
    pub message: String,
}

/// Probes the provider behind the client. Never fails.
pub async fn check(client: &ProviderClient) -> HealthStatus {
    let provider = client.provider().to_string();
    match client {
        ProviderClient::Ollama(c) => match c.probe().await {
            Ok(latency_ms) => {
                debug!(%provider, latency_ms, "llm health probe ok");
                HealthStatus {
                    provider,
                    endpoint: c.endpoint().to_string(),
                    ok: true,
                    latency_ms,
                    message: "reachable".into(),
                }
            }
            Err(e) => {
                warn!(%provider, error = %e, "llm health probe failed");
                HealthStatus {
                    provider,
                    endpoint: c.endpoint().to_string(),
                    ok: false,
                    latency_ms: 0,
                    message: e.to_string(),
                }
            }
        },
        ProviderClient::OpenAi(c) => match c.probe().await {
            Ok(latency_ms) => {
                debug!(%provider, latency_ms, "llm health probe ok");
                HealthStatus {
                    provider,
                    endpoint: c.endpoint().to_string(),
                    ok: true,
                    latency_ms,
                    message: "reachable".into(),
                }
            }
            Err(e) => {
                warn!(%provider, error = %e, "llm health probe failed");
                HealthStatus {
                    provider,
                    endpoint: c.endpoint().to_string(),
                    ok: false,
                    latency_ms: 0,
                    message: e.to_string(),
                }
            }
        },
        ProviderClient::Scripted(_) => HealthStatus {
            provider,
            endpoint: "-".into(),
            ok: true,
            latency_ms: 0,
            message: "scripted backend".into(),
        },
    }
}
