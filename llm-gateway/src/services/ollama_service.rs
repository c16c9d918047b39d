//! Lightweight Ollama service for text generation.
//!
//! Thin client for the local Ollama API:
//! - `POST {endpoint}/api/generate` — synchronous text generation (`stream=false`)
//! - `GET  {endpoint}/api/tags`     — best-effort health probe
//!
//! The model and sampling parameters vary per call (they come from the
//! agent binding), so a single client serves every agent. Request deadlines
//! are enforced by the gateway, not by the HTTP client.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    config::model_bindings::AgentBinding,
    error_handler::{ConfigResult, LlmError, make_snippet, status_to_error, validate_http_endpoint},
};

/// Thin client for Ollama.
#[derive(Debug)]
pub struct OllamaService {
    client: reqwest::Client,
    endpoint: String,
    url_generate: String,
    url_tags: String,
}

impl OllamaService {
    /// Creates a new [`OllamaService`] for the given endpoint.
    pub fn new(endpoint: &str) -> ConfigResult<Self> {
        validate_http_endpoint("LLM_ENDPOINT", endpoint)?;
        let base = endpoint.trim_end_matches('/').to_string();

        Ok(Self {
            client: reqwest::Client::new(),
            url_generate: format!("{base}/api/generate"),
            url_tags: format!("{base}/api/tags"),
            endpoint: base,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Calls `POST /api/generate` with a combined system+user prompt.
    pub async fn generate(
        &self,
        binding: &AgentBinding,
        system: &str,
        user: &str,
    ) -> Result<String, LlmError> {
        let body = OllamaGenerateRequest {
            model: &binding.model,
            prompt: format!("{system}\n\n{user}"),
            stream: false,
            options: OllamaOptions {
                temperature: binding.temperature,
                num_predict: binding.max_tokens,
            },
        };

        debug!(
            model = %binding.model,
            prompt_len = body.prompt.len(),
            "POST {}", self.url_generate
        );

        let resp = self.client.post(&self.url_generate).json(&body).send().await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let text = resp.text().await.unwrap_or_default();
            return Err(status_to_error(status, &make_snippet(&text)));
        }

        let out: OllamaGenerateResponse = resp
            .json()
            .await
            .map_err(|e| LlmError::Parse(format!("serde error: {e}; expected `response`")))?;
        Ok(out.response)
    }

    /// Best-effort health probe; returns probe latency in milliseconds.
    pub async fn probe(&self) -> Result<u128, LlmError> {
        let started = Instant::now();
        let resp = self.client.get(&self.url_tags).send().await?;
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let text = resp.text().await.unwrap_or_default();
            return Err(status_to_error(status, &make_snippet(&text)));
        }
        Ok(started.elapsed().as_millis())
    }
}

#[derive(Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Deserialize)]
struct OllamaGenerateResponse {
    response: String,
}
