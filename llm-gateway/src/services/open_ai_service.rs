//! OpenAI (chat-completions) service for text generation.
//!
//! Minimal, non-streaming client around the OpenAI REST API:
//! - `POST {endpoint}/v1/chat/completions` — chat completion
//! - `GET  {endpoint}/v1/models`           — best-effort health probe
//!
//! Constructor validation:
//! - an API key must be present
//! - the endpoint must start with http:// or https://
//!
//! The key is installed as a default `Authorization` header once and never
//! echoed into errors or logs.

use std::time::Instant;

use reqwest::header;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    config::model_bindings::AgentBinding,
    error_handler::{
        ConfigError, ConfigResult, LlmError, make_snippet, status_to_error,
        validate_http_endpoint,
    },
};

/// Thin client for the OpenAI API.
#[derive(Debug)]
pub struct OpenAiService {
    client: reqwest::Client,
    endpoint: String,
    url_chat: String,
    url_models: String,
}

impl OpenAiService {
    /// Creates a new [`OpenAiService`] from the endpoint and API key.
    pub fn new(endpoint: &str, api_key: &str) -> ConfigResult<Self> {
        if api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey("openai"));
        }
        validate_http_endpoint("LLM_ENDPOINT", endpoint)?;

        let mut headers = header::HeaderMap::new();
        let mut auth = header::HeaderValue::from_str(&format!("Bearer {api_key}")).map_err(|_| {
            ConfigError::InvalidFormat {
                var: "LLM_API_KEY",
                reason: "not a valid header value",
            }
        })?;
        auth.set_sensitive(true);
        headers.insert(header::AUTHORIZATION, auth);
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|_| ConfigError::InvalidFormat {
                var: "LLM_ENDPOINT",
                reason: "failed to build HTTP client",
            })?;

        let base = endpoint.trim_end_matches('/').to_string();
        Ok(Self {
            client,
            url_chat: format!("{base}/v1/chat/completions"),
            url_models: format!("{base}/v1/models"),
            endpoint: base,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Performs a non-streaming chat completion with (system, user) messages.
    pub async fn generate(
        &self,
        binding: &AgentBinding,
        system: &str,
        user: &str,
    ) -> Result<String, LlmError> {
        let body = ChatCompletionRequest {
            model: &binding.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: binding.temperature,
            max_tokens: binding.max_tokens,
        };

        debug!(
            model = %binding.model,
            prompt_len = user.len(),
            "POST {}", self.url_chat
        );

        let resp = self.client.post(&self.url_chat).json(&body).send().await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let text = resp.text().await.unwrap_or_default();
            return Err(status_to_error(status, &make_snippet(&text)));
        }

        let out: ChatCompletionResponse = resp.json().await.map_err(|e| {
            LlmError::Parse(format!(
                "serde error: {e}; expected `choices[0].message.content`"
            ))
        })?;

        out.choices
            .into_iter()
            .find_map(|c| c.message.content)
            .ok_or_else(|| LlmError::Parse("empty `choices` in chat completion".into()))
    }

    /// Best-effort health probe; returns probe latency in milliseconds.
    pub async fn probe(&self) -> Result<u128, LlmError> {
        let started = Instant::now();
        let resp = self.client.get(&self.url_models).send().await?;
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let text = resp.text().await.unwrap_or_default();
            return Err(status_to_error(status, &make_snippet(&text)));
        }
        Ok(started.elapsed().as_millis())
    }
}

/* ---------------------------- HTTP payloads ---------------------------- */

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageOut,
}

#[derive(Debug, Deserialize)]
struct ChatMessageOut {
    content: Option<String>,
}
