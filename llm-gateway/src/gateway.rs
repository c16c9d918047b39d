//! The gateway facade: enum-dispatched provider client plus retry policy.
//!
//! A single [`LlmGateway`] is shared across analyzers and is safe for
//! concurrent calls: the only cross-call mutable state is an atomic request
//! counter used to vary backoff jitter.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::{
    config::{
        llm_model_config::LlmModelConfig, llm_provider::LlmProvider, model_bindings::ModelBindings,
    },
    error_handler::{ConfigError, ConfigResult, LlmError},
    redaction::Redactor,
    services::{
        ollama_service::OllamaService, open_ai_service::OpenAiService,
        scripted_service::ScriptedService,
    },
};

/// Concrete provider client (enum-dispatch, no heap trait objects).
#[derive(Debug)]
pub enum ProviderClient {
    Ollama(OllamaService),
    OpenAi(OpenAiService),
    Scripted(ScriptedService),
}

impl ProviderClient {
    /// Constructs a concrete client from a backend connection config.
    pub fn from_config(cfg: &LlmModelConfig) -> ConfigResult<Self> {
        Ok(match cfg.provider {
            LlmProvider::Ollama => Self::Ollama(OllamaService::new(&cfg.endpoint)?),
            LlmProvider::OpenAi => {
                let key = cfg
                    .api_key
                    .as_deref()
                    .ok_or(ConfigError::MissingApiKey("openai"))?;
                Self::OpenAi(OpenAiService::new(&cfg.endpoint, key)?)
            }
            LlmProvider::Scripted => Self::Scripted(ScriptedService::new("[]")),
        })
    }

    async fn generate(
        &self,
        agent_id: &str,
        binding: &crate::config::model_bindings::AgentBinding,
        system: &str,
        user: &str,
    ) -> Result<String, LlmError> {
        match self {
            Self::Ollama(c) => c.generate(binding, system, user).await,
            Self::OpenAi(c) => c.generate(binding, system, user).await,
            Self::Scripted(c) => c.generate(agent_id, binding, system, user).await,
        }
    }

    pub fn provider(&self) -> LlmProvider {
        match self {
            Self::Ollama(_) => LlmProvider::Ollama,
            Self::OpenAi(_) => LlmProvider::OpenAi,
            Self::Scripted(_) => LlmProvider::Scripted,
        }
    }
}

/// Additional attempts after the first failed transient call.
const MAX_RETRIES: u32 = 2;
/// Initial backoff; doubles per attempt.
const BACKOFF_BASE_MS: u64 = 1_000;
/// Upper bound for the additive jitter.
const JITTER_CAP_MS: u64 = 250;

/// Shared LLM invocation facade.
#[derive(Debug)]
pub struct LlmGateway {
    client: ProviderClient,
    bindings: ModelBindings,
    redactor: Redactor,
    requests: AtomicU64,
}

impl LlmGateway {
    pub fn new(client: ProviderClient, bindings: ModelBindings) -> Self {
        Self {
            client,
            bindings,
            redactor: Redactor::new(),
            requests: AtomicU64::new(0),
        }
    }

    /// Installs the credential redactor applied to outgoing errors and logs.
    pub fn with_redactor(mut self, redactor: Redactor) -> Self {
        self.redactor = redactor;
        self
    }

    pub fn provider_client(&self) -> &ProviderClient {
        &self.client
    }

    pub fn bindings(&self) -> &ModelBindings {
        &self.bindings
    }

    /// Invokes the bound model for `agent_id` with a (system, user) message
    /// pair and returns the raw reply text.
    ///
    /// Transport and rate-limit failures retry up to two more times with
    /// exponential backoff plus jitter; auth failures and per-call timeouts
    /// do not retry (the analyzer's overall deadline bounds timeouts).
    pub async fn invoke(
        &self,
        agent_id: &str,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, LlmError> {
        let binding = self.bindings.resolve(agent_id);
        let deadline = Duration::from_secs(binding.timeout_secs);
        let mut attempt = 0u32;

        loop {
            let started = Instant::now();
            let outcome = tokio::time::timeout(
                deadline,
                self.client
                    .generate(agent_id, binding, system_prompt, user_prompt),
            )
            .await;

            match outcome {
                Err(_) => {
                    warn!(
                        agent = %agent_id,
                        model = %binding.model,
                        timeout_secs = binding.timeout_secs,
                        "llm call hit per-call deadline"
                    );
                    return Err(LlmError::Timeout(binding.timeout_secs));
                }
                Ok(Ok(reply)) => {
                    info!(
                        agent = %agent_id,
                        model = %binding.model,
                        reply_len = reply.len(),
                        latency_ms = started.elapsed().as_millis(),
                        "generation completed"
                    );
                    return Ok(reply);
                }
                Ok(Err(e)) if e.is_retryable() && attempt < MAX_RETRIES => {
                    let delay = self.backoff_delay(attempt);
                    warn!(
                        agent = %agent_id,
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis(),
                        error = %self.redactor.scrub(&e.to_string()),
                        "transient llm failure, backing off"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Ok(Err(e)) => {
                    debug!(
                        agent = %agent_id,
                        kind = e.kind().as_str(),
                        "llm call failed without retry budget"
                    );
                    return Err(e.scrubbed(&self.redactor));
                }
            }
        }
    }

    /// Exponential backoff with counter-derived jitter in `0..=250ms`.
    fn backoff_delay(&self, attempt: u32) -> Duration {
        let seq = self.requests.fetch_add(1, Ordering::Relaxed);
        let jitter = (seq.wrapping_mul(113).wrapping_add(41)) % (JITTER_CAP_MS + 1);
        Duration::from_millis(BACKOFF_BASE_MS * (1u64 << attempt) + jitter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::model_bindings::AgentBinding;

    fn gateway() -> LlmGateway {
        LlmGateway::new(
            ProviderClient::Scripted(ScriptedService::new("[]")),
            ModelBindings::new(AgentBinding::with_model("scripted")),
        )
    }

    #[test]
    fn backoff_grows_exponentially_with_bounded_jitter() {
        let gw = gateway();
        for attempt in 0..3u32 {
            let d = gw.backoff_delay(attempt).as_millis() as u64;
            let base = BACKOFF_BASE_MS * (1 << attempt);
            assert!(d >= base, "delay {d} below base {base}");
            assert!(d <= base + JITTER_CAP_MS, "delay {d} above jitter cap");
        }
    }

    #[test]
    fn jitter_varies_across_requests() {
        let gw = gateway();
        let a = gw.backoff_delay(0);
        let b = gw.backoff_delay(0);
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn invoke_returns_the_scripted_reply() {
        let client = ProviderClient::Scripted(
            ScriptedService::new("[]").enqueue("security", r#"[{"line":1}]"#),
        );
        let gw = LlmGateway::new(
            client,
            ModelBindings::new(AgentBinding::with_model("scripted")),
        );
        assert_eq!(gw.invoke("security", "s", "u").await.unwrap(), r#"[{"line":1}]"#);
        assert_eq!(gw.invoke("logic", "s", "u").await.unwrap(), "[]");
    }
}
