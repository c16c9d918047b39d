//! Default LLM configs loaded strictly from environment variables.
//!
//! # Environment variables
//!
//! Common:
//! - `LLM_PROVIDER`     = provider kind (`ollama`, `openai`, `scripted`; default `ollama`)
//! - `LLM_MODEL`        = default model id (mandatory for ollama/openai)
//! - `LLM_MAX_TOKENS`   = optional max tokens (u32)
//! - `LLM_TIMEOUT_SECS` = optional per-call timeout (u64)
//!
//! Endpoint resolution (first non-empty wins):
//! 1. `LLM_ENDPOINT`
//! 2. `OLLAMA_URL`
//! 3. `http://localhost:11434`
//!
//! OpenAI-specific:
//! - `LLM_API_KEY` = API key (mandatory for openai)
//!
//! Per-agent model overrides:
//! - `LLM_MODEL_LOGIC`, `LLM_MODEL_READABILITY`, `LLM_MODEL_PERFORMANCE`,
//!   `LLM_MODEL_SECURITY`

use std::str::FromStr;

use crate::{
    config::{
        llm_model_config::LlmModelConfig,
        llm_provider::LlmProvider,
        model_bindings::{AgentBinding, KNOWN_AGENTS, ModelBindings},
    },
    error_handler::{
        ConfigError, ConfigResult, env_opt, env_opt_u32, env_opt_u64, must_env,
        validate_http_endpoint,
    },
};

/// Resolves the inference endpoint strictly from environment.
fn llm_endpoint() -> ConfigResult<String> {
    let endpoint = env_opt("LLM_ENDPOINT")
        .or_else(|| env_opt("OLLAMA_URL"))
        .unwrap_or_else(|| "http://localhost:11434".to_string());
    validate_http_endpoint("LLM_ENDPOINT", &endpoint)?;
    Ok(endpoint)
}

/// Builds the backend connection config from environment.
pub fn model_config_from_env() -> ConfigResult<LlmModelConfig> {
    let provider = match env_opt("LLM_PROVIDER") {
        Some(v) => LlmProvider::from_str(&v)?,
        None => LlmProvider::Ollama,
    };

    let model = match provider {
        // The scripted backend never reaches a model server.
        LlmProvider::Scripted => env_opt("LLM_MODEL").unwrap_or_else(|| "scripted".to_string()),
        _ => must_env("LLM_MODEL")?,
    };
    if model.trim().is_empty() {
        return Err(ConfigError::EmptyModel);
    }

    let api_key = env_opt("LLM_API_KEY");
    if provider == LlmProvider::OpenAi && api_key.is_none() {
        return Err(ConfigError::MissingApiKey("openai"));
    }

    Ok(LlmModelConfig {
        provider,
        model,
        endpoint: llm_endpoint()?,
        api_key,
        max_tokens: env_opt_u32("LLM_MAX_TOKENS")?,
        temperature: None,
        timeout_secs: env_opt_u64("LLM_TIMEOUT_SECS")?,
    })
}

/// Builds the agent→model binding table from environment: the default model
/// everywhere, then per-agent `LLM_MODEL_<AGENT>` overrides on top.
pub fn bindings_from_env(cfg: &LlmModelConfig) -> ConfigResult<ModelBindings> {
    let mut default = AgentBinding::with_model(cfg.model.clone());
    if let Some(max_tokens) = cfg.max_tokens {
        default.max_tokens = max_tokens;
    }
    if let Some(timeout) = cfg.timeout_secs {
        default.timeout_secs = timeout;
    }

    let mut bindings = ModelBindings::new(default.clone());
    for agent in KNOWN_AGENTS {
        let var = format!("LLM_MODEL_{}", agent.to_ascii_uppercase());
        if let Some(model) = env_opt(&var) {
            let mut binding = default.clone();
            binding.model = model;
            bindings = bindings.bind(*agent, binding);
        }
    }
    Ok(bindings)
}
