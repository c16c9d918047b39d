use crate::config::llm_provider::LlmProvider;

/// Configuration for an LLM backend connection.
///
/// This struct contains both general and provider-specific parameters and
/// can be extended as needed to support new backends.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmModelConfig {
    /// The LLM provider/backend (Ollama, OpenAI, Scripted).
    pub provider: LlmProvider,

    /// Default model identifier string (e.g., `"qwen2.5-coder:7b-instruct"`).
    pub model: String,

    /// Inference endpoint (local server or remote API URL).
    pub endpoint: String,

    /// Optional API key for providers that require authentication.
    pub api_key: Option<String>,

    /// Maximum number of tokens to generate.
    pub max_tokens: Option<u32>,

    /// Sampling temperature (0.0 = deterministic).
    pub temperature: Option<f32>,

    /// Optional request timeout (in seconds).
    pub timeout_secs: Option<u64>,
}
