use std::fmt;
use std::str::FromStr;

use crate::error_handler::ConfigError;

/// Represents the provider (backend) used for large language model inference.
///
/// Adding more providers in the future (e.g., Anthropic Claude, Mistral API)
/// can be done by extending this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LlmProvider {
    /// Local Ollama runtime for on-device inference.
    Ollama,
    /// OpenAI chat-completions API.
    OpenAi,
    /// Deterministic canned-reply backend for tests and offline dry runs.
    Scripted,
}

impl fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Ollama => "ollama",
            Self::OpenAi => "openai",
            Self::Scripted => "scripted",
        };
        f.write_str(s)
    }
}

impl FromStr for LlmProvider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "openai" | "chatgpt" => Ok(Self::OpenAi),
            "scripted" => Ok(Self::Scripted),
            other => Err(ConfigError::UnsupportedProvider(other.to_string())),
        }
    }
}
