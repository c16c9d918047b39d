//! Shared LLM gateway for the review pipeline.
//!
//! One gateway instance is constructed at startup, wrapped in `Arc`, and
//! shared by every analyzer. It owns:
//!
//! - a provider client (Ollama, OpenAI, or the deterministic Scripted
//!   provider used by tests and offline dry runs), dispatched over an enum —
//!   no `async-trait`, no heap trait objects;
//! - the static agent→model binding table with a mandatory default;
//! - retry with exponential backoff for transient failures, jittered from a
//!   simple request counter (the gateway's only cross-call mutable state);
//! - a credential redactor applied to every error and log path.

pub mod config;
pub mod error_handler;
pub mod gateway;
pub mod health_service;
pub mod redaction;
pub mod services;
pub mod telemetry;

pub use config::llm_model_config::LlmModelConfig;
pub use config::llm_provider::LlmProvider;
pub use config::model_bindings::{AgentBinding, ModelBindings};
pub use error_handler::{ConfigError, LlmError, LlmErrorKind};
pub use gateway::{LlmGateway, ProviderClient};
pub use health_service::HealthStatus;
pub use redaction::{REDACTION_MARKER, Redactor};
pub use services::scripted_service::{CallLog, ScriptedService};
