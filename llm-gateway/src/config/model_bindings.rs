//! Static agent→model binding table.
//!
//! Each analyzer agent is bound to a model plus per-call parameters. The
//! table is a small closed mapping with a mandatory default; unknown agent
//! ids resolve to the default binding.

use std::collections::HashMap;

/// Per-call invocation parameters for one agent.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentBinding {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

impl AgentBinding {
    /// A binding with the standard call parameters for the given model.
    pub fn with_model(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            temperature: 0.1,
            max_tokens: 4_000,
            timeout_secs: 300,
        }
    }
}

/// Agent ids of the built-in analyzers. Anything else falls back to the
/// default binding.
pub const KNOWN_AGENTS: &[&str] = &["logic", "readability", "performance", "security"];

/// Closed mapping from agent id to binding, with a mandatory default.
#[derive(Debug, Clone)]
pub struct ModelBindings {
    default: AgentBinding,
    overrides: HashMap<String, AgentBinding>,
}

impl ModelBindings {
    pub fn new(default: AgentBinding) -> Self {
        Self {
            default,
            overrides: HashMap::new(),
        }
    }

    /// Adds or replaces the binding for one agent id.
    pub fn bind(mut self, agent_id: impl Into<String>, binding: AgentBinding) -> Self {
        self.overrides.insert(agent_id.into(), binding);
        self
    }

    /// Resolves the binding for an agent; unknown ids use the default.
    pub fn resolve(&self, agent_id: &str) -> &AgentBinding {
        self.overrides.get(agent_id).unwrap_or(&self.default)
    }

    pub fn default_binding(&self) -> &AgentBinding {
        &self.default
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_agent_resolves_to_default() {
        let bindings = ModelBindings::new(AgentBinding::with_model("base-model"));
        assert_eq!(bindings.resolve("no-such-agent").model, "base-model");
        assert_eq!(bindings.resolve("security").model, "base-model");
    }

    #[test]
    fn override_wins_for_its_agent_only() {
        let bindings = ModelBindings::new(AgentBinding::with_model("base-model"))
            .bind("security", AgentBinding::with_model("hardened-model"));
        assert_eq!(bindings.resolve("security").model, "hardened-model");
        assert_eq!(bindings.resolve("logic").model, "base-model");
    }

    #[test]
    fn standard_call_parameters() {
        let b = AgentBinding::with_model("m");
        assert_eq!(b.temperature, 0.1);
        assert_eq!(b.max_tokens, 4_000);
        assert_eq!(b.timeout_secs, 300);
    }
}
