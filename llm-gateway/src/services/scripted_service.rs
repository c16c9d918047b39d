//! Deterministic scripted backend for tests and offline dry runs.
//!
//! Replies are queued per agent id; an agent with an exhausted (or absent)
//! queue receives the default reply. Optional per-agent latency makes
//! deadline behavior testable without a live model server.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::{config::model_bindings::AgentBinding, error_handler::LlmError};

/// Shared record of which agents invoked the backend, in call order.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, agent_id: &str) {
        self.0
            .lock()
            .expect("call log poisoned")
            .push(agent_id.to_string());
    }

    /// Agent ids in the order they called the backend.
    pub fn agent_ids(&self) -> Vec<String> {
        self.0.lock().expect("call log poisoned").clone()
    }

    pub fn len(&self) -> usize {
        self.0.lock().expect("call log poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Canned-reply backend with per-agent queues.
#[derive(Debug)]
pub struct ScriptedService {
    replies: Mutex<HashMap<String, VecDeque<String>>>,
    delays: HashMap<String, Duration>,
    default_reply: String,
    log: CallLog,
}

impl ScriptedService {
    /// Backend that answers every call with `default_reply`.
    pub fn new(default_reply: impl Into<String>) -> Self {
        Self {
            replies: Mutex::new(HashMap::new()),
            delays: HashMap::new(),
            default_reply: default_reply.into(),
            log: CallLog::new(),
        }
    }

    /// Attaches an externally held call log.
    pub fn with_log(mut self, log: CallLog) -> Self {
        self.log = log;
        self
    }

    /// Queues the next reply for one agent.
    pub fn enqueue(self, agent_id: impl Into<String>, reply: impl Into<String>) -> Self {
        self.replies
            .lock()
            .expect("reply queue poisoned")
            .entry(agent_id.into())
            .or_default()
            .push_back(reply.into());
        self
    }

    /// Makes every call by `agent_id` sleep for `delay` before answering.
    pub fn with_delay(mut self, agent_id: impl Into<String>, delay: Duration) -> Self {
        self.delays.insert(agent_id.into(), delay);
        self
    }

    /// Pops the next scripted reply for the agent (default when exhausted).
    pub async fn generate(
        &self,
        agent_id: &str,
        _binding: &AgentBinding,
        _system: &str,
        _user: &str,
    ) -> Result<String, LlmError> {
        self.log.record(agent_id);

        if let Some(delay) = self.delays.get(agent_id) {
            tokio::time::sleep(*delay).await;
        }

        let next = self
            .replies
            .lock()
            .expect("reply queue poisoned")
            .get_mut(agent_id)
            .and_then(VecDeque::pop_front);
        Ok(next.unwrap_or_else(|| self.default_reply.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binding() -> AgentBinding {
        AgentBinding::with_model("scripted")
    }

    #[tokio::test]
    async fn queued_replies_drain_in_order_then_fall_back() {
        let svc = ScriptedService::new("[]")
            .enqueue("security", "first")
            .enqueue("security", "second");

        let b = binding();
        assert_eq!(svc.generate("security", &b, "s", "u").await.unwrap(), "first");
        assert_eq!(svc.generate("security", &b, "s", "u").await.unwrap(), "second");
        assert_eq!(svc.generate("security", &b, "s", "u").await.unwrap(), "[]");
        assert_eq!(svc.generate("logic", &b, "s", "u").await.unwrap(), "[]");
    }

    #[tokio::test]
    async fn call_log_records_agents_in_order() {
        let log = CallLog::new();
        let svc = ScriptedService::new("[]").with_log(log.clone());
        let b = binding();

        svc.generate("logic", &b, "s", "u").await.unwrap();
        svc.generate("security", &b, "s", "u").await.unwrap();
        assert_eq!(log.agent_ids(), vec!["logic", "security"]);
    }
}
