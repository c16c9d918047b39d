//! Credential redaction for logs and error messages.
//!
//! Secrets are accepted at construction time and never appear in any
//! returned value, error message, or log line: every outbound text path
//! runs through [`Redactor::scrub`], which rewrites registered secret
//! substrings to a fixed marker.

/// Fixed marker substituted for any registered credential substring.
pub const REDACTION_MARKER: &str = "***REDACTED***";

/// Holds the set of secret strings that must never be emitted verbatim.
#[derive(Clone, Default)]
pub struct Redactor {
    secrets: Vec<String>,
}

// Never expose the registered secrets, not even through `{:?}`.
impl std::fmt::Debug for Redactor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Redactor")
            .field("secrets", &self.secrets.len())
            .finish()
    }
}

impl Redactor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a secret. Empty and very short values are ignored so the
    /// scrubber never rewrites incidental one- or two-character matches.
    pub fn register(&mut self, secret: impl Into<String>) {
        let secret = secret.into();
        if secret.trim().len() >= 4 {
            self.secrets.push(secret);
        }
    }

    /// Registers an optional secret; `None` is a no-op.
    pub fn register_opt(&mut self, secret: Option<&str>) {
        if let Some(s) = secret {
            self.register(s.to_string());
        }
    }

    /// Returns `text` with every registered secret replaced by the marker.
    pub fn scrub(&self, text: &str) -> String {
        let mut out = text.to_string();
        for secret in &self.secrets {
            if out.contains(secret.as_str()) {
                out = out.replace(secret.as_str(), REDACTION_MARKER);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registered_secrets_are_replaced_with_the_marker() {
        let mut r = Redactor::new();
        r.register("ghp_supersecret");
        r.register("sk-openai-key");

        let line = "GET https://x?token=ghp_supersecret failed; key sk-openai-key rejected";
        let scrubbed = r.scrub(line);
        assert!(!scrubbed.contains("ghp_supersecret"));
        assert!(!scrubbed.contains("sk-openai-key"));
        assert_eq!(scrubbed.matches(REDACTION_MARKER).count(), 2);
    }

    #[test]
    fn short_values_are_not_registered() {
        let mut r = Redactor::new();
        r.register("ab");
        assert_eq!(r.scrub("cab"), "cab");
    }
}
