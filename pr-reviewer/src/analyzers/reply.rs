//! Strict parsing of analyzer model replies.
//!
//! Models wrap JSON in prose, so extraction is tolerant: the parser locates
//! the first `[` and its balanced closing `]` (string- and escape-aware).
//! Validation is strict: objects lacking `line` or a non-empty `description`
//! are discarded, and unknown severities clamp to `medium`.

use serde_json::Value;
use tracing::debug;

use llm_gateway::LlmError;

use crate::model::{Category, Finding, Severity};

/// Parses one reply into findings for `file_path`, tagging `agent_source`.
pub fn parse_reply(
    raw: &str,
    file_path: &str,
    category: Category,
) -> Result<Vec<Finding>, LlmError> {
    let json = extract_json_array(raw)
        .ok_or_else(|| LlmError::Parse("reply contains no JSON array".into()))?;
    let values: Vec<Value> = serde_json::from_str(json)
        .map_err(|e| LlmError::Parse(format!("invalid JSON array: {e}")))?;

    let mut findings = Vec::new();
    for value in values {
        let Some(obj) = value.as_object() else {
            debug!(agent = category.as_str(), "discarding non-object array element");
            continue;
        };

        let Some(line_number) = parse_line(obj.get("line")) else {
            debug!(agent = category.as_str(), "discarding finding without a line");
            continue;
        };
        let Some(description) = obj
            .get("description")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
        else {
            debug!(agent = category.as_str(), "discarding finding without a description");
            continue;
        };

        let severity = obj
            .get("severity")
            .and_then(Value::as_str)
            .and_then(Severity::parse)
            .unwrap_or(Severity::Medium);

        let suggestion = obj
            .get("suggestion")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from);

        findings.push(Finding {
            file_path: file_path.to_string(),
            line_number,
            severity,
            category,
            description: description.to_string(),
            suggestion,
            agent_source: category,
        });
    }

    Ok(findings)
}

/// Accepts a positive integer or a numeric string.
fn parse_line(value: Option<&Value>) -> Option<u32> {
    match value? {
        Value::Number(n) => n.as_u64().and_then(|v| u32::try_from(v).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Returns the slice spanning the first balanced JSON array in `s`.
/// Bracket depth is tracked outside string literals only.
pub fn extract_json_array(s: &str) -> Option<&str> {
    let start = s.find('[')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in s[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&s[start..=start + i]);
                }
            }
            _ => {}
        }
    }
    None
}
