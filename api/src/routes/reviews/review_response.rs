//! Wire shape of a completed review.
//!
//! The in-memory `Finding` keeps a single canonical `description`; on the
//! wire every finding also carries `message` with the same value, a
//! backward-compatibility aperture for existing clients.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use pr_reviewer::aggregate::markdown::render_markdown;
use pr_reviewer::model::{
    AnalyzerFailure, Category, ChangeMetadata, Finding, ReviewResult, ReviewSummary, Severity,
};

#[derive(Debug, Serialize)]
pub struct ReviewResponse {
    pub review_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pr_metadata: Option<ChangeMetadata>,
    pub findings: Vec<FindingPayload>,
    pub summary: ReviewSummary,
    pub formatted_comments: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<AnalyzerFailure>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct FindingPayload {
    pub file_path: String,
    pub line_number: u32,
    pub severity: Severity,
    pub category: Category,
    pub description: String,
    /// Alias of `description` for older clients.
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    pub agent_source: Category,
}

impl From<&Finding> for FindingPayload {
    fn from(f: &Finding) -> Self {
        Self {
            file_path: f.file_path.clone(),
            line_number: f.line_number,
            severity: f.severity,
            category: f.category,
            description: f.description.clone(),
            message: f.description.clone(),
            suggestion: f.suggestion.clone(),
            agent_source: f.agent_source,
        }
    }
}

impl From<&ReviewResult> for ReviewResponse {
    fn from(result: &ReviewResult) -> Self {
        Self {
            review_id: result.review_id,
            pr_metadata: result.metadata.clone(),
            findings: result.findings.iter().map(FindingPayload::from).collect(),
            summary: result.summary.clone(),
            formatted_comments: render_markdown(result),
            diagnostics: result.failures.clone(),
            timestamp: result.timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_finding_aliases_description_as_message() {
        let finding = Finding {
            file_path: "a.py".into(),
            line_number: 3,
            severity: Severity::High,
            category: Category::Logic,
            description: "off-by-one".into(),
            suggestion: None,
            agent_source: Category::Logic,
        };
        let payload = FindingPayload::from(&finding);
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["description"], "off-by-one");
        assert_eq!(json["message"], "off-by-one");
        assert_eq!(json["agent_source"], "logic");
    }
}
