//! Markdown rendering of a completed review.
//!
//! One top-level section per file (ordered by path), a subsection per line
//! in ascending order, and one bullet per finding in a line group. All text
//! that originates from untrusted sources (code, model output) is escaped.
//! A review with zero findings still renders a document with a positive
//! summary sentence and the computed statistics.

use std::collections::BTreeMap;

use crate::model::{AnalyzerFailure, ReviewResult, Severity};

/// Renders the full review document.
pub fn render_markdown(result: &ReviewResult) -> String {
    let mut md = String::new();

    md.push_str("# Code Review\n\n");
    if let Some(meta) = &result.metadata {
        if let (Some(repo), Some(pr)) = (&meta.repository, meta.pr_number) {
            md.push_str(&format!("**{}#{}**", escape_markdown(repo), pr));
            if let Some(title) = &meta.title {
                md.push_str(&format!(": {}", escape_markdown(title)));
            }
            md.push_str("\n\n");
        }
    }

    md.push_str("## Summary\n\n");
    if result.findings.is_empty() {
        md.push_str("No issues detected. The change looks good.\n\n");
    } else {
        md.push_str(&format!(
            "{} finding(s) at or above the configured threshold.\n\n",
            result.summary.total_findings
        ));
    }
    md.push_str(&format!(
        "- Files analyzed: {}\n- Lines changed: {}\n",
        result.summary.files_analyzed, result.summary.lines_changed
    ));
    for severity in Severity::ALL.into_iter().rev() {
        let count = result.summary.by_severity.get(&severity).copied().unwrap_or(0);
        if count > 0 {
            md.push_str(&format!("- {}: {}\n", severity.as_str(), count));
        }
    }
    md.push('\n');

    // Group by (file, line); BTreeMap gives path-ascending, line-ascending
    // iteration. Findings inside a group keep the merged order.
    let mut groups: BTreeMap<(&str, u32), Vec<&crate::model::Finding>> = BTreeMap::new();
    for f in &result.findings {
        groups
            .entry((f.file_path.as_str(), f.line_number))
            .or_default()
            .push(f);
    }

    let mut current_file: Option<&str> = None;
    for ((file_path, line), group) in &groups {
        if current_file != Some(*file_path) {
            md.push_str(&format!("## `{}`\n\n", escape_backticks(file_path)));
            current_file = Some(*file_path);
        }
        md.push_str(&format!("### Line {line}\n\n"));
        for f in group {
            md.push_str(&format!(
                "- **{}** [{}] {}\n",
                f.severity.as_str(),
                f.agent_source.as_str(),
                escape_markdown(&f.description)
            ));
            if let Some(suggestion) = &f.suggestion {
                md.push_str(&format!("  - Suggestion: {}\n", escape_markdown(suggestion)));
            }
        }
        md.push('\n');
    }

    if !result.failures.is_empty() {
        md.push_str("## Diagnostics\n\n");
        for AnalyzerFailure {
            category,
            kind,
            message,
        } in &result.failures
        {
            md.push_str(&format!(
                "- `{}` analyzer did not complete ({:?}): {}\n",
                category.as_str(),
                kind,
                escape_markdown(message)
            ));
        }
        md.push('\n');
    }

    md
}

/// Escapes Markdown metacharacters in untrusted text.
pub fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' | '`' | '*' | '_' | '[' | ']' | '#' | '|' => {
                out.push('\\');
                out.push(c);
            }
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Inside inline code spans only backticks can break out.
fn escape_backticks(text: &str) -> String {
    text.replace('`', "\u{2019}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::summarize;
    use crate::model::{
        AddedLine, Category, ChangeMetadata, FailureKind, FileChange, Finding, ParsedDiff,
        ReviewConfig,
    };
    use chrono::Utc;
    use uuid::Uuid;

    fn result_with(findings: Vec<Finding>, failures: Vec<AnalyzerFailure>) -> ReviewResult {
        let diff = ParsedDiff {
            files: vec![FileChange {
                file_path: "src/db.py".into(),
                language: "python".into(),
                is_binary: false,
                additions: vec![AddedLine {
                    new_line: 12,
                    content: "q = build(uid)".into(),
                }],
                deletions: vec![],
                modifications: vec![],
            }],
        };
        let summary = summarize(&diff, &findings);
        ReviewResult {
            review_id: Uuid::new_v4(),
            metadata: Some(ChangeMetadata {
                repository: Some("acme/widgets".into()),
                pr_number: Some(7),
                title: Some("tighten db layer".into()),
                ..ChangeMetadata::default()
            }),
            commit_sha: None,
            config: ReviewConfig::default(),
            findings,
            summary,
            failures,
            timestamp: Utc::now(),
        }
    }

    fn sql_finding() -> Finding {
        Finding {
            file_path: "src/db.py".into(),
            line_number: 12,
            severity: crate::model::Severity::Critical,
            category: Category::Security,
            description: "SQL injection via `uid` concatenation".into(),
            suggestion: Some("parameterize the query".into()),
            agent_source: Category::Security,
        }
    }

    #[test]
    fn zero_findings_still_renders_a_positive_document() {
        let md = render_markdown(&result_with(vec![], vec![]));
        assert!(md.contains("No issues detected"));
        assert!(md.contains("Files analyzed: 1"));
        assert!(md.contains("Lines changed: 1"));
        assert!(!md.contains("### Line"));
    }

    #[test]
    fn findings_group_under_file_and_line_sections() {
        let md = render_markdown(&result_with(vec![sql_finding()], vec![]));
        assert!(md.contains("## `src/db.py`"));
        assert!(md.contains("### Line 12"));
        assert!(md.contains("**critical** [security]"));
        assert!(md.contains("Suggestion: parameterize the query"));
    }

    #[test]
    fn untrusted_text_is_escaped() {
        let mut f = sql_finding();
        f.description = "drop <script> and [link](x) *now*".into();
        let md = render_markdown(&result_with(vec![f], vec![]));
        assert!(md.contains("&lt;script&gt;"));
        assert!(md.contains("\\[link\\]"));
        assert!(md.contains("\\*now\\*"));
    }

    #[test]
    fn failures_render_a_diagnostics_section() {
        let failure = AnalyzerFailure {
            category: Category::Performance,
            kind: FailureKind::Timeout,
            message: "analyzer exceeded its 300s deadline".into(),
        };
        let md = render_markdown(&result_with(vec![], vec![failure]));
        assert!(md.contains("## Diagnostics"));
        assert!(md.contains("`performance` analyzer did not complete"));
    }
}
