//! Finding aggregation: validity and severity filtering plus summary
//! computation. Markdown rendering lives in [`markdown`].

pub mod markdown;

use std::collections::BTreeMap;

use tracing::debug;

use crate::model::{
    Category, Finding, ParsedDiff, ReviewContext, ReviewSummary, Severity,
};

/// Applies the configuration filters to merged analyzer output and computes
/// the run summary. Order of the surviving findings is preserved.
///
/// Two filters run, in order:
/// 1. validity: the finding's line must exist post-change in the parsed
///    diff (analyzers that hallucinate line numbers lose those findings);
/// 2. threshold: severity strictly below the configured threshold drops.
pub fn aggregate(ctx: &ReviewContext, merged: Vec<Finding>) -> (Vec<Finding>, ReviewSummary) {
    let anchors = ctx.diff.anchor_lines();

    let findings: Vec<Finding> = merged
        .into_iter()
        .filter(|f| {
            let valid = anchors
                .get(&f.file_path)
                .is_some_and(|lines| lines.contains(&f.line_number));
            if !valid {
                debug!(
                    file = %f.file_path,
                    line = f.line_number,
                    agent = f.agent_source.as_str(),
                    "dropping finding outside the parsed diff"
                );
            }
            valid
        })
        .filter(|f| f.severity >= ctx.config.severity_threshold)
        .collect();

    let summary = summarize(&ctx.diff, &findings);
    (findings, summary)
}

/// Builds totals and histograms for the surviving findings.
pub fn summarize(diff: &ParsedDiff, findings: &[Finding]) -> ReviewSummary {
    let mut by_severity: BTreeMap<Severity, u64> =
        Severity::ALL.into_iter().map(|s| (s, 0)).collect();
    let mut by_category: BTreeMap<Category, u64> =
        Category::ALL.into_iter().map(|c| (c, 0)).collect();

    for f in findings {
        *by_severity.entry(f.severity).or_default() += 1;
        *by_category.entry(f.category).or_default() += 1;
    }

    ReviewSummary {
        total_findings: findings.len(),
        by_severity,
        by_category,
        files_analyzed: diff.files_analyzed(),
        lines_changed: diff.lines_changed(),
    }
}
