//! Concurrent fan-out of the parsed change to the enabled analyzers.
//!
//! Every active analyzer runs as its own task over the same shared
//! `ReviewContext`, bounded by an individual deadline. The orchestrator
//! awaits all of them and never cancels one analyzer because another
//! failed: a crash, timeout, or unrecoverable error becomes an
//! `AnalyzerFailure` while the remaining analyzers' findings survive.
//!
//! The merged output order is deterministic given the input: findings sort
//! by (file_path ascending, line ascending, severity descending,
//! agent_source ascending).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tracing::{debug, warn};

use llm_gateway::LlmGateway;

use crate::analyzers::{self, enabled};
use crate::model::{AnalyzerFailure, Category, FailureKind, Finding, ReviewContext};

/// Default per-analyzer deadline, covering all of its LLM retries.
pub const DEFAULT_ANALYZER_TIMEOUT: Duration = Duration::from_secs(300);

/// Runs all enabled analyzers concurrently and merges their output.
pub async fn run(
    ctx: Arc<ReviewContext>,
    gateway: Arc<LlmGateway>,
    analyzer_timeout: Duration,
) -> (Vec<Finding>, Vec<AnalyzerFailure>) {
    let mut set = JoinSet::new();
    let mut spawned: HashMap<tokio::task::Id, Category> = HashMap::new();

    for spec in enabled(&ctx) {
        let ctx = Arc::clone(&ctx);
        let gateway = Arc::clone(&gateway);
        let handle = set.spawn(async move {
            let outcome = tokio::time::timeout(
                analyzer_timeout,
                analyzers::run_analyzer(spec, &ctx, &gateway),
            )
            .await;
            (spec.category, outcome)
        });
        spawned.insert(handle.id(), spec.category);
    }
    debug!(analyzers = spawned.len(), "orchestrator fan-out started");

    let mut findings: Vec<Finding> = Vec::new();
    let mut failures: Vec<AnalyzerFailure> = Vec::new();

    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((category, Ok(Ok(batch)))) => {
                debug!(
                    analyzer = category.as_str(),
                    findings = batch.len(),
                    "analyzer completed"
                );
                findings.extend(batch);
            }
            Ok((category, Ok(Err(e)))) => {
                warn!(analyzer = category.as_str(), error = %e, "analyzer failed");
                failures.push(AnalyzerFailure {
                    category,
                    kind: FailureKind::from(&e),
                    message: e.to_string(),
                });
            }
            Ok((category, Err(_elapsed))) => {
                warn!(analyzer = category.as_str(), "analyzer hit its deadline");
                failures.push(AnalyzerFailure {
                    category,
                    kind: FailureKind::Timeout,
                    message: format!(
                        "analyzer exceeded its {}s deadline",
                        analyzer_timeout.as_secs()
                    ),
                });
            }
            Err(join_err) => match spawned.get(&join_err.id()).copied() {
                Some(category) => {
                    warn!(analyzer = category.as_str(), error = %join_err, "analyzer task crashed");
                    failures.push(AnalyzerFailure {
                        category,
                        kind: FailureKind::Crashed,
                        message: "analyzer task panicked".to_string(),
                    });
                }
                None => warn!(error = %join_err, "unattributed analyzer task failure"),
            },
        }
    }

    sort_findings(&mut findings);
    failures.sort_by_key(|f| f.category);
    (findings, failures)
}

/// Imposes the deterministic total order on merged findings.
pub fn sort_findings(findings: &mut [Finding]) {
    findings.sort_by(|a, b| {
        a.file_path
            .cmp(&b.file_path)
            .then(a.line_number.cmp(&b.line_number))
            .then(b.severity.cmp(&a.severity))
            .then(a.agent_source.as_str().cmp(b.agent_source.as_str()))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Severity;

    fn finding(path: &str, line: u32, severity: Severity, agent: Category) -> Finding {
        Finding {
            file_path: path.into(),
            line_number: line,
            severity,
            category: agent,
            description: "d".into(),
            suggestion: None,
            agent_source: agent,
        }
    }

    #[test]
    fn order_is_file_line_severity_desc_agent() {
        let mut findings = vec![
            finding("b.py", 1, Severity::Low, Category::Logic),
            finding("a.py", 9, Severity::Medium, Category::Security),
            finding("a.py", 2, Severity::Low, Category::Security),
            finding("a.py", 2, Severity::Critical, Category::Logic),
            finding("a.py", 2, Severity::Low, Category::Performance),
        ];
        sort_findings(&mut findings);

        let keys: Vec<(&str, u32, Severity, Category)> = findings
            .iter()
            .map(|f| (f.file_path.as_str(), f.line_number, f.severity, f.agent_source))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("a.py", 2, Severity::Critical, Category::Logic),
                ("a.py", 2, Severity::Low, Category::Performance),
                ("a.py", 2, Severity::Low, Category::Security),
                ("a.py", 9, Severity::Medium, Category::Security),
                ("b.py", 1, Severity::Low, Category::Logic),
            ]
        );
    }
}
