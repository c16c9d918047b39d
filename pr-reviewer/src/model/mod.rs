//! Data model for the review pipeline.
//!
//! These types are the "normalized output" of diff ingestion and the
//! currency of every later stage (analysis, aggregation, persistence,
//! wire serialization).

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use llm_gateway::LlmError;

/// Totally ordered finding severity: `low < medium < high < critical`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Low,
        Severity::Medium,
        Severity::High,
        Severity::Critical,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    /// Case-insensitive parse; unknown values are `None` (callers decide
    /// whether to clamp or reject).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            "critical" => Some(Self::Critical),
            _ => None,
        }
    }

    /// Integer rank used for ordering in SQL (`low = 0 … critical = 3`).
    pub fn rank(self) -> i64 {
        match self {
            Self::Low => 0,
            Self::Medium => 1,
            Self::High => 2,
            Self::Critical => 3,
        }
    }
}

/// Analyzer category. Doubles as the agent id of the analyzer that produced
/// a finding (`agent_source`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Logic,
    Readability,
    Performance,
    Security,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Logic,
        Category::Readability,
        Category::Performance,
        Category::Security,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Logic => "logic",
            Self::Readability => "readability",
            Self::Performance => "performance",
            Self::Security => "security",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "logic" => Some(Self::Logic),
            "readability" => Some(Self::Readability),
            "performance" => Some(Self::Performance),
            "security" => Some(Self::Security),
            _ => None,
        }
    }

    pub fn all_enabled() -> BTreeSet<Category> {
        Self::ALL.into_iter().collect()
    }
}

/// Where the change under review comes from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ChangeSource {
    /// A hosted pull request, addressed by URL or by `owner/name` + number.
    Remote {
        url: Option<String>,
        repository: Option<String>,
        pr_number: Option<u64>,
        access_token: Option<String>,
    },
    /// A raw unified diff supplied by the caller, with optional labels.
    Manual {
        diff_text: String,
        repository: Option<String>,
        pr_number: Option<u64>,
    },
}

/// High-level metadata for a pull request. Every field is optional so the
/// manual path can carry partial (or no) labels.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangeMetadata {
    /// `owner/name`.
    pub repository: Option<String>,
    pub pr_number: Option<u64>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub head_commit_sha: Option<String>,
    pub base_branch: Option<String>,
    pub head_branch: Option<String>,
}

/// One added line, addressed by its post-change line number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddedLine {
    pub new_line: u32,
    pub content: String,
}

/// One removed line, addressed by its pre-change line number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemovedLine {
    pub old_line: u32,
    pub content: String,
}

/// A removed/added pair at the same hunk position: both contents and both
/// line numbers are retained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModifiedLine {
    pub old_line: u32,
    pub new_line: u32,
    pub old_content: String,
    pub new_content: String,
}

/// File-level change with classified line events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileChange {
    /// Post-change path (pre-change path for pure deletions).
    pub file_path: String,
    /// Language tag from the closed extension map; `"unknown"` otherwise.
    pub language: String,
    pub is_binary: bool,
    pub additions: Vec<AddedLine>,
    pub deletions: Vec<RemovedLine>,
    pub modifications: Vec<ModifiedLine>,
}

impl FileChange {
    /// Number of classified line events in this file.
    pub fn changed_lines(&self) -> usize {
        self.additions.len() + self.deletions.len() + self.modifications.len()
    }
}

/// Structured representation of a unified diff: an ordered file sequence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedDiff {
    pub files: Vec<FileChange>,
}

impl ParsedDiff {
    /// Count of distinct non-binary files.
    pub fn files_analyzed(&self) -> usize {
        self.files
            .iter()
            .filter(|f| !f.is_binary)
            .map(|f| f.file_path.as_str())
            .collect::<BTreeSet<_>>()
            .len()
    }

    /// Total classified line events over non-binary files.
    pub fn lines_changed(&self) -> usize {
        self.files
            .iter()
            .filter(|f| !f.is_binary)
            .map(FileChange::changed_lines)
            .sum()
    }

    /// True when nothing reviewable remains (no non-binary files).
    pub fn has_no_reviewable_files(&self) -> bool {
        self.files.iter().all(|f| f.is_binary)
    }

    /// Post-change line numbers that exist per file (additions plus the new
    /// side of modifications). Findings outside these anchors are dropped.
    pub fn anchor_lines(&self) -> HashMap<String, BTreeSet<u32>> {
        let mut map: HashMap<String, BTreeSet<u32>> = HashMap::new();
        for f in self.files.iter().filter(|f| !f.is_binary) {
            let entry = map.entry(f.file_path.clone()).or_default();
            entry.extend(f.additions.iter().map(|l| l.new_line));
            entry.extend(f.modifications.iter().map(|l| l.new_line));
        }
        map
    }
}

/// Caller-supplied review knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewConfig {
    /// Findings strictly below this severity are dropped.
    #[serde(default = "ReviewConfig::default_threshold")]
    pub severity_threshold: Severity,
    /// Which analyzers run. Defaults to all four.
    #[serde(default = "Category::all_enabled")]
    pub enabled_categories: BTreeSet<Category>,
    /// Free-form rules appended **verbatim** to analyzer prompts. Untrusted
    /// prompt substitution: callers own the content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_rules: Option<BTreeMap<String, String>>,
}

impl ReviewConfig {
    fn default_threshold() -> Severity {
        Severity::Medium
    }
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            severity_threshold: Severity::Medium,
            enabled_categories: Category::all_enabled(),
            custom_rules: None,
        }
    }
}

/// Immutable bundle handed to every analyzer.
#[derive(Debug, Clone)]
pub struct ReviewContext {
    pub diff: ParsedDiff,
    pub config: ReviewConfig,
    pub metadata: Option<ChangeMetadata>,
}

/// A structured critique tied to a file and a post-change line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub file_path: String,
    pub line_number: u32,
    pub severity: Severity,
    pub category: Category,
    /// Non-empty problem statement. Canonical in-memory field; the wire
    /// payload additionally aliases it as `message`.
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    /// Analyzer that produced the finding; never lost across aggregation.
    pub agent_source: Category,
}

/// Terminal per-analyzer outcome that does not fail the review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerFailure {
    pub category: Category,
    pub kind: FailureKind,
    pub message: String,
}

/// Closed classification of analyzer failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Timeout,
    Transport,
    Auth,
    RateLimited,
    Parse,
    Crashed,
}

impl From<&LlmError> for FailureKind {
    fn from(e: &LlmError) -> Self {
        match e {
            LlmError::Timeout(_) => Self::Timeout,
            LlmError::Transport(_) => Self::Transport,
            LlmError::Auth => Self::Auth,
            LlmError::RateLimited { .. } => Self::RateLimited,
            LlmError::Parse(_) => Self::Parse,
        }
    }
}

/// Totals and histograms for one review run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewSummary {
    pub total_findings: usize,
    pub by_severity: BTreeMap<Severity, u64>,
    pub by_category: BTreeMap<Category, u64>,
    pub files_analyzed: usize,
    pub lines_changed: usize,
}

/// Persisted, externally addressable outcome of one pipeline execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewResult {
    pub review_id: Uuid,
    pub metadata: Option<ChangeMetadata>,
    pub commit_sha: Option<String>,
    pub config: ReviewConfig,
    pub findings: Vec<Finding>,
    pub summary: ReviewSummary,
    /// Diagnostics for the run; not persisted.
    #[serde(default)]
    pub failures: Vec<AnalyzerFailure>,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_order_is_total() {
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::Medium < Severity::High);
        assert!(Severity::High < Severity::Critical);
    }

    #[test]
    fn severity_and_category_round_trip_lowercase() {
        for s in Severity::ALL {
            assert_eq!(Severity::parse(s.as_str()), Some(s));
        }
        for c in Category::ALL {
            assert_eq!(Category::parse(c.as_str()), Some(c));
        }
        assert_eq!(Severity::parse("CRITICAL"), Some(Severity::Critical));
        assert_eq!(Severity::parse("bogus"), None);
    }

    #[test]
    fn config_defaults_enable_everything_at_medium() {
        let cfg = ReviewConfig::default();
        assert_eq!(cfg.severity_threshold, Severity::Medium);
        assert_eq!(cfg.enabled_categories.len(), 4);
        assert!(cfg.custom_rules.is_none());

        let from_empty_json: ReviewConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(from_empty_json, cfg);
    }

    #[test]
    fn diff_stats_ignore_binary_files() {
        let diff = ParsedDiff {
            files: vec![
                FileChange {
                    file_path: "a.py".into(),
                    language: "python".into(),
                    is_binary: false,
                    additions: vec![AddedLine {
                        new_line: 1,
                        content: "x = 1".into(),
                    }],
                    deletions: vec![RemovedLine {
                        old_line: 4,
                        content: "y = 2".into(),
                    }],
                    modifications: vec![],
                },
                FileChange {
                    file_path: "logo.png".into(),
                    language: "unknown".into(),
                    is_binary: true,
                    additions: vec![],
                    deletions: vec![],
                    modifications: vec![],
                },
            ],
        };
        assert_eq!(diff.files_analyzed(), 1);
        assert_eq!(diff.lines_changed(), 2);
        assert!(!diff.has_no_reviewable_files());
        assert_eq!(diff.anchor_lines()["a.py"].iter().copied().collect::<Vec<_>>(), vec![1]);
    }
}
