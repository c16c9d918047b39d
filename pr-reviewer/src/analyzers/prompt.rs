//! Per-file user prompt assembly.
//!
//! The prompt renders the classified line events with explicit post-change
//! numbering, the analyzer's task block, the strict JSON response contract,
//! and any caller-supplied custom rules (inserted verbatim; the content is
//! untrusted and documented as such in the config).

use crate::analyzers::AnalyzerSpec;
use crate::model::{FileChange, ReviewConfig};

/// Shared response contract appended to every analyzer prompt.
const RESPONSE_CONTRACT: &str = "# Response format\n\
    Reply with a JSON array only, no prose before or after it. Each element:\n\
    {\"line\": <number>, \"description\": \"<non-empty problem statement>\", \
    \"severity\": \"low|medium|high|critical\", \"suggestion\": \"<fix>\"}\n\
    Rules:\n\
    - `line` MUST refer to the post-change file.\n\
    - `severity` MUST come from the closed set above.\n\
    - `description` MUST be non-empty.\n\
    - Reply with [] when nothing qualifies.\n";

/// Builds the user prompt for one analyzer and one file.
pub fn build_user_prompt(spec: &AnalyzerSpec, file: &FileChange, config: &ReviewConfig) -> String {
    let mut p = String::new();

    p.push_str("# File under review\n");
    p.push_str(&format!("Path: {}\n", file.file_path));
    p.push_str(&format!("Language: {}\n\n", file.language));

    p.push_str("# Changed lines\n");
    if !file.additions.is_empty() {
        p.push_str("Added (post-change line numbers):\n");
        for l in &file.additions {
            p.push_str(&format!("  {}: {}\n", l.new_line, l.content));
        }
    }
    if !file.modifications.is_empty() {
        p.push_str("Modified (post-change line numbers):\n");
        for l in &file.modifications {
            p.push_str(&format!(
                "  {}: {}\n      was (line {}): {}\n",
                l.new_line, l.new_content, l.old_line, l.old_content
            ));
        }
    }
    if !file.deletions.is_empty() {
        p.push_str("Removed (pre-change line numbers; do not anchor findings here):\n");
        for l in &file.deletions {
            p.push_str(&format!("  {}: {}\n", l.old_line, l.content));
        }
    }
    p.push('\n');

    p.push_str("# Task\n");
    p.push_str(spec.task_prompt);
    p.push_str("\n\n");

    if let Some(rules) = &config.custom_rules {
        if !rules.is_empty() {
            p.push_str("# Project rules (caller-supplied, verbatim)\n");
            for (name, rule) in rules {
                p.push_str(&format!("- {name}: {rule}\n"));
            }
            p.push('\n');
        }
    }

    p.push_str(RESPONSE_CONTRACT);
    p
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::ANALYZERS;
    use crate::model::{AddedLine, ModifiedLine};
    use std::collections::BTreeMap;

    fn file() -> FileChange {
        FileChange {
            file_path: "src/db.py".into(),
            language: "python".into(),
            is_binary: false,
            additions: vec![AddedLine {
                new_line: 12,
                content: "query = \"SELECT * FROM u WHERE id=\" + uid".into(),
            }],
            deletions: vec![],
            modifications: vec![ModifiedLine {
                old_line: 20,
                new_line: 21,
                old_content: "limit = 10".into(),
                new_content: "limit = 100".into(),
            }],
        }
    }

    #[test]
    fn prompt_carries_post_change_numbers_and_contract() {
        let p = build_user_prompt(&ANALYZERS[3], &file(), &ReviewConfig::default());
        assert!(p.contains("Path: src/db.py"));
        assert!(p.contains("  12: query ="));
        assert!(p.contains("  21: limit = 100"));
        assert!(p.contains("post-change file"));
        assert!(p.contains("low|medium|high|critical"));
        assert!(p.contains("Reply with [] when nothing qualifies"));
    }

    #[test]
    fn custom_rules_are_inserted_verbatim() {
        let mut config = ReviewConfig::default();
        let mut rules = BTreeMap::new();
        rules.insert(
            "sql".to_string(),
            "flag any string-built SQL as critical".to_string(),
        );
        config.custom_rules = Some(rules);

        let p = build_user_prompt(&ANALYZERS[3], &file(), &config);
        assert!(p.contains("- sql: flag any string-built SQL as critical"));
    }

    #[test]
    fn every_analyzer_prompt_names_its_required_fields() {
        let f = file();
        let config = ReviewConfig::default();
        for spec in &ANALYZERS {
            let p = build_user_prompt(spec, &f, &config);
            assert!(p.contains("`line`"), "{} names line", spec.agent_id);
            assert!(p.contains("`description`"), "{} names description", spec.agent_id);
        }
    }
}
