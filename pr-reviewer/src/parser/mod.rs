//! Extended unified-diff parser.
//!
//! Features:
//! - One `FileChange` per `diff --git` section; tolerates hunks-only input
//!   with no file headers (single headerless section).
//! - Ignores `\ No newline at end of file` marker lines.
//! - Binary patch heuristics (`GIT binary patch`, `Binary files ... differ`).
//! - Classifies line events as add / delete / modify: a `-` run immediately
//!   followed by `+` lines pairs index-wise into modifications.
//! - Malformed hunk headers skip that hunk; the rest of the file parses.
//!
//! Fails only when the payload contains neither a `diff --git` header nor a
//! single `@@` hunk header.

use std::collections::VecDeque;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use crate::errors::ParseError;
use crate::model::{AddedLine, FileChange, ModifiedLine, ParsedDiff, RemovedLine};

lazy_static! {
    static ref HUNK_RE: Regex =
        Regex::new(r"^@@ -(\d+)(?:,(\d+))? \+(\d+)(?:,(\d+))? @@").expect("valid hunk regex");
    static ref DIFF_GIT_RE: Regex =
        Regex::new(r"^diff --git a/(.+) b/(.+)$").expect("valid diff header regex");
}

/// Parses unified diff text into an ordered sequence of file changes.
pub fn parse(diff_text: &str) -> Result<ParsedDiff, ParseError> {
    let has_file_headers = diff_text.lines().any(|l| l.starts_with("diff --git "));
    let has_hunks = diff_text.lines().any(|l| HUNK_RE.is_match(l));
    if !has_file_headers && !has_hunks {
        return Err(ParseError::UnrecognizedDiff);
    }

    let mut files = Vec::new();

    if has_file_headers {
        let mut section: Vec<&str> = Vec::new();
        let mut in_section = false;
        for line in diff_text.lines() {
            if line.starts_with("diff --git ") {
                if in_section {
                    files.extend(parse_file_section(&section));
                    section.clear();
                }
                in_section = true;
            }
            if in_section {
                section.push(line);
            }
        }
        if in_section {
            files.extend(parse_file_section(&section));
        }
    } else {
        // Hunks-only payload: a single section with no path headers.
        let lines: Vec<&str> = diff_text.lines().collect();
        files.extend(parse_file_section(&lines));
    }

    Ok(ParsedDiff { files })
}

/// Parses one `diff --git` section (header lines + hunks) into a file change.
fn parse_file_section(lines: &[&str]) -> Option<FileChange> {
    let (old_path, new_path) = extract_paths(lines);

    // Rename with edits collapses onto the post-change path; pure deletions
    // keep the pre-change path.
    let file_path = match (&old_path, &new_path) {
        (_, Some(new)) => new.clone(),
        (Some(old), None) => old.clone(),
        (None, None) => "unknown".to_string(),
    };

    let is_binary = lines.iter().any(|l| looks_like_binary_patch(l));
    if is_binary {
        return Some(FileChange {
            language: language_for_path(&file_path).to_string(),
            file_path,
            is_binary: true,
            additions: Vec::new(),
            deletions: Vec::new(),
            modifications: Vec::new(),
        });
    }

    let mut additions = Vec::new();
    let mut deletions = Vec::new();
    let mut modifications = Vec::new();

    // Removed lines awaiting a paired `+` at the same hunk position.
    let mut pending: VecDeque<RemovedLine> = VecDeque::new();
    let mut old_line = 0u32;
    let mut new_line = 0u32;
    let mut in_hunk = false;

    for line in lines {
        if line.starts_with("@@") {
            deletions.extend(pending.drain(..));
            match HUNK_RE.captures(line) {
                Some(caps) => {
                    old_line = caps[1].parse().unwrap_or(0);
                    new_line = caps[3].parse().unwrap_or(0);
                    in_hunk = true;
                }
                None => {
                    // Malformed hunk header: skip until the next valid one.
                    debug!(%file_path, header = %line, "skipping malformed hunk");
                    in_hunk = false;
                }
            }
            continue;
        }

        // Marker lines are not diff content.
        if line.starts_with("\\ ") {
            continue;
        }

        if !in_hunk {
            // File headers and any prelude before the first '@@'.
            continue;
        }

        if let Some(rest) = line.strip_prefix('+') {
            if let Some(removed) = pending.pop_front() {
                modifications.push(ModifiedLine {
                    old_line: removed.old_line,
                    new_line,
                    old_content: removed.content,
                    new_content: rest.to_string(),
                });
            } else {
                additions.push(AddedLine {
                    new_line,
                    content: rest.to_string(),
                });
            }
            new_line += 1;
        } else if let Some(rest) = line.strip_prefix('-') {
            pending.push_back(RemovedLine {
                old_line,
                content: rest.to_string(),
            });
            old_line += 1;
        } else {
            // Context (or a stray line we treat as context): any pending
            // removals are unpaired deletions.
            deletions.extend(pending.drain(..));
            old_line += 1;
            new_line += 1;
        }
    }
    deletions.extend(pending.drain(..));

    Some(FileChange {
        language: language_for_path(&file_path).to_string(),
        file_path,
        is_binary: false,
        additions,
        deletions,
        modifications,
    })
}

/// Extracts (old, new) paths from `---`/`+++` headers, falling back to the
/// `diff --git` line. `/dev/null` maps to `None`.
fn extract_paths(lines: &[&str]) -> (Option<String>, Option<String>) {
    let mut old_path = None;
    let mut new_path = None;

    for line in lines {
        if line.starts_with("@@") {
            break;
        }
        if let Some(p) = line.strip_prefix("--- ") {
            old_path = strip_prefix_marker(p, "a/");
        } else if let Some(p) = line.strip_prefix("+++ ") {
            new_path = strip_prefix_marker(p, "b/");
        }
    }

    if old_path.is_none() && new_path.is_none() {
        if let Some(first) = lines.first() {
            if let Some(caps) = DIFF_GIT_RE.captures(first) {
                old_path = Some(caps[1].to_string());
                new_path = Some(caps[2].to_string());
            }
        }
    }

    (old_path, new_path)
}

fn strip_prefix_marker(path: &str, marker: &str) -> Option<String> {
    let path = path.trim();
    if path == "/dev/null" {
        return None;
    }
    Some(path.strip_prefix(marker).unwrap_or(path).to_string())
}

/// Simple heuristic to detect binary patches or messages in unified diff.
pub fn looks_like_binary_patch(line: &str) -> bool {
    line.contains("GIT binary patch")
        || line.starts_with("Binary files ")
        || (line.starts_with("Files ") && line.contains(" differ"))
}

/// Language tag by extension. Closed mapping; everything else is "unknown".
pub fn language_for_path(path: &str) -> &'static str {
    let ext = path.rsplit_once('.').map(|(_, e)| e).unwrap_or("");
    match ext {
        "py" => "python",
        "js" | "jsx" => "javascript",
        "ts" | "tsx" => "typescript",
        "java" => "java",
        "c" | "h" => "c",
        "cpp" | "hpp" | "cc" => "cpp",
        "go" => "go",
        "rs" => "rust",
        "rb" => "ruby",
        "php" => "php",
        "kt" => "kotlin",
        "swift" => "swift",
        "dart" => "dart",
        _ => "unknown",
    }
}
