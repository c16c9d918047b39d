//! Analyzer specializations and the shared per-file runner.
//!
//! The four analyzers differ only in behavior data: category, system
//! prompt, task instructions, and language ignore set. They live in a
//! static table; there is no dynamic dispatch. The shared runner walks the
//! non-binary files of the context, asks the gateway for a JSON array of
//! findings per file, and parses the reply strictly.
//!
//! A gateway or parse failure makes the whole analyzer contribute zero
//! findings plus a recorded error; it never panics outward.

pub mod prompt;
pub mod reply;

use tracing::debug;

use llm_gateway::{LlmError, LlmGateway};

use crate::model::{Category, FileChange, Finding, ReviewContext};

/// Behavioral description of one analyzer.
#[derive(Debug)]
pub struct AnalyzerSpec {
    pub category: Category,
    /// Agent id used for model binding and telemetry.
    pub agent_id: &'static str,
    pub system_prompt: &'static str,
    /// Category-specific task instructions inserted into the user prompt.
    pub task_prompt: &'static str,
    /// Languages this analyzer skips.
    pub ignore_languages: &'static [&'static str],
}

impl AnalyzerSpec {
    fn wants(&self, file: &FileChange) -> bool {
        !file.is_binary && !self.ignore_languages.contains(&file.language.as_str())
    }
}

/// The built-in analyzer set.
pub static ANALYZERS: [AnalyzerSpec; 4] = [
    AnalyzerSpec {
        category: Category::Logic,
        agent_id: "logic",
        system_prompt: "You are a senior code reviewer focused on correctness. \
            Be concise and actionable. Avoid generic advice. \
            If the change looks correct, report nothing rather than inventing issues.",
        task_prompt: "Look for correctness defects in the changed lines only:\n\
            - null/None dereferences\n\
            - unreachable code\n\
            - off-by-one errors\n\
            - loops that may not terminate\n\
            - arguments passed with the wrong type or in the wrong order\n\
            Every finding needs `line`, `description`, and `severity`.",
        ignore_languages: &[],
    },
    AnalyzerSpec {
        category: Category::Readability,
        agent_id: "readability",
        system_prompt: "You are a senior code reviewer focused on readability and \
            maintainability. Be concise and actionable. Respect the project's \
            style; do not propose reformatting unrelated code.",
        task_prompt: "Look for readability problems in the changed lines only:\n\
            - functions with high cyclomatic complexity\n\
            - unclear or misleading names\n\
            - deep nesting\n\
            - missing documentation on non-obvious code\n\
            Every finding needs `line`, `description`, and a non-empty `suggestion` \
            with a concrete improvement.",
        ignore_languages: &["unknown"],
    },
    AnalyzerSpec {
        category: Category::Performance,
        agent_id: "performance",
        system_prompt: "You are a senior code reviewer focused on performance. \
            Be concise and actionable. Only report issues with a plausible, \
            measurable impact.",
        task_prompt: "Look for performance problems in the changed lines only:\n\
            - poor asymptotic complexity\n\
            - values recomputed when they could be reused\n\
            - N+1 I/O or query patterns\n\
            Every finding needs `line`, `description`, and `suggestion`. The \
            description MUST include one sentence stating the expected impact.",
        ignore_languages: &[],
    },
    AnalyzerSpec {
        category: Category::Security,
        agent_id: "security",
        system_prompt: "You are a senior application security reviewer. \
            Be concise and actionable. Never downplay injection or credential \
            exposure.",
        task_prompt: "Look for security weaknesses in the changed lines only:\n\
            - injection (SQL, command, template)\n\
            - missing input validation\n\
            - authentication or authorization weaknesses\n\
            - secrets or credentials in code\n\
            Every finding needs `line`, `description`, `severity`, and the \
            remediation as `suggestion`.",
        ignore_languages: &[],
    },
];

/// Returns the analyzers enabled by the context's config, in table order.
pub fn enabled(ctx: &ReviewContext) -> impl Iterator<Item = &'static AnalyzerSpec> + '_ {
    ANALYZERS
        .iter()
        .filter(|s| ctx.config.enabled_categories.contains(&s.category))
}

/// Runs one analyzer over every file it wants, via the shared gateway.
pub async fn run_analyzer(
    spec: &'static AnalyzerSpec,
    ctx: &ReviewContext,
    gateway: &LlmGateway,
) -> Result<Vec<Finding>, LlmError> {
    let mut findings = Vec::new();

    for file in ctx.diff.files.iter().filter(|f| spec.wants(f)) {
        let user_prompt = prompt::build_user_prompt(spec, file, &ctx.config);
        debug!(
            agent = spec.agent_id,
            file = %file.file_path,
            prompt_len = user_prompt.len(),
            "invoking analyzer model"
        );

        let raw = gateway
            .invoke(spec.agent_id, spec.system_prompt, &user_prompt)
            .await?;
        let parsed = reply::parse_reply(&raw, &file.file_path, spec.category)?;
        debug!(
            agent = spec.agent_id,
            file = %file.file_path,
            found = parsed.len(),
            "analyzer reply parsed"
        );
        findings.extend(parsed);
    }

    Ok(findings)
}
