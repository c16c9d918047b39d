//! End-to-end review controller.
//!
//! Single public operation: `review(change_source, config)`.
//!
//! 1) **Resolve** the change source: fetch metadata + diff for remote pull
//!    requests, or take the caller's diff text on the manual path.
//! 2) **Parse** the unified diff and enforce the input limits. An empty or
//!    binary-only diff completes immediately with zero findings.
//! 3) **Orchestrate** the enabled analyzers over a shared context.
//! 4) **Aggregate** findings with the config filters applied.
//! 5) **Assemble** a `ReviewResult` under a fresh UUID, persist it, and
//!    return it.
//!
//! An optional review-level deadline wraps the whole pipeline; hitting it
//! yields `Cancelled` and nothing is persisted.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use llm_gateway::LlmGateway;

use crate::aggregate;
use crate::errors::{Error, PipelineResult};
use crate::git_providers::{self, ProviderClient, ProviderConfig};
use crate::model::{ChangeMetadata, ChangeSource, ReviewConfig, ReviewContext, ReviewResult};
use crate::orchestrator;
use crate::parser;
use crate::store::ReviewStore;

/// Input and scheduling limits for one service instance.
#[derive(Debug, Clone)]
pub struct ServiceLimits {
    pub max_files_per_review: usize,
    pub max_diff_lines: usize,
    /// Per-analyzer deadline, covering all LLM retries.
    pub analyzer_timeout: Duration,
    /// Review-level deadline wrapping the whole pipeline.
    pub review_timeout: Option<Duration>,
}

impl Default for ServiceLimits {
    fn default() -> Self {
        Self {
            max_files_per_review: 50,
            max_diff_lines: 10_000,
            analyzer_timeout: orchestrator::DEFAULT_ANALYZER_TIMEOUT,
            review_timeout: Some(Duration::from_secs(600)),
        }
    }
}

/// Drives the full pipeline: fetch → parse → analyze → aggregate → persist.
pub struct ReviewService {
    gateway: Arc<LlmGateway>,
    store: ReviewStore,
    provider: ProviderConfig,
    limits: ServiceLimits,
}

impl ReviewService {
    pub fn new(
        gateway: Arc<LlmGateway>,
        store: ReviewStore,
        provider: ProviderConfig,
        limits: ServiceLimits,
    ) -> Self {
        Self {
            gateway,
            store,
            provider,
            limits,
        }
    }

    pub fn store(&self) -> &ReviewStore {
        &self.store
    }

    pub fn gateway(&self) -> &LlmGateway {
        &self.gateway
    }

    /// Runs one review under a fresh UUID.
    pub async fn review(
        &self,
        source: ChangeSource,
        config: ReviewConfig,
    ) -> PipelineResult<ReviewResult> {
        self.review_with_id(Uuid::new_v4(), source, config).await
    }

    /// Same as [`review`](Self::review) with a caller-allocated id, so the
    /// transport can track status while the pipeline runs.
    pub async fn review_with_id(
        &self,
        review_id: Uuid,
        source: ChangeSource,
        config: ReviewConfig,
    ) -> PipelineResult<ReviewResult> {
        match self.limits.review_timeout {
            Some(deadline) => {
                match tokio::time::timeout(deadline, self.run_pipeline(review_id, source, config))
                    .await
                {
                    Ok(result) => result,
                    Err(_) => {
                        warn!(%review_id, deadline_secs = deadline.as_secs(), "review deadline hit");
                        Err(Error::Cancelled)
                    }
                }
            }
            None => self.run_pipeline(review_id, source, config).await,
        }
    }

    async fn run_pipeline(
        &self,
        review_id: Uuid,
        source: ChangeSource,
        config: ReviewConfig,
    ) -> PipelineResult<ReviewResult> {
        let t0 = Instant::now();

        debug!(%review_id, "step1: resolve change source");
        let (metadata, diff_text) = self.resolve_source(source).await?;

        debug!(%review_id, "step2: parse unified diff");
        let diff = parser::parse(&diff_text)?;
        if diff.files.len() > self.limits.max_files_per_review {
            return Err(Error::Validation(format!(
                "diff touches {} files, over the limit of {}",
                diff.files.len(),
                self.limits.max_files_per_review
            )));
        }
        if diff.lines_changed() > self.limits.max_diff_lines {
            return Err(Error::Validation(format!(
                "diff changes {} lines, over the limit of {}",
                diff.lines_changed(),
                self.limits.max_diff_lines
            )));
        }

        let commit_sha = metadata.as_ref().and_then(|m| m.head_commit_sha.clone());
        let ctx = Arc::new(ReviewContext {
            diff,
            config,
            metadata,
        });

        let (findings, failures, summary) = if ctx.diff.has_no_reviewable_files() {
            debug!(%review_id, "no reviewable files; skipping analyzers");
            (Vec::new(), Vec::new(), aggregate::summarize(&ctx.diff, &[]))
        } else {
            debug!(%review_id, "step3: orchestrate analyzers");
            let (merged, failures) = orchestrator::run(
                Arc::clone(&ctx),
                Arc::clone(&self.gateway),
                self.limits.analyzer_timeout,
            )
            .await;

            debug!(%review_id, merged = merged.len(), "step4: aggregate findings");
            let (findings, summary) = aggregate::aggregate(&ctx, merged);
            (findings, failures, summary)
        };

        let result = ReviewResult {
            review_id,
            metadata: ctx.metadata.clone(),
            commit_sha,
            config: ctx.config.clone(),
            findings,
            summary,
            failures,
            timestamp: Utc::now(),
        };

        debug!(%review_id, "step5: persist review");
        self.store.save(&result).await?;

        info!(
            %review_id,
            findings = result.findings.len(),
            failures = result.failures.len(),
            files = result.summary.files_analyzed,
            elapsed_ms = t0.elapsed().as_millis(),
            "review completed"
        );
        Ok(result)
    }

    /// Normalizes the change source into `(metadata?, unified diff text)`.
    async fn resolve_source(
        &self,
        source: ChangeSource,
    ) -> PipelineResult<(Option<ChangeMetadata>, String)> {
        match source {
            ChangeSource::Manual {
                diff_text,
                repository,
                pr_number,
            } => {
                if diff_text.trim().is_empty() {
                    return Err(Error::Validation("diff_content is empty".into()));
                }
                let metadata = if repository.is_some() || pr_number.is_some() {
                    Some(ChangeMetadata {
                        repository,
                        pr_number,
                        ..ChangeMetadata::default()
                    })
                } else {
                    None
                };
                Ok((metadata, diff_text))
            }
            ChangeSource::Remote {
                url,
                repository,
                pr_number,
                access_token,
            } => {
                let id = match (url, repository, pr_number) {
                    (Some(url), _, _) => git_providers::parse_pr_url(&url)?,
                    (None, Some(repo), Some(number)) => {
                        git_providers::parse_repo_spec(&repo, number)?
                    }
                    _ => {
                        return Err(Error::Validation(
                            "remote source needs pr_url, or repository plus pr_number".into(),
                        ));
                    }
                };

                // A caller-supplied token wins over the configured one; both
                // travel only into outbound requests.
                let token = access_token.or_else(|| self.provider.token.clone());
                let client = ProviderClient::from_config(ProviderConfig {
                    base_api: self.provider.base_api.clone(),
                    token,
                })?;
                let (meta, diff) = client.fetch(&id).await?;
                Ok((Some(meta), diff))
            }
        }
    }
}
