//! Provider facade w/o async-trait or dynamic trait objects.
//!
//! A concrete client per hosted-repo provider behind an enum. Two provider
//! operations are required by the pipeline: *metadata* and *diff*. Transient
//! failures (transport, rate-limit) retry with exponential backoff; the
//! access token is attached only to outbound requests and never echoed into
//! returned values or logs.

pub mod github;

use std::future::Future;
use std::time::Duration;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, warn};

use crate::errors::SourceError;
use crate::model::ChangeMetadata;

lazy_static! {
    static ref PR_URL_RE: Regex =
        Regex::new(r"^https?://(?:www\.)?github\.com/([^/\s]+)/([^/\s]+)/pull/(\d+)(?:[/?#].*)?$")
            .expect("valid PR url regex");
}

/// A unique reference to a pull request: `owner/name` plus PR number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRef {
    pub repository: String,
    pub pr_number: u64,
}

/// Extracts owner, repo, and PR number from a hosted-repo URL.
/// Malformed inputs are rejected deterministically.
pub fn parse_pr_url(url: &str) -> Result<ChangeRef, SourceError> {
    let caps = PR_URL_RE
        .captures(url.trim())
        .ok_or_else(|| SourceError::UrlFormat(url.trim().to_string()))?;
    let pr_number: u64 = caps[3]
        .parse()
        .map_err(|_| SourceError::UrlFormat(url.trim().to_string()))?;
    Ok(ChangeRef {
        repository: format!("{}/{}", &caps[1], &caps[2]),
        pr_number,
    })
}

/// Validates an `owner/name` repository spec.
pub fn parse_repo_spec(repository: &str, pr_number: u64) -> Result<ChangeRef, SourceError> {
    let repository = repository.trim();
    let mut parts = repository.split('/');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(owner), Some(name), None) if !owner.is_empty() && !name.is_empty() => Ok(ChangeRef {
            repository: repository.to_string(),
            pr_number,
        }),
        _ => Err(SourceError::UrlFormat(format!(
            "repository must be owner/name, got {repository:?}"
        ))),
    }
}

/// Runtime configuration for any provider client.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// API base, e.g. "https://api.github.com".
    pub base_api: String,
    /// Access token for the provider (PAT or app token), if any.
    pub token: Option<String>,
}

/// Concrete provider client (enum-dispatch).
#[derive(Debug, Clone)]
pub enum ProviderClient {
    GitHub(github::GitHubClient),
}

/// Transient fetch attempts beyond the first.
const MAX_FETCH_RETRIES: u32 = 3;
const FETCH_BACKOFF_BASE_MS: u64 = 500;

impl ProviderClient {
    /// Constructs a concrete client from generic config.
    pub fn from_config(cfg: ProviderConfig) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .user_agent("pr-review-backend/0.1")
            .build()
            .map_err(|e| SourceError::Transport(e.to_string()))?;
        Ok(Self::GitHub(github::GitHubClient::new(
            client,
            cfg.base_api,
            cfg.token,
        )))
    }

    /// Fetch only metadata (title, author, head SHA, branches).
    pub async fn fetch_meta(&self, id: &ChangeRef) -> Result<ChangeMetadata, SourceError> {
        match self {
            Self::GitHub(c) => retry("meta", || c.get_meta(id)).await,
        }
    }

    /// Fetch the unified diff text of the pull request.
    pub async fn fetch_diff(&self, id: &ChangeRef) -> Result<String, SourceError> {
        match self {
            Self::GitHub(c) => retry("diff", || c.get_diff(id)).await,
        }
    }

    /// Convenience all-in-one fetch (metadata + diff).
    pub async fn fetch(&self, id: &ChangeRef) -> Result<(ChangeMetadata, String), SourceError> {
        let meta = self.fetch_meta(id).await?;
        debug!(
            repository = %id.repository,
            pr = id.pr_number,
            head = meta.head_commit_sha.as_deref().unwrap_or("-"),
            "metadata fetched"
        );
        let diff = self.fetch_diff(id).await?;
        debug!(diff_len = diff.len(), "diff fetched");
        Ok((meta, diff))
    }
}

/// Retries a provider operation on transient failures with exponential
/// backoff (500ms base, factor 2).
async fn retry<T, Fut>(what: &str, op: impl Fn() -> Fut) -> Result<T, SourceError>
where
    Fut: Future<Output = Result<T, SourceError>>,
{
    let mut attempt = 0u32;
    loop {
        match op().await {
            Ok(v) => return Ok(v),
            Err(e) if e.is_transient() && attempt < MAX_FETCH_RETRIES => {
                let delay = Duration::from_millis(FETCH_BACKOFF_BASE_MS * (1u64 << attempt));
                warn!(
                    op = what,
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis(),
                    kind = e.kind_str(),
                    "transient provider failure, backing off"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pr_urls_parse_into_owner_repo_number() {
        let r = parse_pr_url("https://github.com/acme/widgets/pull/42").unwrap();
        assert_eq!(r.repository, "acme/widgets");
        assert_eq!(r.pr_number, 42);

        let r = parse_pr_url("http://www.github.com/a/b/pull/7/files").unwrap();
        assert_eq!(r.repository, "a/b");
        assert_eq!(r.pr_number, 7);
    }

    #[test]
    fn malformed_urls_are_rejected_deterministically() {
        for bad in [
            "https://github.com/acme/widgets",
            "https://github.com/acme/widgets/pull/notanumber",
            "https://example.com/acme/widgets/pull/42",
            "acme/widgets#42",
            "",
        ] {
            assert!(
                matches!(parse_pr_url(bad), Err(SourceError::UrlFormat(_))),
                "expected rejection for {bad:?}"
            );
        }
    }

    #[test]
    fn repo_spec_requires_owner_and_name() {
        assert!(parse_repo_spec("acme/widgets", 1).is_ok());
        assert!(parse_repo_spec("acme", 1).is_err());
        assert!(parse_repo_spec("acme/widgets/extra", 1).is_err());
        assert!(parse_repo_spec("/widgets", 1).is_err());
    }
}
