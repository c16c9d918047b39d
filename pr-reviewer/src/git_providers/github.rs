//! GitHub provider (REST v3) for PR metadata and diffs.
//!
//! Endpoints used:
//! - GET /repos/{owner}/{repo}/pulls/{number}                  (metadata)
//! - GET /repos/{owner}/{repo}/pulls/{number} + diff media type (unified diff)

use reqwest::Client;
use reqwest::header::ACCEPT;
use serde::Deserialize;

use crate::errors::SourceError;
use crate::git_providers::ChangeRef;
use crate::model::ChangeMetadata;

#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: Client,
    base_api: String, // e.g. "https://api.github.com"
    token: Option<String>,
}

impl GitHubClient {
    /// Constructs a GitHub client with a shared reqwest instance and an
    /// optional auth token (required for private repositories only).
    pub fn new(http: Client, base_api: String, token: Option<String>) -> Self {
        Self {
            http,
            base_api: base_api.trim_end_matches('/').to_string(),
            token,
        }
    }

    fn pull_url(&self, id: &ChangeRef) -> String {
        format!(
            "{}/repos/{}/pulls/{}",
            self.base_api, id.repository, id.pr_number
        )
    }

    fn get(&self, url: String, accept: &'static str) -> reqwest::RequestBuilder {
        let mut rb = self.http.get(url).header(ACCEPT, accept);
        if let Some(token) = &self.token {
            rb = rb.bearer_auth(token);
        }
        rb
    }

    /// Fetches PR metadata (title, author, head SHA, branches).
    pub async fn get_meta(&self, id: &ChangeRef) -> Result<ChangeMetadata, SourceError> {
        let resp: GitHubPull = self
            .get(self.pull_url(id), "application/vnd.github+json")
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(ChangeMetadata {
            repository: Some(id.repository.clone()),
            pr_number: Some(id.pr_number),
            title: Some(resp.title),
            author: resp.user.map(|u| u.login),
            head_commit_sha: Some(resp.head.sha),
            base_branch: Some(resp.base.branch),
            head_branch: Some(resp.head.branch),
        })
    }

    /// Fetches the full unified diff via GitHub's diff media type.
    pub async fn get_diff(&self, id: &ChangeRef) -> Result<String, SourceError> {
        let text = self
            .get(self.pull_url(id), "application/vnd.github.v3.diff")
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(text)
    }
}

/// --- GitHub response shapes (subset of fields we actually use) ---

#[derive(Debug, Deserialize)]
struct GitHubPull {
    title: String,
    #[serde(default)]
    user: Option<GitHubUser>,
    head: GitHubRef,
    base: GitHubRef,
}

#[derive(Debug, Deserialize)]
struct GitHubUser {
    login: String,
}

#[derive(Debug, Deserialize)]
struct GitHubRef {
    #[serde(rename = "ref")]
    branch: String,
    sha: String,
}
