//! Runtime configuration, loaded strictly from environment variables.
//!
//! | Variable                | Meaning                          | Default                  |
//! |-------------------------|----------------------------------|--------------------------|
//! | `API_HOST`              | bind address                     | `0.0.0.0`                |
//! | `API_PORT`              | bind port                        | `8080`                   |
//! | `DATABASE_URL`          | sqlx connection URL              | `sqlite://reviews.db`    |
//! | `GITHUB_API_BASE`       | provider API base                | `https://api.github.com` |
//! | `GITHUB_TOKEN`          | provider token (private repos)   | unset                    |
//! | `RATE_LIMIT_PER_MINUTE` | per-origin quota                 | `10`                     |
//! | `ANALYZER_TIMEOUT_SECS` | per-analyzer deadline            | `300`                    |
//! | `REVIEW_TIMEOUT_SECS`   | review-level deadline (0 = off)  | `600`                    |
//! | `MAX_FILES_PER_REVIEW`  | input limit                      | `50`                     |
//! | `MAX_DIFF_LINES`        | input limit                      | `10000`                  |
//!
//! LLM settings (`LLM_PROVIDER`, `LLM_MODEL`, ...) are read by
//! `llm_gateway::config::default_config`.

use std::time::Duration;

use llm_gateway::error_handler::{ConfigError, ConfigResult, env_opt, env_opt_u32, env_opt_u64};
use pr_reviewer::ServiceLimits;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub github_base_api: String,
    pub github_token: Option<String>,
    pub rate_limit_per_minute: u32,
    pub limits: ServiceLimits,
}

impl AppConfig {
    pub fn from_env() -> ConfigResult<Self> {
        let port = match env_opt_u32("API_PORT")? {
            Some(p) => u16::try_from(p).map_err(|_| ConfigError::InvalidNumber {
                var: "API_PORT",
                reason: "expected u16",
            })?,
            None => 8080,
        };

        let mut limits = ServiceLimits::default();
        if let Some(secs) = env_opt_u64("ANALYZER_TIMEOUT_SECS")? {
            limits.analyzer_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = env_opt_u64("REVIEW_TIMEOUT_SECS")? {
            limits.review_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }
        if let Some(n) = env_opt_u32("MAX_FILES_PER_REVIEW")? {
            limits.max_files_per_review = n as usize;
        }
        if let Some(n) = env_opt_u32("MAX_DIFF_LINES")? {
            limits.max_diff_lines = n as usize;
        }

        Ok(Self {
            host: env_opt("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            database_url: env_opt("DATABASE_URL").unwrap_or_else(|| "sqlite://reviews.db".to_string()),
            github_base_api: env_opt("GITHUB_API_BASE")
                .unwrap_or_else(|| "https://api.github.com".to_string()),
            github_token: env_opt("GITHUB_TOKEN"),
            rate_limit_per_minute: env_opt_u32("RATE_LIMIT_PER_MINUTE")?.unwrap_or(10),
            limits,
        })
    }
}
