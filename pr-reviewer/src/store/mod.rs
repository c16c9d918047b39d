//! SQLite-backed review store.
//!
//! Two relations:
//! - `reviews`  keyed by `review_id`, holding metadata + config + summary
//!   (JSON text columns) plus denormalized `repository`/`pr_number`/
//!   `created_at` for query filters;
//! - `findings` keyed by `(review_id, ordinal)` with a foreign key on
//!   `reviews`.
//!
//! Saving a review is atomic: one transaction writes the review row and
//! every finding, or nothing lands. `get(save(r))` returns the same
//! findings and summary.

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use std::str::FromStr;
use tracing::{debug, info};
use uuid::Uuid;

use crate::errors::StoreError;
use crate::model::{
    Category, ChangeMetadata, Finding, ReviewConfig, ReviewResult, ReviewSummary, Severity,
};

const SCHEMA: &str = "\
CREATE TABLE IF NOT EXISTS reviews (
    review_id  TEXT PRIMARY KEY,
    repository TEXT,
    pr_number  INTEGER,
    commit_sha TEXT,
    metadata   TEXT,
    config     TEXT NOT NULL,
    summary    TEXT NOT NULL,
    created_at TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS findings (
    review_id     TEXT NOT NULL REFERENCES reviews(review_id) ON DELETE CASCADE,
    ordinal       INTEGER NOT NULL,
    file_path     TEXT NOT NULL,
    line_number   INTEGER NOT NULL,
    severity      TEXT NOT NULL,
    severity_rank INTEGER NOT NULL,
    category      TEXT NOT NULL,
    description   TEXT NOT NULL,
    suggestion    TEXT,
    agent_source  TEXT NOT NULL,
    PRIMARY KEY (review_id, ordinal)
);
CREATE INDEX IF NOT EXISTS idx_reviews_repo_pr ON reviews(repository, pr_number);
CREATE INDEX IF NOT EXISTS idx_reviews_created ON reviews(created_at);
";

/// Filter set for [`ReviewStore::query`]. Results come back ordered by
/// `created_at` descending.
#[derive(Debug, Clone)]
pub struct ReviewQuery {
    pub repository: Option<String>,
    pub pr_number: Option<u64>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    /// Keep reviews containing at least one finding at or above this.
    pub min_severity: Option<Severity>,
    /// Keep reviews containing at least one finding of this category.
    pub category: Option<Category>,
    pub limit: u32,
    pub offset: u32,
}

impl Default for ReviewQuery {
    fn default() -> Self {
        Self {
            repository: None,
            pr_number: None,
            start: None,
            end: None,
            min_severity: None,
            category: None,
            limit: 20,
            offset: 0,
        }
    }
}

/// Thin repository over a SQLite pool.
#[derive(Debug, Clone)]
pub struct ReviewStore {
    pool: SqlitePool,
}

impl ReviewStore {
    /// Connects (creating the database file on demand) and applies the
    /// schema. In-memory databases get a single-connection pool so every
    /// operation sees the same data.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let max_connections = if database_url.contains("memory") { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        sqlx::raw_sql(SCHEMA).execute(&pool).await?;
        info!(url = %database_url, "review store ready");
        Ok(Self { pool })
    }

    /// One round trip to confirm the database answers.
    pub async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Persists one review atomically and returns its id.
    pub async fn save(&self, review: &ReviewResult) -> Result<Uuid, StoreError> {
        let mut tx = self.pool.begin().await?;

        let metadata_json = review
            .metadata
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let repository = review.metadata.as_ref().and_then(|m| m.repository.clone());
        let pr_number = review
            .metadata
            .as_ref()
            .and_then(|m| m.pr_number)
            .map(|n| n as i64);

        sqlx::query(
            "INSERT INTO reviews \
             (review_id, repository, pr_number, commit_sha, metadata, config, summary, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(review.review_id.to_string())
        .bind(repository)
        .bind(pr_number)
        .bind(review.commit_sha.clone())
        .bind(metadata_json)
        .bind(serde_json::to_string(&review.config)?)
        .bind(serde_json::to_string(&review.summary)?)
        .bind(review.timestamp)
        .execute(&mut *tx)
        .await?;

        for (ordinal, f) in review.findings.iter().enumerate() {
            sqlx::query(
                "INSERT INTO findings \
                 (review_id, ordinal, file_path, line_number, severity, severity_rank, \
                  category, description, suggestion, agent_source) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(review.review_id.to_string())
            .bind(ordinal as i64)
            .bind(&f.file_path)
            .bind(f.line_number as i64)
            .bind(f.severity.as_str())
            .bind(f.severity.rank())
            .bind(f.category.as_str())
            .bind(&f.description)
            .bind(f.suggestion.clone())
            .bind(f.agent_source.as_str())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        debug!(review_id = %review.review_id, findings = review.findings.len(), "review saved");
        Ok(review.review_id)
    }

    /// Loads one review with its findings; `Ok(None)` when absent.
    pub async fn get(&self, review_id: Uuid) -> Result<Option<ReviewResult>, StoreError> {
        let row = sqlx::query("SELECT * FROM reviews WHERE review_id = ?")
            .bind(review_id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        Ok(Some(self.hydrate(&row).await?))
    }

    /// Filtered history, ordered by `created_at` descending.
    pub async fn query(&self, q: &ReviewQuery) -> Result<Vec<ReviewResult>, StoreError> {
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT * FROM reviews WHERE 1=1");

        if let Some(repository) = &q.repository {
            builder.push(" AND repository = ").push_bind(repository.clone());
        }
        if let Some(pr_number) = q.pr_number {
            builder.push(" AND pr_number = ").push_bind(pr_number as i64);
        }
        if let Some(start) = q.start {
            builder.push(" AND created_at >= ").push_bind(start);
        }
        if let Some(end) = q.end {
            builder.push(" AND created_at <= ").push_bind(end);
        }
        if q.min_severity.is_some() || q.category.is_some() {
            builder.push(
                " AND EXISTS (SELECT 1 FROM findings f WHERE f.review_id = reviews.review_id",
            );
            if let Some(min_severity) = q.min_severity {
                builder
                    .push(" AND f.severity_rank >= ")
                    .push_bind(min_severity.rank());
            }
            if let Some(category) = q.category {
                builder.push(" AND f.category = ").push_bind(category.as_str());
            }
            builder.push(")");
        }
        builder.push(" ORDER BY created_at DESC LIMIT ");
        builder.push_bind(q.limit as i64);
        builder.push(" OFFSET ");
        builder.push_bind(q.offset as i64);

        let rows = builder.build().fetch_all(&self.pool).await?;
        let mut out = Vec::with_capacity(rows.len());
        for row in &rows {
            out.push(self.hydrate(row).await?);
        }
        Ok(out)
    }

    /// Every review of one pull request, newest first.
    pub async fn by_pr(&self, repository: &str, pr_number: u64) -> Result<Vec<ReviewResult>, StoreError> {
        let rows = sqlx::query(
            "SELECT * FROM reviews WHERE repository = ? AND pr_number = ? \
             ORDER BY created_at DESC",
        )
        .bind(repository)
        .bind(pr_number as i64)
        .fetch_all(&self.pool)
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in &rows {
            out.push(self.hydrate(row).await?);
        }
        Ok(out)
    }

    /// Rebuilds a `ReviewResult` from a `reviews` row plus its findings.
    async fn hydrate(&self, row: &SqliteRow) -> Result<ReviewResult, StoreError> {
        let id_text: String = row.try_get("review_id")?;
        let review_id = Uuid::parse_str(&id_text)
            .map_err(|e| StoreError::Invalid(format!("review id {id_text:?}: {e}")))?;

        let metadata: Option<ChangeMetadata> = row
            .try_get::<Option<String>, _>("metadata")?
            .map(|s| serde_json::from_str(&s))
            .transpose()?;
        let config: ReviewConfig = serde_json::from_str(&row.try_get::<String, _>("config")?)?;
        let summary: ReviewSummary = serde_json::from_str(&row.try_get::<String, _>("summary")?)?;

        let finding_rows = sqlx::query(
            "SELECT file_path, line_number, severity, category, description, suggestion, \
             agent_source FROM findings WHERE review_id = ? ORDER BY ordinal",
        )
        .bind(&id_text)
        .fetch_all(&self.pool)
        .await?;

        let mut findings = Vec::with_capacity(finding_rows.len());
        for f in &finding_rows {
            findings.push(finding_from_row(f)?);
        }

        Ok(ReviewResult {
            review_id,
            metadata,
            commit_sha: row.try_get("commit_sha")?,
            config,
            findings,
            summary,
            failures: Vec::new(),
            timestamp: row.try_get("created_at")?,
        })
    }
}

fn finding_from_row(row: &SqliteRow) -> Result<Finding, StoreError> {
    let severity_text: String = row.try_get("severity")?;
    let category_text: String = row.try_get("category")?;
    let agent_text: String = row.try_get("agent_source")?;

    let severity = Severity::parse(&severity_text)
        .ok_or_else(|| StoreError::Invalid(format!("severity {severity_text:?}")))?;
    let category = Category::parse(&category_text)
        .ok_or_else(|| StoreError::Invalid(format!("category {category_text:?}")))?;
    let agent_source = Category::parse(&agent_text)
        .ok_or_else(|| StoreError::Invalid(format!("agent_source {agent_text:?}")))?;

    Ok(Finding {
        file_path: row.try_get("file_path")?,
        line_number: row.try_get::<i64, _>("line_number")? as u32,
        severity,
        category,
        description: row.try_get("description")?,
        suggestion: row.try_get("suggestion")?,
        agent_source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn finding(path: &str, line: u32, severity: Severity) -> Finding {
        Finding {
            file_path: path.into(),
            line_number: line,
            severity,
            category: Category::Security,
            description: format!("issue at {path}:{line}"),
            suggestion: Some("fix it".into()),
            agent_source: Category::Security,
        }
    }

    fn review(repo: &str, pr: u64, findings: Vec<Finding>) -> ReviewResult {
        let summary = crate::aggregate::summarize(&Default::default(), &findings);
        ReviewResult {
            review_id: Uuid::new_v4(),
            metadata: Some(ChangeMetadata {
                repository: Some(repo.into()),
                pr_number: Some(pr),
                title: Some("a change".into()),
                ..ChangeMetadata::default()
            }),
            commit_sha: Some("abc123".into()),
            config: ReviewConfig::default(),
            findings,
            summary,
            failures: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    async fn store() -> ReviewStore {
        ReviewStore::connect("sqlite::memory:").await.unwrap()
    }

    #[tokio::test]
    async fn save_then_get_round_trips_findings_and_summary() {
        let store = store().await;
        let saved = review(
            "acme/widgets",
            5,
            vec![
                finding("a.py", 1, Severity::Critical),
                finding("a.py", 9, Severity::Low),
                finding("b.py", 3, Severity::Medium),
                finding("c.py", 7, Severity::High),
                finding("c.py", 8, Severity::High),
            ],
        );

        let id = store.save(&saved).await.unwrap();
        assert_eq!(id, saved.review_id);

        let loaded = store.get(id).await.unwrap().expect("review exists");
        assert_eq!(loaded.review_id, saved.review_id);
        assert_eq!(loaded.findings, saved.findings);
        assert_eq!(loaded.summary, saved.summary);
        assert_eq!(loaded.config, saved.config);
        assert_eq!(loaded.metadata, saved.metadata);
        assert_eq!(loaded.commit_sha, saved.commit_sha);
    }

    #[tokio::test]
    async fn file_backed_database_is_created_on_demand() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("reviews.db").display());

        let store = ReviewStore::connect(&url).await.unwrap();
        let saved = review("acme/widgets", 1, vec![finding("a.py", 1, Severity::High)]);
        store.save(&saved).await.unwrap();
        drop(store);

        // Reconnect: the data outlives the pool.
        let store = ReviewStore::connect(&url).await.unwrap();
        let loaded = store.get(saved.review_id).await.unwrap().expect("persisted");
        assert_eq!(loaded.findings, saved.findings);
    }

    #[tokio::test]
    async fn get_missing_review_is_none() {
        let store = store().await;
        assert!(store.get(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn by_pr_returns_newest_first() {
        let store = store().await;
        let mut first = review("acme/widgets", 5, vec![]);
        first.timestamp = Utc::now() - Duration::minutes(10);
        let second = review("acme/widgets", 5, vec![]);
        let other = review("acme/other", 1, vec![]);

        store.save(&first).await.unwrap();
        store.save(&second).await.unwrap();
        store.save(&other).await.unwrap();

        let rows = store.by_pr("acme/widgets", 5).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].review_id, second.review_id);
        assert_eq!(rows[1].review_id, first.review_id);
    }

    #[tokio::test]
    async fn query_filters_by_severity_and_category() {
        let store = store().await;
        let critical = review("acme/widgets", 5, vec![finding("a.py", 1, Severity::Critical)]);
        let low_only = review("acme/widgets", 6, vec![finding("a.py", 1, Severity::Low)]);
        store.save(&critical).await.unwrap();
        store.save(&low_only).await.unwrap();

        let q = ReviewQuery {
            min_severity: Some(Severity::High),
            ..ReviewQuery::default()
        };
        let rows = store.query(&q).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].review_id, critical.review_id);

        let q = ReviewQuery {
            category: Some(Category::Logic),
            ..ReviewQuery::default()
        };
        assert!(store.query(&q).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn query_respects_repository_limit_and_offset() {
        let store = store().await;
        for i in 0..3u64 {
            let mut r = review("acme/widgets", i, vec![]);
            r.timestamp = Utc::now() - Duration::minutes(i as i64);
            store.save(&r).await.unwrap();
        }

        let q = ReviewQuery {
            repository: Some("acme/widgets".into()),
            limit: 2,
            offset: 1,
            ..ReviewQuery::default()
        };
        let rows = store.query(&q).await.unwrap();
        assert_eq!(rows.len(), 2);
        // Newest first, offset skipped the newest (pr_number 0).
        assert_eq!(rows[0].metadata.as_ref().unwrap().pr_number, Some(1));
        assert_eq!(rows[1].metadata.as_ref().unwrap().pr_number, Some(2));
    }
}
