//! `GET /api/reviews/history` — filtered review history, newest first.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use tracing::instrument;

use pr_reviewer::ReviewQuery;
use pr_reviewer::model::{Category, Severity};

use crate::core::app_state::AppState;
use crate::core::http::response_envelope::error_response;
use crate::routes::reviews::review_response::ReviewResponse;

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    pub repository: Option<String>,
    pub pr_number: Option<u64>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    /// Minimum severity a review's findings must reach.
    pub severity: Option<String>,
    pub category: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[instrument(name = "history_route", skip(state))]
pub async fn history_route(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HistoryParams>,
) -> Response {
    let query = match build_query(params) {
        Ok(q) => q,
        Err(message) => {
            return error_response(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", message, None);
        }
    };

    match state.service.store().query(&query).await {
        Ok(results) => {
            let payload: Vec<ReviewResponse> = results.iter().map(ReviewResponse::from).collect();
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(e) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "STORAGE_ERROR",
            e.to_string(),
            None,
        ),
    }
}

fn build_query(params: HistoryParams) -> Result<ReviewQuery, String> {
    let min_severity = params
        .severity
        .as_deref()
        .map(|s| Severity::parse(s).ok_or_else(|| format!("unknown severity {s:?}")))
        .transpose()?;
    let category = params
        .category
        .as_deref()
        .map(|c| Category::parse(c).ok_or_else(|| format!("unknown category {c:?}")))
        .transpose()?;
    let start = params
        .start_date
        .as_deref()
        .map(parse_moment)
        .transpose()?;
    let end = params.end_date.as_deref().map(parse_moment).transpose()?;

    let defaults = ReviewQuery::default();
    Ok(ReviewQuery {
        repository: params.repository,
        pr_number: params.pr_number,
        start,
        end,
        min_severity,
        category,
        limit: params.limit.unwrap_or(defaults.limit),
        offset: params.offset.unwrap_or(defaults.offset),
    })
}

/// Accepts an RFC3339 timestamp or a plain `YYYY-MM-DD` date (midnight UTC).
fn parse_moment(value: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }
    Err(format!("invalid date {value:?}; expected RFC3339 or YYYY-MM-DD"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moments_parse_both_supported_shapes() {
        assert!(parse_moment("2026-07-01T12:30:00Z").is_ok());
        assert!(parse_moment("2026-07-01").is_ok());
        assert!(parse_moment("last tuesday").is_err());
    }

    #[test]
    fn unknown_filter_values_are_rejected() {
        let params = HistoryParams {
            repository: None,
            pr_number: None,
            start_date: None,
            end_date: None,
            severity: Some("catastrophic".into()),
            category: None,
            limit: None,
            offset: None,
        };
        assert!(build_query(params).is_err());
    }
}
