//! Shared state for handlers.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::Serialize;
use uuid::Uuid;

use pr_reviewer::ReviewService;

use crate::middleware_layer::rate_limit::RateLimiter;

/// Lifecycle of one review as seen by the status endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    InProgress,
    Completed,
    Failed,
}

/// In-memory review-status registry. Reviews run inside the request, so a
/// status flips in_progress → completed/failed around the pipeline call.
#[derive(Clone, Default)]
pub struct StatusRegistry(Arc<Mutex<HashMap<Uuid, ReviewStatus>>>);

impl StatusRegistry {
    pub fn set(&self, review_id: Uuid, status: ReviewStatus) {
        self.0
            .lock()
            .expect("status registry poisoned")
            .insert(review_id, status);
    }

    pub fn get(&self, review_id: Uuid) -> Option<ReviewStatus> {
        self.0
            .lock()
            .expect("status registry poisoned")
            .get(&review_id)
            .copied()
    }
}

/// Shared application state behind every route.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ReviewService>,
    pub statuses: StatusRegistry,
    pub rate_limiter: Arc<RateLimiter>,
}
