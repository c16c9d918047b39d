//! Per-origin request quota (fixed one-minute window).
//!
//! Origins are client IPs from the connection info. The window state is a
//! plain mutex-guarded map; entries reset when their window expires.

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use tracing::warn;

use crate::core::app_state::AppState;
use crate::core::http::response_envelope::error_response;

const WINDOW: Duration = Duration::from_secs(60);

/// Fixed-window counter per client IP.
pub struct RateLimiter {
    per_minute: u32,
    windows: Mutex<HashMap<IpAddr, (Instant, u32)>>,
}

impl RateLimiter {
    pub fn new(per_minute: u32) -> Self {
        Self {
            per_minute,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Counts one request from `ip`; false when the quota is exhausted.
    pub fn allow(&self, ip: IpAddr) -> bool {
        let now = Instant::now();
        let mut windows = self.windows.lock().expect("rate limiter poisoned");
        let (window_start, count) = windows.entry(ip).or_insert((now, 0));
        if now.duration_since(*window_start) >= WINDOW {
            *window_start = now;
            *count = 0;
        }
        *count += 1;
        *count <= self.per_minute
    }
}

/// Axum middleware enforcing the quota on every API route.
pub async fn rate_limit(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Response {
    if !state.rate_limiter.allow(addr.ip()) {
        warn!(origin = %addr.ip(), "per-origin request quota exceeded");
        return error_response(
            StatusCode::TOO_MANY_REQUESTS,
            "RATE_LIMITED",
            "per-origin request quota exceeded; retry later",
            None,
        );
    }
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quota_exhausts_within_one_window() {
        let limiter = RateLimiter::new(3);
        let ip: IpAddr = "10.0.0.1".parse().unwrap();
        assert!(limiter.allow(ip));
        assert!(limiter.allow(ip));
        assert!(limiter.allow(ip));
        assert!(!limiter.allow(ip));
    }

    #[test]
    fn origins_are_tracked_independently() {
        let limiter = RateLimiter::new(1);
        let a: IpAddr = "10.0.0.1".parse().unwrap();
        let b: IpAddr = "10.0.0.2".parse().unwrap();
        assert!(limiter.allow(a));
        assert!(!limiter.allow(a));
        assert!(limiter.allow(b));
    }
}
