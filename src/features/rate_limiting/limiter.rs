//! Sliding-window request limiter
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.2.0
//!
//! ## Changelog
//! - 1.0.0: Per-user sliding window over a concurrent map

use std::time::{Duration, Instant};

use dashmap::DashMap;
use log::warn;

const DEFAULT_MAX_REQUESTS: usize = 5;
const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

/// Tracks recent request instants per user and rejects bursts.
pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    requests: DashMap<u64, Vec<Instant>>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_REQUESTS, DEFAULT_WINDOW)
    }
}

impl RateLimiter {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            requests: DashMap::new(),
        }
    }

    /// Records a request for `user_id` and reports whether it is
    /// allowed. Instants older than the window are dropped first.
    pub fn check(&self, user_id: u64) -> bool {
        let now = Instant::now();
        let mut recent = self.requests.entry(user_id).or_default();
        recent.retain(|at| now.duration_since(*at) < self.window);
        if recent.len() >= self.max_requests {
            warn!("rate limit hit for user {user_id}");
            return false;
        }
        recent.push(now);
        true
    }
}
