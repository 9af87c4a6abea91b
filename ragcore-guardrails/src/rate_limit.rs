//! ABOUTME: Sliding-window request rate limiter, process-wide and in-memory

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::collections::VecDeque;

/// Per-key sliding-window counter. Shared, eventually-consistent across
/// workers within one process; lifecycle is tied to process start/stop.
pub struct RateLimiter {
    window: DashMap<String, VecDeque<DateTime<Utc>>>,
    max_per_minute: u32,
}

impl RateLimiter {
    #[must_use]
    pub fn new(max_per_minute: u32) -> Self {
        Self { window: DashMap::new(), max_per_minute }
    }

    /// Records one request for `key` and reports whether it is within the
    /// per-minute limit. Entries older than 60s are pruned on each call.
    pub fn check(&self, key: &str) -> bool {
        let now = Utc::now();
        let cutoff = now - Duration::seconds(60);
        let mut timestamps = self.window.entry(key.to_string()).or_default();

        while timestamps.front().is_some_and(|t| *t < cutoff) {
            timestamps.pop_front();
        }

        if timestamps.len() >= self.max_per_minute as usize {
            return false;
        }

        timestamps.push_back(now);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_requests_under_the_limit() {
        let limiter = RateLimiter::new(3);
        assert!(limiter.check("user-1"));
        assert!(limiter.check("user-1"));
        assert!(limiter.check("user-1"));
        assert!(!limiter.check("user-1"));
    }

    #[test]
    fn tracks_keys_independently() {
        let limiter = RateLimiter::new(1);
        assert!(limiter.check("user-1"));
        assert!(limiter.check("user-2"));
        assert!(!limiter.check("user-1"));
    }
}
