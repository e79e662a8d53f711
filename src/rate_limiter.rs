//! Sliding-window rate limiter guarding outbound LLM calls.
//!
//! Admission timestamps are kept in a deque in non-decreasing order, so
//! evicting expired entries is a prefix pop. The evict-then-check-then-record
//! sequence runs as one critical section; concurrent checks cannot race over
//! the last open slot.

use parking_lot::Mutex;
use serde::Serialize;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::log_warn;

/// Environment variable overriding the admission capacity at construction
pub const MAX_REQUESTS_ENV: &str = "AI_SEARCH_MAX_REQUESTS_PER_HOUR";

/// Default admissions allowed per window
pub const DEFAULT_MAX_REQUESTS: usize = 60;

/// Default window length
pub const DEFAULT_TIME_WINDOW: Duration = Duration::from_secs(3600);

/// Snapshot of the limiter state returned by [`RateLimiter::get_status`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RateLimitStatus {
    pub requests_used: usize,
    pub requests_remaining: usize,
    pub max_requests: usize,
    pub time_window_seconds: u64,
    /// Seconds until the oldest retained admission drops out of the window;
    /// zero when the window is empty
    pub time_until_reset: u64,
}

/// Fixed-capacity sliding-window admission controller.
///
/// Construct once at process start and share by reference (`Arc`) across
/// request handlers.
pub struct RateLimiter {
    max_requests: usize,
    time_window: Duration,
    timestamps: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    /// Create a limiter with the given capacity and window
    pub fn new(max_requests: usize, time_window: Duration) -> Self {
        Self {
            max_requests,
            time_window,
            timestamps: Mutex::new(VecDeque::new()),
        }
    }

    /// Create a limiter, honoring the [`MAX_REQUESTS_ENV`] capacity override.
    ///
    /// Malformed overrides are ignored and the given capacity is kept.
    pub fn from_env(max_requests: usize, time_window: Duration) -> Self {
        let capacity = std::env::var(MAX_REQUESTS_ENV)
            .ok()
            .and_then(|raw| parse_capacity(&raw))
            .unwrap_or(max_requests);
        Self::new(capacity, time_window)
    }

    /// Admit and record a new request if the window has a free slot.
    ///
    /// Returns `false` without mutating the window when the limit is reached.
    pub fn can_make_request(&self) -> bool {
        self.admit_at(Instant::now())
    }

    /// Current limiter status
    pub fn get_status(&self) -> RateLimitStatus {
        self.status_at(Instant::now())
    }

    fn admit_at(&self, now: Instant) -> bool {
        let mut timestamps = self.timestamps.lock();
        Self::evict_expired(&mut timestamps, now, self.time_window);

        if timestamps.len() < self.max_requests {
            timestamps.push_back(now);
            true
        } else {
            false
        }
    }

    fn status_at(&self, now: Instant) -> RateLimitStatus {
        let mut timestamps = self.timestamps.lock();
        Self::evict_expired(&mut timestamps, now, self.time_window);

        let requests_used = timestamps.len();
        let time_until_reset = timestamps.front().map_or(0, |&oldest| {
            (oldest + self.time_window)
                .checked_duration_since(now)
                .unwrap_or_default()
                .as_secs()
        });

        RateLimitStatus {
            requests_used,
            requests_remaining: self.max_requests.saturating_sub(requests_used),
            max_requests: self.max_requests,
            time_window_seconds: self.time_window.as_secs(),
            time_until_reset,
        }
    }

    fn evict_expired(timestamps: &mut VecDeque<Instant>, now: Instant, window: Duration) {
        // Instants earlier than process start minus the window cannot exist,
        // so a failed checked_sub means nothing is evictable yet.
        let Some(cutoff) = now.checked_sub(window) else {
            return;
        };
        while timestamps.front().is_some_and(|&t| t < cutoff) {
            timestamps.pop_front();
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::from_env(DEFAULT_MAX_REQUESTS, DEFAULT_TIME_WINDOW)
    }
}

/// Parse a capacity override; `None` for anything that is not a positive integer
fn parse_capacity(raw: &str) -> Option<usize> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_digit()) {
        log_warn!("Ignoring malformed {MAX_REQUESTS_ENV} override: `{raw}`");
        return None;
    }
    match trimmed.parse::<usize>() {
        Ok(capacity) if capacity > 0 => Some(capacity),
        _ => {
            log_warn!("Ignoring malformed {MAX_REQUESTS_ENV} override: `{raw}`");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_admits_up_to_capacity() {
        let limiter = RateLimiter::new(3, Duration::from_secs(60));
        assert!(limiter.can_make_request());
        assert!(limiter.can_make_request());
        assert!(limiter.can_make_request());
        assert!(!limiter.can_make_request());
    }

    #[test]
    fn test_refusal_does_not_mutate_window() {
        let limiter = RateLimiter::new(2, Duration::from_secs(60));
        assert!(limiter.can_make_request());
        assert!(limiter.can_make_request());
        assert!(!limiter.can_make_request());
        assert!(!limiter.can_make_request());
        assert_eq!(limiter.get_status().requests_used, 2);
    }

    #[test]
    fn test_status_counts() {
        let limiter = RateLimiter::new(5, Duration::from_secs(3600));
        for _ in 0..3 {
            assert!(limiter.can_make_request());
        }
        let status = limiter.get_status();
        assert_eq!(status.requests_used, 3);
        assert_eq!(status.requests_remaining, 2);
        assert_eq!(status.max_requests, 5);
        assert_eq!(status.time_window_seconds, 3600);
        assert!(status.time_until_reset <= 3600);
    }

    #[test]
    fn test_window_eviction_frees_slots() {
        let limiter = RateLimiter::new(2, Duration::from_secs(10));
        let start = Instant::now();
        assert!(limiter.admit_at(start));
        assert!(limiter.admit_at(start + Duration::from_secs(1)));
        assert!(!limiter.admit_at(start + Duration::from_secs(2)));
        // The first admission expires 10s after `start`.
        assert!(limiter.admit_at(start + Duration::from_secs(11)));
        assert_eq!(
            limiter.status_at(start + Duration::from_secs(11)).requests_used,
            2
        );
    }

    #[test]
    fn test_empty_window_reset_is_zero() {
        let limiter = RateLimiter::new(4, Duration::from_secs(30));
        assert_eq!(limiter.get_status().time_until_reset, 0);
    }

    #[test]
    fn test_reset_tracks_oldest_timestamp() {
        let limiter = RateLimiter::new(4, Duration::from_secs(30));
        let start = Instant::now();
        assert!(limiter.admit_at(start));
        let status = limiter.status_at(start + Duration::from_secs(10));
        assert_eq!(status.time_until_reset, 20);
    }

    #[test]
    fn test_concurrent_admissions_respect_capacity() {
        let limiter = Arc::new(RateLimiter::new(50, Duration::from_secs(3600)));
        let mut handles = Vec::new();
        for _ in 0..8 {
            let limiter = Arc::clone(&limiter);
            handles.push(std::thread::spawn(move || {
                let mut admitted = 0_usize;
                for _ in 0..100 {
                    if limiter.can_make_request() {
                        admitted += 1;
                    }
                }
                admitted
            }));
        }
        let total: usize = handles
            .into_iter()
            .map(|h| h.join().expect("thread panicked"))
            .sum();
        assert_eq!(total, 50);
    }

    #[test]
    fn test_capacity_override_parsing() {
        assert_eq!(parse_capacity("120"), Some(120));
        assert_eq!(parse_capacity(" 30 "), Some(30));
        assert_eq!(parse_capacity("0"), None);
        assert_eq!(parse_capacity("-5"), None);
        assert_eq!(parse_capacity("+5"), None);
        assert_eq!(parse_capacity("sixty"), None);
        assert_eq!(parse_capacity(""), None);
    }
}
