//! Fixed-window rate limiting
//!
//! Counts requests per client fingerprint inside a rolling fixed window.
//! The server count is authoritative; a client-reported call count can
//! only raise the effective usage, never lower it.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

/// Outcome of a rate limit check for one client
#[derive(Debug, Clone)]
pub struct RateLimitStatus {
    /// Maximum requests allowed per window
    pub limit: u32,
    /// Requests counted against the current window
    pub used: u32,
    /// Requests left before the limit trips
    pub remaining: u32,
    /// When the current window ends
    pub reset: DateTime<Utc>,
    /// Fingerprint the counts are keyed by
    pub fingerprint: String,
}

impl RateLimitStatus {
    /// Whether this request is over the limit
    pub fn exceeded(&self) -> bool {
        self.used > self.limit
    }
}

struct WindowState {
    count: u32,
    reset_at: DateTime<Utc>,
}

/// Per-fingerprint fixed-window request counter
pub struct FixedWindowLimiter {
    limit: u32,
    window: Duration,
    windows: Mutex<HashMap<String, WindowState>>,
}

impl FixedWindowLimiter {
    pub fn new(limit: u32, window_secs: u64) -> Self {
        Self {
            limit,
            window: Duration::seconds(window_secs as i64),
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Count one request against the fingerprint's window
    ///
    /// `reported_used` is the caller's own count of calls made before
    /// this one. The effective usage is the larger of the server count
    /// and the reported count plus one.
    pub fn register(&self, fingerprint: &str, reported_used: u32) -> RateLimitStatus {
        let now = Utc::now();
        let mut windows = self.windows.lock().unwrap_or_else(PoisonError::into_inner);

        let state = windows
            .entry(fingerprint.to_string())
            .or_insert_with(|| WindowState {
                count: 0,
                reset_at: now + self.window,
            });

        if now >= state.reset_at {
            state.count = 0;
            state.reset_at = now + self.window;
        }
        state.count += 1;

        let used = state.count.max(reported_used.saturating_add(1));
        self.status(fingerprint, used, state.reset_at)
    }

    /// Current window state without counting a request
    pub fn peek(&self, fingerprint: &str, reported_used: u32) -> RateLimitStatus {
        let now = Utc::now();
        let windows = self.windows.lock().unwrap_or_else(PoisonError::into_inner);

        let (count, reset_at) = match windows.get(fingerprint) {
            Some(state) if now < state.reset_at => (state.count, state.reset_at),
            _ => (0, now + self.window),
        };

        let used = count.max(reported_used);
        self.status(fingerprint, used, reset_at)
    }

    fn status(&self, fingerprint: &str, used: u32, reset: DateTime<Utc>) -> RateLimitStatus {
        RateLimitStatus {
            limit: self.limit,
            used,
            remaining: self.limit.saturating_sub(used),
            reset,
            fingerprint: fingerprint.to_string(),
        }
    }
}

/// Whether an address belongs to local development
///
/// Local clients are tracked but never blocked.
pub fn is_local_address(ip: &str) -> bool {
    ip == "::1" || ip == "127.0.0.1" || ip.starts_with("192.168.")
}
