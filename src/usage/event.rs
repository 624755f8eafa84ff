//! Usage event model
//!
//! One immutable record per proxied request; the ledger aggregates are
//! always derived from these

use serde::{Deserialize, Serialize};

/// A single recorded API request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageEvent {
    /// When the request happened (unix milliseconds)
    pub timestamp: i64,
    /// Provider that served the request
    pub provider: String,
    /// Application that issued the request
    pub app: String,
    /// Model used
    pub model: String,
    /// Request count, always 1 per event
    #[serde(default = "default_requests")]
    pub requests: u64,
    /// Total tokens consumed
    pub tokens: u64,
    /// Input token count
    #[serde(default)]
    pub input_tokens: u64,
    /// Output token count
    #[serde(default)]
    pub output_tokens: u64,
    /// Estimated cost in dollars
    pub cost: f64,
}

fn default_requests() -> u64 {
    1
}

impl UsageEvent {
    /// Create an event stamped with the current time
    pub fn new(
        provider: impl Into<String>,
        app: impl Into<String>,
        model: impl Into<String>,
        input_tokens: u64,
        output_tokens: u64,
        cost: f64,
    ) -> Self {
        Self {
            timestamp: chrono::Utc::now().timestamp_millis(),
            provider: provider.into(),
            app: app.into(),
            model: model.into(),
            requests: 1,
            tokens: input_tokens + output_tokens,
            input_tokens,
            output_tokens,
            cost,
        }
    }

    /// Same event with an explicit timestamp, for replay and tests
    pub fn at(mut self, timestamp: i64) -> Self {
        self.timestamp = timestamp;
        self
    }
}
