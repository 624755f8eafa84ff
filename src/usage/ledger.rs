//! Usage ledger
//!
//! Append-only history of usage events plus aggregate counters. The
//! aggregates are always exactly the fold of the retained history; when
//! old events age out of the window the fold shrinks with them.

use crate::usage::event::UsageEvent;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Maximum number of history entries retained
pub const HISTORY_LIMIT: usize = 1000;

/// Time window for filtered ledger views
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageRange {
    Day,
    Week,
    Month,
    Year,
}

impl UsageRange {
    /// Window length in milliseconds
    pub fn window_millis(&self) -> i64 {
        match self {
            UsageRange::Day => 24 * 60 * 60 * 1000,
            UsageRange::Week => 7 * 24 * 60 * 60 * 1000,
            UsageRange::Month => 30 * 24 * 60 * 60 * 1000,
            UsageRange::Year => 365 * 24 * 60 * 60 * 1000,
        }
    }
}

impl std::str::FromStr for UsageRange {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "day" => Ok(UsageRange::Day),
            "week" => Ok(UsageRange::Week),
            "month" => Ok(UsageRange::Month),
            "year" => Ok(UsageRange::Year),
            other => Err(format!(
                "Invalid range '{}'. Expected day, week, month or year.",
                other
            )),
        }
    }
}

/// Aggregated usage data
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UsageLedger {
    /// Total request count
    pub total_requests: u64,
    /// Total tokens consumed
    pub total_tokens: u64,
    /// Total input tokens
    pub total_input_tokens: u64,
    /// Total output tokens
    pub total_output_tokens: u64,
    /// Estimated total cost in dollars
    pub cost_estimate: f64,
    /// Request count per provider
    pub requests_by_provider: HashMap<String, u64>,
    /// Token count per provider
    pub tokens_by_provider: HashMap<String, u64>,
    /// Input token count per provider
    pub input_tokens_by_provider: HashMap<String, u64>,
    /// Output token count per provider
    pub output_tokens_by_provider: HashMap<String, u64>,
    /// Cost per provider
    pub cost_by_provider: HashMap<String, f64>,
    /// Request count per application
    pub requests_by_app: HashMap<String, u64>,
    /// Token count per application
    pub tokens_by_app: HashMap<String, u64>,
    /// Input token count per application
    pub input_tokens_by_app: HashMap<String, u64>,
    /// Output token count per application
    pub output_tokens_by_app: HashMap<String, u64>,
    /// Cost per application
    pub cost_by_app: HashMap<String, f64>,
    /// Event history, newest last
    pub usage_history: Vec<UsageEvent>,
}

impl UsageLedger {
    /// Record a single event
    ///
    /// Appends to history and folds the event into every aggregate in the
    /// same step. Events older than the retention window fall off the
    /// front and leave the aggregates with them.
    pub fn record(&mut self, event: UsageEvent) {
        self.apply(&event);
        self.usage_history.push(event);

        if self.usage_history.len() > HISTORY_LIMIT {
            let excess = self.usage_history.len() - HISTORY_LIMIT;
            let dropped: Vec<UsageEvent> = self.usage_history.drain(..excess).collect();
            for event in &dropped {
                self.unapply(event);
            }
        }
    }

    /// Rebuild every aggregate from the history alone
    ///
    /// Repairs any drift between counters and events. Running it twice in
    /// a row changes nothing.
    pub fn recompute_from_history(&mut self) {
        let history = std::mem::take(&mut self.usage_history);
        *self = UsageLedger::default();

        for event in &history {
            self.apply(event);
        }
        self.usage_history = history;
    }

    /// Zero-initialize per-app entries for the given application IDs
    ///
    /// Dashboards then show known apps even before their first request.
    /// Existing values and the history are left untouched.
    pub fn ensure_known_apps(&mut self, apps: &[String]) {
        for app in apps {
            self.requests_by_app.entry(app.clone()).or_insert(0);
            self.tokens_by_app.entry(app.clone()).or_insert(0);
            self.input_tokens_by_app.entry(app.clone()).or_insert(0);
            self.output_tokens_by_app.entry(app.clone()).or_insert(0);
            self.cost_by_app.entry(app.clone()).or_insert(0.0);
        }
    }

    /// Build a ledger covering only the events inside the given window
    pub fn filtered(&self, range: UsageRange) -> UsageLedger {
        let cutoff = chrono::Utc::now().timestamp_millis() - range.window_millis();

        let mut filtered = UsageLedger::default();
        for event in &self.usage_history {
            if event.timestamp >= cutoff {
                filtered.apply(event);
                filtered.usage_history.push(event.clone());
            }
        }
        filtered
    }

    /// Reset to the empty ledger
    pub fn clear(&mut self) {
        *self = UsageLedger::default();
    }

    /// Fold one event into the aggregates
    fn apply(&mut self, event: &UsageEvent) {
        self.total_requests += event.requests;
        self.total_tokens += event.tokens;
        self.total_input_tokens += event.input_tokens;
        self.total_output_tokens += event.output_tokens;
        self.cost_estimate += event.cost;

        *self
            .requests_by_provider
            .entry(event.provider.clone())
            .or_insert(0) += event.requests;
        *self
            .tokens_by_provider
            .entry(event.provider.clone())
            .or_insert(0) += event.tokens;
        *self
            .input_tokens_by_provider
            .entry(event.provider.clone())
            .or_insert(0) += event.input_tokens;
        *self
            .output_tokens_by_provider
            .entry(event.provider.clone())
            .or_insert(0) += event.output_tokens;
        *self
            .cost_by_provider
            .entry(event.provider.clone())
            .or_insert(0.0) += event.cost;

        *self.requests_by_app.entry(event.app.clone()).or_insert(0) += event.requests;
        *self.tokens_by_app.entry(event.app.clone()).or_insert(0) += event.tokens;
        *self
            .input_tokens_by_app
            .entry(event.app.clone())
            .or_insert(0) += event.input_tokens;
        *self
            .output_tokens_by_app
            .entry(event.app.clone())
            .or_insert(0) += event.output_tokens;
        *self.cost_by_app.entry(event.app.clone()).or_insert(0.0) += event.cost;
    }

    /// Remove one event's contribution from the aggregates
    fn unapply(&mut self, event: &UsageEvent) {
        self.total_requests = self.total_requests.saturating_sub(event.requests);
        self.total_tokens = self.total_tokens.saturating_sub(event.tokens);
        self.total_input_tokens = self.total_input_tokens.saturating_sub(event.input_tokens);
        self.total_output_tokens = self.total_output_tokens.saturating_sub(event.output_tokens);
        self.cost_estimate = (self.cost_estimate - event.cost).max(0.0);

        sub_count(&mut self.requests_by_provider, &event.provider, event.requests);
        sub_count(&mut self.tokens_by_provider, &event.provider, event.tokens);
        sub_count(
            &mut self.input_tokens_by_provider,
            &event.provider,
            event.input_tokens,
        );
        sub_count(
            &mut self.output_tokens_by_provider,
            &event.provider,
            event.output_tokens,
        );
        sub_cost(&mut self.cost_by_provider, &event.provider, event.cost);

        sub_count(&mut self.requests_by_app, &event.app, event.requests);
        sub_count(&mut self.tokens_by_app, &event.app, event.tokens);
        sub_count(&mut self.input_tokens_by_app, &event.app, event.input_tokens);
        sub_count(
            &mut self.output_tokens_by_app,
            &event.app,
            event.output_tokens,
        );
        sub_cost(&mut self.cost_by_app, &event.app, event.cost);
    }
}

fn sub_count(map: &mut HashMap<String, u64>, key: &str, amount: u64) {
    if let Some(value) = map.get_mut(key) {
        *value = value.saturating_sub(amount);
    }
}

fn sub_cost(map: &mut HashMap<String, f64>, key: &str, amount: f64) {
    if let Some(value) = map.get_mut(key) {
        *value = (*value - amount).max(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(provider: &str, app: &str, input: u64, output: u64, cost: f64) -> UsageEvent {
        UsageEvent::new(provider, app, "gpt-4o", input, output, cost)
    }

    #[test]
    fn test_record_updates_all_aggregates() {
        let mut ledger = UsageLedger::default();
        ledger.record(event("openai", "task-smasher", 100, 50, 0.01));
        ledger.record(event("anthropic", "article-smasher", 200, 80, 0.02));

        assert_eq!(ledger.total_requests, 2);
        assert_eq!(ledger.total_tokens, 430);
        assert_eq!(ledger.total_input_tokens, 300);
        assert_eq!(ledger.total_output_tokens, 130);
        assert!((ledger.cost_estimate - 0.03).abs() < 1e-9);

        assert_eq!(ledger.requests_by_provider["openai"], 1);
        assert_eq!(ledger.tokens_by_provider["anthropic"], 280);
        assert_eq!(ledger.requests_by_app["task-smasher"], 1);
        assert_eq!(ledger.input_tokens_by_app["article-smasher"], 200);
        assert_eq!(ledger.usage_history.len(), 2);
    }

    #[test]
    fn test_recompute_is_idempotent() {
        let mut ledger = UsageLedger::default();
        for i in 0..20 {
            ledger.record(event("openai", "task-smasher", i * 10, i * 3, 0.001));
        }

        let mut once = ledger.clone();
        once.recompute_from_history();
        let mut twice = once.clone();
        twice.recompute_from_history();

        assert_eq!(once, twice);
    }

    #[test]
    fn test_record_matches_recompute() {
        let mut ledger = UsageLedger::default();
        ledger.record(event("openai", "task-smasher", 100, 20, 0.01));
        ledger.record(event("google", "task-smasher", 50, 10, 0.002));
        ledger.record(event("openrouter", "article-smasher", 70, 30, 0.005));

        let mut recomputed = ledger.clone();
        recomputed.recompute_from_history();

        assert_eq!(ledger, recomputed);
    }

    #[test]
    fn test_history_cap_keeps_fold_exact() {
        // 0.25 is exact in binary, so the incremental fold and the refold
        // agree bit for bit
        let mut ledger = UsageLedger::default();
        for i in 0..(HISTORY_LIMIT + 5) {
            ledger.record(event("openai", "task-smasher", 10, 5, 0.25).at(i as i64));
        }

        assert_eq!(ledger.usage_history.len(), HISTORY_LIMIT);
        assert_eq!(ledger.usage_history[0].timestamp, 5);

        // Aggregates must still equal the fold of what remains
        let mut recomputed = ledger.clone();
        recomputed.recompute_from_history();
        assert_eq!(ledger, recomputed);
        assert_eq!(ledger.total_requests, HISTORY_LIMIT as u64);
    }

    #[test]
    fn test_ensure_known_apps_zero_initializes() {
        let mut ledger = UsageLedger::default();
        ledger.ensure_known_apps(&["task-smasher".to_string(), "article-smasher".to_string()]);

        for app in ["task-smasher", "article-smasher"] {
            assert_eq!(ledger.requests_by_app[app], 0);
            assert_eq!(ledger.tokens_by_app[app], 0);
            assert_eq!(ledger.input_tokens_by_app[app], 0);
            assert_eq!(ledger.output_tokens_by_app[app], 0);
            assert_eq!(ledger.cost_by_app[app], 0.0);
        }
        assert!(ledger.usage_history.is_empty());
        assert_eq!(ledger.total_requests, 0);
    }

    #[test]
    fn test_ensure_known_apps_preserves_existing_values() {
        let mut ledger = UsageLedger::default();
        ledger.record(event("openai", "task-smasher", 100, 50, 0.01));
        ledger.ensure_known_apps(&["task-smasher".to_string()]);

        assert_eq!(ledger.requests_by_app["task-smasher"], 1);
    }

    #[test]
    fn test_filtered_drops_old_events() {
        let now = chrono::Utc::now().timestamp_millis();
        let mut ledger = UsageLedger::default();
        ledger.record(event("openai", "task-smasher", 10, 5, 0.001).at(now - 2 * 24 * 60 * 60 * 1000));
        ledger.record(event("openai", "task-smasher", 20, 10, 0.002).at(now - 60 * 1000));

        let day = ledger.filtered(UsageRange::Day);
        assert_eq!(day.total_requests, 1);
        assert_eq!(day.total_tokens, 30);
        assert_eq!(day.usage_history.len(), 1);

        let week = ledger.filtered(UsageRange::Week);
        assert_eq!(week.total_requests, 2);
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut ledger = UsageLedger::default();
        ledger.record(event("openai", "task-smasher", 10, 5, 0.001));
        ledger.clear();

        assert_eq!(ledger, UsageLedger::default());
    }

    #[test]
    fn test_range_parsing() {
        assert_eq!("day".parse::<UsageRange>().unwrap(), UsageRange::Day);
        assert_eq!("year".parse::<UsageRange>().unwrap(), UsageRange::Year);
        assert!("fortnight".parse::<UsageRange>().is_err());
    }
}
