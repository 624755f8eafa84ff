//! Usage tracking tests
//!
//! Exercise the tracker, ledger and stores together through the public API

use aiproxyhub::usage::{
    estimate_cost, FileStore, MemoryStore, Store, UsageEvent, UsageRange, UsageTracker,
    HISTORY_LIMIT, STORAGE_KEY,
};
use std::sync::Arc;

fn event(provider: &str, app: &str, model: &str, input: u64, output: u64) -> UsageEvent {
    UsageEvent::new(
        provider,
        app,
        model,
        input,
        output,
        estimate_cost(model, input, output),
    )
}

#[test]
fn test_tracker_aggregates_by_provider_and_app() {
    let tracker = UsageTracker::new(
        Arc::new(MemoryStore::new()),
        vec!["task-smasher".to_string(), "article-smasher".to_string()],
    );

    tracker.record(event("openai", "task-smasher", "gpt-4o", 100, 50));
    tracker.record(event("openai", "article-smasher", "gpt-4o-mini", 200, 80));
    let snapshot = tracker.record(event("anthropic", "task-smasher", "claude-3-5-sonnet", 300, 120));

    assert_eq!(snapshot.total_requests, 3);
    assert_eq!(snapshot.total_tokens, 850);
    assert_eq!(snapshot.total_input_tokens, 600);
    assert_eq!(snapshot.total_output_tokens, 250);

    assert_eq!(snapshot.requests_by_provider["openai"], 2);
    assert_eq!(snapshot.requests_by_provider["anthropic"], 1);
    assert_eq!(snapshot.tokens_by_provider["openai"], 430);
    assert_eq!(snapshot.input_tokens_by_provider["anthropic"], 300);

    assert_eq!(snapshot.requests_by_app["task-smasher"], 2);
    assert_eq!(snapshot.requests_by_app["article-smasher"], 1);
    assert_eq!(snapshot.output_tokens_by_app["task-smasher"], 170);

    let expected_cost = estimate_cost("gpt-4o", 100, 50)
        + estimate_cost("gpt-4o-mini", 200, 80)
        + estimate_cost("claude-3-5-sonnet", 300, 120);
    assert!((snapshot.cost_estimate - expected_cost).abs() < 1e-9);
}

#[test]
fn test_history_cap_applies_through_tracker() {
    let tracker = UsageTracker::new(Arc::new(MemoryStore::new()), Vec::new());

    for i in 0..(HISTORY_LIMIT + 10) {
        tracker.record(event("openai", "task-smasher", "gpt-4o", 10, 5).at(i as i64));
    }

    let snapshot = tracker.snapshot();
    assert_eq!(snapshot.usage_history.len(), HISTORY_LIMIT);
    assert_eq!(snapshot.usage_history[0].timestamp, 10);
    // Aggregates shrink with the history, so they describe what is retained
    assert_eq!(snapshot.total_requests, HISTORY_LIMIT as u64);
    assert_eq!(snapshot.total_tokens, 15 * HISTORY_LIMIT as u64);
}

#[test]
fn test_full_round_trip_through_file_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("usage.json");
    let apps = vec!["task-smasher".to_string()];

    {
        let tracker = UsageTracker::new(Arc::new(FileStore::open(&path)), apps.clone());
        tracker.record(event("openai", "task-smasher", "gpt-4o", 100, 50));
        tracker.record(event("google", "task-smasher", "gemini-1.5-pro", 60, 20));
    }

    let reloaded = UsageTracker::new(Arc::new(FileStore::open(&path)), apps);
    let snapshot = reloaded.snapshot();

    assert_eq!(snapshot.total_requests, 2);
    assert_eq!(snapshot.requests_by_provider["openai"], 1);
    assert_eq!(snapshot.requests_by_provider["google"], 1);
    assert_eq!(snapshot.usage_history.len(), 2);
    assert_eq!(snapshot.usage_history[1].model, "gemini-1.5-pro");

    // Reloading must not change what a recompute would produce
    let recomputed = reloaded.recompute();
    assert_eq!(recomputed.total_requests, 2);
    assert_eq!(recomputed.total_tokens, snapshot.total_tokens);
}

#[test]
fn test_persisted_shape_is_stable() {
    let store = Arc::new(MemoryStore::new());
    let tracker = UsageTracker::new(
        Arc::clone(&store) as Arc<dyn Store>,
        vec!["task-smasher".to_string()],
    );
    tracker.record(event("openai", "task-smasher", "gpt-4o", 100, 50));

    let raw = store.get(STORAGE_KEY).expect("ledger should be persisted");
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();

    assert_eq!(value["total_requests"], 1);
    assert_eq!(value["total_tokens"], 150);
    assert!(value["requests_by_provider"].is_object());
    assert!(value["requests_by_app"].is_object());
    assert!(value["usage_history"].is_array());
    assert_eq!(value["usage_history"][0]["provider"], "openai");
    assert_eq!(value["usage_history"][0]["requests"], 1);
    assert!(value["usage_history"][0]["timestamp"].is_number());
}

#[test]
fn test_partial_stored_data_loads_and_recomputes() {
    let store = Arc::new(MemoryStore::new());

    // A stored blob with stale totals and no aggregate maps
    store.set(
        STORAGE_KEY,
        serde_json::json!({
            "total_requests": 57,
            "usage_history": [{
                "timestamp": 1700000000000i64,
                "provider": "openai",
                "app": "task-smasher",
                "model": "gpt-3.5-turbo",
                "tokens": 250,
                "cost": 0.5
            }]
        })
        .to_string(),
    );

    let tracker = UsageTracker::new(
        Arc::clone(&store) as Arc<dyn Store>,
        vec!["task-smasher".to_string()],
    );
    assert_eq!(tracker.snapshot().total_requests, 57);

    let repaired = tracker.recompute();
    assert_eq!(repaired.total_requests, 1);
    assert_eq!(repaired.total_tokens, 250);
    assert_eq!(repaired.requests_by_provider["openai"], 1);
    assert_eq!(repaired.usage_history.len(), 1);
}

#[test]
fn test_clear_persists_empty_ledger() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("usage.json");
    let apps = vec!["task-smasher".to_string()];

    {
        let tracker = UsageTracker::new(Arc::new(FileStore::open(&path)), apps.clone());
        tracker.record(event("openai", "task-smasher", "gpt-4o", 100, 50));
        tracker.clear();
    }

    let reloaded = UsageTracker::new(Arc::new(FileStore::open(&path)), apps);
    let snapshot = reloaded.snapshot();

    assert_eq!(snapshot.total_requests, 0);
    assert!(snapshot.usage_history.is_empty());
    assert_eq!(snapshot.requests_by_app["task-smasher"], 0);
}

#[test]
fn test_filtered_windows_through_tracker() {
    let tracker = UsageTracker::new(Arc::new(MemoryStore::new()), Vec::new());
    let now = chrono::Utc::now().timestamp_millis();

    let day_ms = 24 * 60 * 60 * 1000;
    tracker.record(event("openai", "task-smasher", "gpt-4o", 10, 5).at(now - 40 * day_ms));
    tracker.record(event("openai", "task-smasher", "gpt-4o", 20, 10).at(now - 3 * day_ms));
    tracker.record(event("openai", "task-smasher", "gpt-4o", 30, 15).at(now - 60 * 1000));

    let day = tracker.filtered(UsageRange::Day);
    assert_eq!(day.total_requests, 1);
    assert_eq!(day.total_tokens, 45);

    let week = tracker.filtered(UsageRange::Week);
    assert_eq!(week.total_requests, 2);

    let month = tracker.filtered(UsageRange::Month);
    assert_eq!(month.total_requests, 2);

    let year = tracker.filtered(UsageRange::Year);
    assert_eq!(year.total_requests, 3);

    // Filtering never mutates the underlying ledger
    assert_eq!(tracker.snapshot().total_requests, 3);
}

#[test]
fn test_watch_observes_serialized_ledger() {
    let tracker = UsageTracker::new(Arc::new(MemoryStore::new()), Vec::new());
    let seen = Arc::new(std::sync::Mutex::new(Vec::new()));

    let seen_clone = Arc::clone(&seen);
    tracker.watch(Box::new(move |raw| {
        let value: serde_json::Value = serde_json::from_str(raw).unwrap();
        seen_clone
            .lock()
            .unwrap()
            .push(value["total_requests"].as_u64().unwrap());
    }));

    tracker.record(event("openai", "task-smasher", "gpt-4o", 10, 5));
    tracker.record(event("openai", "task-smasher", "gpt-4o", 10, 5));

    assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
}
