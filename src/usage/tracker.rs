//! Usage tracking service
//!
//! Owns the in-memory ledger, loads it from the configured store on
//! startup and writes it back after every mutation.

use crate::usage::ledger::{UsageLedger, UsageRange};
use crate::usage::store::{Store, Subscriber};
use crate::usage::event::UsageEvent;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, warn};

/// Store key holding the serialized ledger
pub const STORAGE_KEY: &str = "smashingapps_usage_data";

/// Thread-safe usage tracker backed by a [`Store`]
pub struct UsageTracker {
    ledger: Mutex<UsageLedger>,
    store: Arc<dyn Store>,
    known_apps: Vec<String>,
}

impl UsageTracker {
    /// Load the ledger from the store, or start fresh if absent or corrupt
    pub fn new(store: Arc<dyn Store>, known_apps: Vec<String>) -> Self {
        let mut ledger = match store.get(STORAGE_KEY) {
            Some(raw) => match serde_json::from_str(&raw) {
                Ok(ledger) => ledger,
                Err(e) => {
                    warn!("Stored usage data is corrupt, starting fresh: {}", e);
                    UsageLedger::default()
                }
            },
            None => UsageLedger::default(),
        };
        ledger.ensure_known_apps(&known_apps);
        debug!(
            "📝 Usage tracker loaded: {} requests, {} history entries",
            ledger.total_requests,
            ledger.usage_history.len()
        );

        let tracker = Self {
            ledger: Mutex::new(ledger),
            store,
            known_apps,
        };
        tracker.persist(&tracker.snapshot());
        tracker
    }

    /// Record a usage event and return the updated ledger
    pub fn record(&self, event: UsageEvent) -> UsageLedger {
        let mut ledger = self.ledger.lock().unwrap_or_else(PoisonError::into_inner);
        ledger.record(event);
        let snapshot = ledger.clone();
        drop(ledger);

        self.persist(&snapshot);
        snapshot
    }

    /// Rebuild all aggregates from the history and persist the result
    pub fn recompute(&self) -> UsageLedger {
        let mut ledger = self.ledger.lock().unwrap_or_else(PoisonError::into_inner);
        ledger.recompute_from_history();
        ledger.ensure_known_apps(&self.known_apps);
        let snapshot = ledger.clone();
        drop(ledger);

        self.persist(&snapshot);
        snapshot
    }

    /// Current ledger snapshot
    pub fn snapshot(&self) -> UsageLedger {
        self.ledger
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Ledger view restricted to the given time window
    pub fn filtered(&self, range: UsageRange) -> UsageLedger {
        self.ledger
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .filtered(range)
    }

    /// Drop all usage data and persist the empty ledger
    pub fn clear(&self) -> UsageLedger {
        let mut ledger = self.ledger.lock().unwrap_or_else(PoisonError::into_inner);
        ledger.clear();
        ledger.ensure_known_apps(&self.known_apps);
        let snapshot = ledger.clone();
        drop(ledger);

        self.persist(&snapshot);
        snapshot
    }

    /// Register a callback invoked with the serialized ledger after each write
    pub fn watch(&self, subscriber: Subscriber) {
        self.store.subscribe(STORAGE_KEY, subscriber);
    }

    fn persist(&self, ledger: &UsageLedger) {
        match serde_json::to_string(ledger) {
            Ok(raw) => self.store.set(STORAGE_KEY, raw),
            Err(e) => warn!("Failed to serialize usage data: {}", e),
        }
    }
}
