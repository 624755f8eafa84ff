//! Usage tracking
//!
//! Event history, aggregates, cost estimation and persistence.

pub mod event;
pub mod ledger;
pub mod pricing;
pub mod store;
pub mod tracker;

pub use event::UsageEvent;
pub use ledger::{UsageLedger, UsageRange, HISTORY_LIMIT};
pub use pricing::{estimate_cost, DEFAULT_RATE_PER_MILLION};
pub use store::{FileStore, MemoryStore, Store, Subscriber};
pub use tracker::{UsageTracker, STORAGE_KEY};
