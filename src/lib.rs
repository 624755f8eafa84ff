//! AI Proxy Hub Library
//!
//! Routes chat, image and transcription requests to AI providers while
//! tracking per-client rate limits and usage totals

pub mod config;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod providers;
pub mod services;
pub mod usage;
pub mod utils;

// Re-export common types
pub use config::Settings;
pub use handlers::{create_router, AppState};
pub use providers::ProviderKind;
pub use services::{Dispatcher, FixedWindowLimiter, RateLimitStatus, RecaptchaVerifier};
pub use usage::{UsageEvent, UsageLedger, UsageRange, UsageTracker};
pub use utils::error::{AppError, AppResult};

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Library description
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Get version information
pub fn version_info() -> String {
    format!("{} v{} - {}", NAME, VERSION, DESCRIPTION)
}
