//! Core services
//!
//! Rate limiting, abuse verification and provider dispatch.

pub mod dispatcher;
pub mod rate_limit;
pub mod recaptcha;

pub use dispatcher::Dispatcher;
pub use rate_limit::{is_local_address, FixedWindowLimiter, RateLimitStatus};
pub use recaptcha::RecaptchaVerifier;
