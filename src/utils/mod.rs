//! Utilities module
//!
//! Contains error handling and client fingerprinting tools

pub mod error;
pub mod fingerprint;
