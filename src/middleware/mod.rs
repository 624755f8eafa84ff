//! HTTP middleware module
//!
//! Request logging and client address extraction

pub mod logging;

pub use logging::{get_client_ip, request_logging_middleware};
