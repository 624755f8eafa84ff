//! Error handling module
//!
//! Defines error types and HTTP response mapping used across the service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    /// Request validation failed
    #[error("{0}")]
    Validation(String),

    /// HTTP method not supported on the endpoint
    #[error("Method not allowed")]
    MethodNotAllowed,

    /// Caller exhausted its request allowance for the current window
    #[error("Rate limit exceeded")]
    RateLimited {
        limit: u32,
        reset: chrono::DateTime<chrono::Utc>,
    },

    /// No API key available for the selected provider
    #[error("API key not configured")]
    MissingApiKey,

    /// Upstream provider did not answer within the request timeout
    #[error("The upstream provider did not respond in time")]
    UpstreamTimeout,

    /// Upstream provider returned an error
    #[error("{0}")]
    Upstream(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal server error
    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response body
///
/// Always carries a machine-readable `error` field; `message`, `type` and
/// `reset` are filled in depending on the error class
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Short error label
    pub error: String,
    /// Human readable description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Error classification (timeout / openai_error / unknown)
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    /// When the rate limit window resets (429 only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset: Option<String>,
}

impl AppError {
    /// Build an upstream error, routing timeout-shaped messages to the
    /// timeout variant so they map to 504
    pub fn upstream(message: impl Into<String>) -> Self {
        let message = message.into();
        if classify_error(&message) == "timeout" {
            AppError::UpstreamTimeout
        } else {
            AppError::Upstream(message)
        }
    }

    /// Get HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::UpstreamTimeout => StatusCode::GATEWAY_TIMEOUT,
            AppError::MissingApiKey
            | AppError::Upstream(_)
            | AppError::Serialization(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether detailed error information should be logged
    pub fn should_log_details(&self) -> bool {
        !matches!(
            self,
            AppError::Validation(_) | AppError::MethodNotAllowed | AppError::RateLimited { .. }
        )
    }

    /// Build the JSON body for this error
    pub fn to_body(&self) -> ErrorBody {
        match self {
            AppError::Validation(message) => ErrorBody {
                error: message.clone(),
                message: None,
                error_type: None,
                reset: None,
            },
            AppError::MethodNotAllowed => ErrorBody {
                error: "Method not allowed".to_string(),
                message: None,
                error_type: None,
                reset: None,
            },
            AppError::RateLimited { limit, reset } => ErrorBody {
                error: "Rate limit exceeded".to_string(),
                message: Some(format!(
                    "You have exceeded the rate limit of {} requests. Please try again after the limit resets.",
                    limit
                )),
                error_type: None,
                reset: Some(reset.to_rfc3339()),
            },
            AppError::MissingApiKey => ErrorBody {
                error: "API key not configured".to_string(),
                message: None,
                error_type: None,
                reset: None,
            },
            AppError::UpstreamTimeout => ErrorBody {
                error: "Gateway Timeout".to_string(),
                message: Some(self.to_string()),
                error_type: Some("timeout".to_string()),
                reset: None,
            },
            AppError::Upstream(message) => ErrorBody {
                error: "Internal server error".to_string(),
                message: Some(message.clone()),
                error_type: Some(classify_error(message).to_string()),
                reset: None,
            },
            AppError::Serialization(err) => ErrorBody {
                error: "Internal server error".to_string(),
                message: Some(err.to_string()),
                error_type: Some("unknown".to_string()),
                reset: None,
            },
            AppError::Internal(message) => ErrorBody {
                error: "Internal server error".to_string(),
                message: Some(message.clone()),
                error_type: Some("unknown".to_string()),
                reset: None,
            },
        }
    }
}

/// Classify an upstream error message
///
/// Timeout-shaped messages map to "timeout", messages mentioning the
/// OpenAI API map to "openai_error", everything else is "unknown"
pub fn classify_error(message: &str) -> &'static str {
    if message.contains("timeout")
        || message.contains("timed out")
        || message.contains("ETIMEDOUT")
        || message.contains("ECONNABORTED")
    {
        "timeout"
    } else if message.contains("OpenAI") {
        "openai_error"
    } else {
        "unknown"
    }
}

/// Implement IntoResponse so errors can be returned directly from handlers
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Log error
        if self.should_log_details() {
            tracing::error!("Application error: {} - Status code: {}", self, status);
        } else {
            tracing::warn!("Client error: {} - Status code: {}", self, status);
        }

        (status, Json(self.to_body())).into_response()
    }
}

/// Map reqwest failures onto the error taxonomy, keeping timeouts separate
impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AppError::UpstreamTimeout
        } else {
            AppError::upstream(err.to_string())
        }
    }
}

/// Result type alias
pub type AppResult<T> = Result<T, AppError>;
