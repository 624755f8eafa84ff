//! Anthropic provider adapter
//!
//! Sends Messages API requests and reshapes the answers into the
//! normalized chat format

use super::{build_http_client, ProviderAdapter};
use crate::models::anthropic::{AnthropicRequest, AnthropicResponse};
use crate::models::chat::{ChatRequest, ChatResponse};
use crate::utils::error::{AppError, AppResult};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, error};

/// API version header required by Anthropic
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic adapter
#[derive(Debug, Clone)]
pub struct AnthropicAdapter {
    client: Client,
    base_url: String,
}

/// Anthropic error response envelope
#[derive(Debug, Deserialize)]
struct AnthropicErrorResponse {
    error: AnthropicErrorDetail,
}

/// Anthropic error detail
#[derive(Debug, Deserialize)]
struct AnthropicErrorDetail {
    message: String,
}

impl AnthropicAdapter {
    /// Create a new adapter
    pub fn new(base_url: impl Into<String>, timeout_secs: u64) -> AppResult<Self> {
        Ok(Self {
            client: build_http_client(timeout_secs)?,
            base_url: base_url.into(),
        })
    }

    /// Build the request URL
    fn build_url(&self) -> String {
        format!("{}/v1/messages", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl ProviderAdapter for AnthropicAdapter {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    async fn chat(&self, request: &ChatRequest, api_key: &str) -> AppResult<ChatResponse> {
        debug!("Sending Anthropic messages request");

        let anthropic_request = AnthropicRequest::from_chat_request(request);

        let response = self
            .client
            .post(self.build_url())
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .json(&anthropic_request)
            .send()
            .await?;

        if response.status().is_success() {
            let anthropic_response: AnthropicResponse = response.json().await?;
            debug!("Anthropic request completed successfully");
            Ok(anthropic_response.into_chat_response(&request.model))
        } else {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();

            if let Ok(parsed) = serde_json::from_str::<AnthropicErrorResponse>(&error_text) {
                error!("Anthropic API error: {}", parsed.error.message);
                Err(AppError::upstream(format!(
                    "Anthropic API error: {}",
                    parsed.error.message
                )))
            } else {
                error!("Anthropic API request failed: {} - {}", status, error_text);
                Err(AppError::upstream(format!(
                    "Anthropic API request failed: {} - {}",
                    status, error_text
                )))
            }
        }
    }
}
