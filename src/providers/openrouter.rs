//! OpenRouter provider adapter
//!
//! OpenAI-compatible API behind an alternate base URL; OpenRouter expects
//! an HTTP-Referer identifying the calling application

use super::{build_http_client, ProviderAdapter};
use crate::models::chat::{ChatRequest, ChatResponse};
use crate::utils::error::{AppError, AppResult};
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, error};

/// OpenRouter adapter
#[derive(Debug, Clone)]
pub struct OpenRouterAdapter {
    client: Client,
    base_url: String,
    referer: String,
}

impl OpenRouterAdapter {
    /// Create a new adapter
    pub fn new(
        base_url: impl Into<String>,
        referer: impl Into<String>,
        timeout_secs: u64,
    ) -> AppResult<Self> {
        Ok(Self {
            client: build_http_client(timeout_secs)?,
            base_url: base_url.into(),
            referer: referer.into(),
        })
    }

    /// Build the request URL
    fn build_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl ProviderAdapter for OpenRouterAdapter {
    fn name(&self) -> &'static str {
        "openrouter"
    }

    async fn chat(&self, request: &ChatRequest, api_key: &str) -> AppResult<ChatResponse> {
        debug!("Sending OpenRouter chat completion request");

        let response = self
            .client
            .post(self.build_url())
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .header("HTTP-Referer", &self.referer)
            .json(request)
            .send()
            .await?;

        if response.status().is_success() {
            let chat_response: ChatResponse = response.json().await?;
            debug!("OpenRouter request completed successfully");
            Ok(chat_response)
        } else {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!("OpenRouter API request failed: {} - {}", status, error_text);
            Err(AppError::upstream(format!(
                "OpenRouter API request failed: {} - {}",
                status, error_text
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adapter_creation() {
        let adapter =
            OpenRouterAdapter::new("https://openrouter.ai/api/v1", "https://smashingapps.ai", 30);
        assert!(adapter.is_ok());
    }

    #[test]
    fn test_adapter_name() {
        let adapter =
            OpenRouterAdapter::new("https://openrouter.ai/api/v1", "https://smashingapps.ai", 30)
                .unwrap();
        assert_eq!(adapter.name(), "openrouter");
    }

    #[test]
    fn test_build_url() {
        let adapter =
            OpenRouterAdapter::new("https://openrouter.ai/api/v1/", "https://smashingapps.ai", 30)
                .unwrap();
        assert_eq!(
            adapter.build_url(),
            "https://openrouter.ai/api/v1/chat/completions"
        );
    }
}
