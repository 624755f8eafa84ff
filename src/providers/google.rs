//! Google provider adapter
//!
//! Sends Gemini generateContent requests and reshapes the answers into the
//! normalized chat format. Authentication rides in the query string.

use super::{build_http_client, ProviderAdapter};
use crate::models::chat::{ChatRequest, ChatResponse};
use crate::models::google::{GoogleRequest, GoogleResponse};
use crate::utils::error::{AppError, AppResult};
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, error};

/// Google adapter
#[derive(Debug, Clone)]
pub struct GoogleAdapter {
    client: Client,
    base_url: String,
}

impl GoogleAdapter {
    /// Create a new adapter
    pub fn new(base_url: impl Into<String>, timeout_secs: u64) -> AppResult<Self> {
        Ok(Self {
            client: build_http_client(timeout_secs)?,
            base_url: base_url.into(),
        })
    }

    /// Build the request URL for a model
    fn build_url(&self, model: &str) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            model
        )
    }
}

#[async_trait]
impl ProviderAdapter for GoogleAdapter {
    fn name(&self) -> &'static str {
        "google"
    }

    async fn chat(&self, request: &ChatRequest, api_key: &str) -> AppResult<ChatResponse> {
        debug!("Sending Google generateContent request");

        let google_request = GoogleRequest::from_chat_request(request);

        let response = self
            .client
            .post(self.build_url(&request.model))
            .query(&[("key", api_key)])
            .header("Content-Type", "application/json")
            .json(&google_request)
            .send()
            .await?;

        if response.status().is_success() {
            let google_response: GoogleResponse = response.json().await?;
            debug!("Google request completed successfully");
            Ok(google_response.into_chat_response(&request.model))
        } else {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!("Google API request failed: {} - {}", status, error_text);
            Err(AppError::upstream(format!(
                "Google API request failed: {} - {}",
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
        let adapter = GoogleAdapter::new("https://generativelanguage.googleapis.com/v1beta", 30);
        assert!(adapter.is_ok());
    }

    #[test]
    fn test_adapter_name() {
        let adapter =
            GoogleAdapter::new("https://generativelanguage.googleapis.com/v1beta", 30).unwrap();
        assert_eq!(adapter.name(), "google");
    }

    #[test]
    fn test_build_url_includes_model() {
        let adapter =
            GoogleAdapter::new("https://generativelanguage.googleapis.com/v1beta/", 30).unwrap();
        assert_eq!(
            adapter.build_url("gemini-1.5-pro"),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-pro:generateContent"
        );
    }
}
