//! OpenAI provider adapter
//!
//! Chat completions, image generation and audio transcription against the
//! OpenAI API

use super::{build_http_client, ProviderAdapter};
use crate::models::chat::{
    ChatRequest, ChatResponse, ImageRequest, ImageResponse, TranscriptionRequest,
    TranscriptionResponse,
};
use crate::utils::error::{AppError, AppResult};
use async_trait::async_trait;
use reqwest::multipart;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, error};

/// Model used when an image request does not name one
pub const DEFAULT_IMAGE_MODEL: &str = "dall-e-3";

/// OpenAI adapter
#[derive(Debug, Clone)]
pub struct OpenAIAdapter {
    client: Client,
    base_url: String,
}

/// OpenAI error response envelope
#[derive(Debug, Deserialize)]
struct OpenAIErrorResponse {
    error: OpenAIErrorDetail,
}

/// OpenAI error detail
#[derive(Debug, Deserialize)]
struct OpenAIErrorDetail {
    message: String,
}

impl OpenAIAdapter {
    /// Create a new adapter
    pub fn new(base_url: impl Into<String>, timeout_secs: u64) -> AppResult<Self> {
        Ok(Self {
            client: build_http_client(timeout_secs)?,
            base_url: base_url.into(),
        })
    }

    /// Build the request URL
    fn build_url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    /// Build authorization header value
    fn auth_header(api_key: &str) -> String {
        format!("Bearer {}", api_key)
    }

    /// Turn a non-success response into an upstream error
    async fn read_error(response: reqwest::Response) -> AppError {
        let status = response.status();
        let error_text = response.text().await.unwrap_or_default();

        if let Ok(parsed) = serde_json::from_str::<OpenAIErrorResponse>(&error_text) {
            error!("OpenAI API error: {}", parsed.error.message);
            AppError::upstream(format!("OpenAI API error: {}", parsed.error.message))
        } else {
            error!("OpenAI API request failed: {} - {}", status, error_text);
            AppError::upstream(format!(
                "OpenAI API request failed: {} - {}",
                status, error_text
            ))
        }
    }

    /// Generate images
    ///
    /// Fills in the DALL-E defaults for count, size and response format
    pub async fn generate_image(
        &self,
        request: &ImageRequest,
        api_key: &str,
    ) -> AppResult<ImageResponse> {
        let model = request.model.as_deref().unwrap_or(DEFAULT_IMAGE_MODEL);
        debug!("Sending OpenAI image generation request with model {}", model);

        let payload = serde_json::json!({
            "model": model,
            "prompt": request.prompt,
            "n": request.n.unwrap_or(1),
            "size": request.size.as_deref().unwrap_or("1024x1024"),
            "response_format": request.response_format.as_deref().unwrap_or("url"),
        });

        let response = self
            .client
            .post(self.build_url("images/generations"))
            .header("Authorization", Self::auth_header(api_key))
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await?;

        if response.status().is_success() {
            let image_response: ImageResponse = response.json().await?;
            debug!("Image generation completed successfully");
            Ok(image_response)
        } else {
            Err(Self::read_error(response).await)
        }
    }

    /// Transcribe audio through the Whisper API
    pub async fn transcribe(
        &self,
        request: TranscriptionRequest,
        api_key: &str,
    ) -> AppResult<TranscriptionResponse> {
        debug!(
            "Sending Whisper transcription request with model {}",
            request.model
        );

        let file_part = multipart::Part::bytes(request.data).file_name(request.file_name);
        let form = multipart::Form::new()
            .part("file", file_part)
            .text("model", request.model)
            .text("language", request.language);

        let response = self
            .client
            .post(self.build_url("audio/transcriptions"))
            .header("Authorization", Self::auth_header(api_key))
            .multipart(form)
            .send()
            .await?;

        if response.status().is_success() {
            let transcription: TranscriptionResponse = response.json().await?;
            debug!("Transcription completed successfully");
            Ok(transcription)
        } else {
            Err(Self::read_error(response).await)
        }
    }
}

#[async_trait]
impl ProviderAdapter for OpenAIAdapter {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn chat(&self, request: &ChatRequest, api_key: &str) -> AppResult<ChatResponse> {
        debug!("Sending OpenAI chat completion request");

        let response = self
            .client
            .post(self.build_url("chat/completions"))
            .header("Authorization", Self::auth_header(api_key))
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await?;

        if response.status().is_success() {
            let chat_response: ChatResponse = response.json().await?;
            debug!("OpenAI request completed successfully");
            Ok(chat_response)
        } else {
            Err(Self::read_error(response).await)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adapter_creation() {
        let adapter = OpenAIAdapter::new("https://api.openai.com/v1", 30);
        assert!(adapter.is_ok());
    }

    #[test]
    fn test_adapter_name() {
        let adapter = OpenAIAdapter::new("https://api.openai.com/v1", 30).unwrap();
        assert_eq!(adapter.name(), "openai");
    }

    #[test]
    fn test_build_url() {
        let adapter = OpenAIAdapter::new("https://api.openai.com/v1", 30).unwrap();
        assert_eq!(
            adapter.build_url("chat/completions"),
            "https://api.openai.com/v1/chat/completions"
        );

        // Trailing slash must not double up
        let adapter = OpenAIAdapter::new("https://api.openai.com/v1/", 30).unwrap();
        assert_eq!(
            adapter.build_url("images/generations"),
            "https://api.openai.com/v1/images/generations"
        );
    }
}
