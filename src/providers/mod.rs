//! Provider module
//!
//! Defines the ProviderAdapter trait and the adapters for each supported
//! upstream API

pub mod anthropic;
pub mod google;
pub mod openai;
pub mod openrouter;

use crate::models::chat::{ChatRequest, ChatResponse};
use crate::utils::error::{AppError, AppResult};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Supported upstream providers
///
/// `Image` selects the image generation path rather than a chat adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    OpenAI,
    Anthropic,
    Google,
    OpenRouter,
    Image,
}

impl ProviderKind {
    /// Parse the `x-provider` header value
    ///
    /// An absent header selects OpenAI; an unrecognized value is rejected
    pub fn from_header(value: Option<&str>) -> AppResult<Self> {
        match value {
            None | Some("") | Some("openai") => Ok(ProviderKind::OpenAI),
            Some("anthropic") => Ok(ProviderKind::Anthropic),
            Some("google") => Ok(ProviderKind::Google),
            Some("openrouter") => Ok(ProviderKind::OpenRouter),
            Some("image") => Ok(ProviderKind::Image),
            Some(other) => Err(AppError::Validation(format!(
                "Unknown provider '{}'. Supported providers: openai, anthropic, google, openrouter, image.",
                other
            ))),
        }
    }

    /// Provider name as used in usage records and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAI => "openai",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::Google => "google",
            ProviderKind::OpenRouter => "openrouter",
            ProviderKind::Image => "image",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Adapter trait for upstream chat providers
///
/// Each adapter reshapes the normalized request into its provider's wire
/// format, performs the call, and reshapes the answer back. Nothing
/// outside the adapter sees provider-specific structures.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Get the provider name
    fn name(&self) -> &'static str;

    /// Send a chat completion request
    async fn chat(&self, request: &ChatRequest, api_key: &str) -> AppResult<ChatResponse>;
}

/// User-Agent presented to every upstream provider
pub const UPSTREAM_USER_AGENT: &str = "SmashingApps/1.0";

/// Build the HTTP client shared by the adapters
pub(crate) fn build_http_client(timeout_secs: u64) -> AppResult<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(UPSTREAM_USER_AGENT)
        .build()
        .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))
}

pub use anthropic::AnthropicAdapter;
pub use google::GoogleAdapter;
pub use openai::OpenAIAdapter;
pub use openrouter::OpenRouterAdapter;
