//! Anthropic Messages API data models
//!
//! Wire structures for the `/v1/messages` endpoint plus conversion to and
//! from the normalized chat format

use crate::models::chat::{ChatRequest, ChatResponse, TokenUsage};
use serde::{Deserialize, Serialize};

/// Max tokens applied when the caller does not set one
pub const DEFAULT_MAX_TOKENS: u32 = 1024;

/// Anthropic messages request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnthropicRequest {
    /// Model name
    pub model: String,
    /// Maximum tokens to generate (required by the API)
    pub max_tokens: u32,
    /// Conversation messages, system role excluded
    pub messages: Vec<AnthropicMessage>,
    /// System prompt (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    /// Temperature parameter (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Top-p parameter (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    /// Stop sequences (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_sequences: Option<Vec<String>>,
}

/// Anthropic message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnthropicMessage {
    /// Role (user/assistant)
    pub role: String,
    /// Message content
    pub content: String,
}

/// Anthropic messages response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnthropicResponse {
    /// Response ID
    pub id: String,
    /// Model that produced the response
    #[serde(default)]
    pub model: String,
    /// Content blocks
    pub content: Vec<AnthropicContent>,
    /// Stop reason
    #[serde(default)]
    pub stop_reason: Option<String>,
    /// Usage statistics
    pub usage: AnthropicUsage,
}

/// Anthropic content block
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnthropicContent {
    /// Block type
    #[serde(rename = "type")]
    pub content_type: String,
    /// Block text
    #[serde(default)]
    pub text: String,
}

/// Anthropic usage statistics
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AnthropicUsage {
    /// Input token count
    pub input_tokens: u32,
    /// Output token count
    pub output_tokens: u32,
}

impl AnthropicRequest {
    /// Convert a normalized request, splitting system messages into the
    /// dedicated `system` field
    pub fn from_chat_request(request: &ChatRequest) -> Self {
        let mut system_parts = Vec::new();
        let mut messages = Vec::new();

        for message in &request.messages {
            if message.role == "system" {
                system_parts.push(message.content.clone());
            } else {
                messages.push(AnthropicMessage {
                    role: message.role.clone(),
                    content: message.content.clone(),
                });
            }
        }

        Self {
            model: request.model.clone(),
            max_tokens: request.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            messages,
            system: if system_parts.is_empty() {
                None
            } else {
                Some(system_parts.join("\n\n"))
            },
            temperature: request.temperature,
            top_p: request.top_p,
            stop_sequences: request.stop.clone(),
        }
    }
}

impl AnthropicResponse {
    /// Reshape into the normalized format
    ///
    /// `requested_model` is echoed back so callers see the model they asked
    /// for, and the token total is derived from input plus output
    pub fn into_chat_response(self, requested_model: &str) -> ChatResponse {
        let content = self
            .content
            .first()
            .map(|block| block.text.clone())
            .unwrap_or_default();
        let usage = TokenUsage::new(self.usage.input_tokens, self.usage.output_tokens);

        ChatResponse::assistant(self.id, requested_model, content, self.stop_reason, usage)
    }
}
