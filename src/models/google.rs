//! Google Gemini API data models
//!
//! Wire structures for the `generateContent` endpoint plus conversion to
//! and from the normalized chat format

use crate::models::chat::{ChatRequest, ChatResponse, TokenUsage};
use serde::{Deserialize, Serialize};

/// Top-p applied to every generation request
pub const DEFAULT_TOP_P: f32 = 0.95;
/// Top-k applied to every generation request
pub const DEFAULT_TOP_K: u32 = 40;

/// Google generateContent request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleRequest {
    /// Conversation turns
    pub contents: Vec<GoogleContent>,
    /// System prompt (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<GoogleContent>,
    /// Generation parameters
    pub generation_config: GoogleGenerationConfig,
}

/// Google content block
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleContent {
    /// Role (user/model), absent on system instructions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Content parts
    pub parts: Vec<GooglePart>,
}

/// Google content part
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GooglePart {
    /// Part text
    pub text: String,
}

/// Google generation parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleGenerationConfig {
    /// Temperature parameter (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Maximum output tokens (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
    /// Top-p parameter
    pub top_p: f32,
    /// Top-k parameter
    pub top_k: u32,
}

/// Google generateContent response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleResponse {
    /// Generated candidates
    #[serde(default)]
    pub candidates: Vec<GoogleCandidate>,
    /// Token usage (optional)
    #[serde(default)]
    pub usage_metadata: Option<GoogleUsageMetadata>,
}

/// Google response candidate
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleCandidate {
    /// Candidate content
    pub content: GoogleContent,
    /// Finish reason
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Google token usage metadata
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleUsageMetadata {
    /// Prompt token count
    #[serde(default)]
    pub prompt_token_count: u32,
    /// Candidate token count
    #[serde(default)]
    pub candidates_token_count: u32,
    /// Total token count
    #[serde(default)]
    pub total_token_count: u32,
}

impl GoogleRequest {
    /// Convert a normalized request
    ///
    /// Roles remap as user -> user and assistant -> model; system messages
    /// leave the turn list and become the system instruction
    pub fn from_chat_request(request: &ChatRequest) -> Self {
        let mut system_parts = Vec::new();
        let mut contents = Vec::new();

        for message in &request.messages {
            match message.role.as_str() {
                "system" => system_parts.push(GooglePart {
                    text: message.content.clone(),
                }),
                "assistant" => contents.push(GoogleContent {
                    role: Some("model".to_string()),
                    parts: vec![GooglePart {
                        text: message.content.clone(),
                    }],
                }),
                _ => contents.push(GoogleContent {
                    role: Some("user".to_string()),
                    parts: vec![GooglePart {
                        text: message.content.clone(),
                    }],
                }),
            }
        }

        Self {
            contents,
            system_instruction: if system_parts.is_empty() {
                None
            } else {
                Some(GoogleContent {
                    role: None,
                    parts: system_parts,
                })
            },
            generation_config: GoogleGenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_tokens,
                top_p: DEFAULT_TOP_P,
                top_k: DEFAULT_TOP_K,
            },
        }
    }
}

impl GoogleResponse {
    /// Reshape into the normalized format
    ///
    /// Gemini responses carry no stable ID, so one is minted from the
    /// current time
    pub fn into_chat_response(self, requested_model: &str) -> ChatResponse {
        let content = self
            .candidates
            .first()
            .map(|candidate| {
                candidate
                    .content
                    .parts
                    .iter()
                    .map(|part| part.text.as_str())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        let finish_reason = self
            .candidates
            .first()
            .and_then(|candidate| candidate.finish_reason.as_ref())
            .map(|reason| reason.to_lowercase())
            .or_else(|| Some("stop".to_string()));

        let usage = self
            .usage_metadata
            .map(|metadata| {
                TokenUsage::new(metadata.prompt_token_count, metadata.candidates_token_count)
            })
            .unwrap_or_default();

        let id = format!("google-{}", chrono::Utc::now().timestamp_millis());
        ChatResponse::assistant(id, requested_model, content, finish_reason, usage)
    }
}
