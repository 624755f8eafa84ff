//! Normalized chat API data models
//!
//! Every provider adapter accepts and produces these structures, which
//! mirror the OpenAI chat completion schema

use serde::{Deserialize, Serialize};

/// Normalized chat completion request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Model name
    pub model: String,
    /// Message list
    pub messages: Vec<ChatMessage>,
    /// Maximum tokens to generate (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Temperature parameter (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Top-p parameter (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    /// Number of generations (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n: Option<u32>,
    /// Stop sequences (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<Vec<String>>,
}

/// Chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role (system/user/assistant)
    pub role: String,
    /// Message content
    pub content: String,
}

/// Normalized chat completion response
///
/// Returned with the same shape regardless of which provider served the
/// request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Response ID
    pub id: String,
    /// Object type
    pub object: String,
    /// Creation timestamp (unix seconds)
    pub created: u64,
    /// Model used
    pub model: String,
    /// Choice list
    pub choices: Vec<ChatChoice>,
    /// Usage statistics
    pub usage: TokenUsage,
}

/// Chat completion choice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatChoice {
    /// Choice index
    pub index: u32,
    /// Message content
    pub message: ChatMessage,
    /// Finish reason
    pub finish_reason: Option<String>,
}

/// Token usage statistics
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Prompt token count
    pub prompt_tokens: u32,
    /// Completion token count
    pub completion_tokens: u32,
    /// Total token count
    pub total_tokens: u32,
}

/// Image generation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageRequest {
    /// Model name (optional, DALL-E 3 when absent)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Image prompt
    pub prompt: String,
    /// Number of images (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n: Option<u32>,
    /// Image size (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    /// Response format, url or b64_json (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<String>,
}

/// Image generation response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageResponse {
    /// Creation timestamp (unix seconds)
    pub created: u64,
    /// Generated images
    pub data: Vec<ImageData>,
}

/// A single generated image
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageData {
    /// Image URL (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Base64 encoded image (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub b64_json: Option<String>,
    /// Revised prompt returned by the model (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revised_prompt: Option<String>,
}

/// Audio transcription request assembled from a multipart upload
#[derive(Debug, Clone)]
pub struct TranscriptionRequest {
    /// Raw audio bytes
    pub data: Vec<u8>,
    /// Original file name
    pub file_name: String,
    /// Transcription model
    pub model: String,
    /// Audio language
    pub language: String,
}

/// Audio transcription response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionResponse {
    /// Transcribed text
    pub text: String,
}

impl ChatMessage {
    /// Create a new message
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}

impl TokenUsage {
    /// Create usage statistics, deriving the total from the parts
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

impl ChatResponse {
    /// Build a single-choice assistant response
    ///
    /// Used when reshaping provider answers that are not already in the
    /// normalized format
    pub fn assistant(
        id: impl Into<String>,
        model: impl Into<String>,
        content: impl Into<String>,
        finish_reason: Option<String>,
        usage: TokenUsage,
    ) -> Self {
        Self {
            id: id.into(),
            object: "chat.completion".to_string(),
            created: chrono::Utc::now().timestamp() as u64,
            model: model.into(),
            choices: vec![ChatChoice {
                index: 0,
                message: ChatMessage::new("assistant", content),
                finish_reason,
            }],
            usage,
        }
    }

    /// Text of the first choice, if any
    pub fn first_content(&self) -> Option<&str> {
        self.choices.first().map(|c| c.message.content.as_str())
    }
}

impl TranscriptionRequest {
    /// Fallback file name when the upload does not carry one
    pub const DEFAULT_FILE_NAME: &'static str = "recording.webm";
    /// Default transcription model
    pub const DEFAULT_MODEL: &'static str = "whisper-1";
    /// Default audio language
    pub const DEFAULT_LANGUAGE: &'static str = "en";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_totals() {
        let usage = TokenUsage::new(120, 30);
        assert_eq!(usage.prompt_tokens, 120);
        assert_eq!(usage.completion_tokens, 30);
        assert_eq!(usage.total_tokens, 150);
    }

    #[test]
    fn test_request_skips_absent_fields() {
        let request = ChatRequest {
            model: "gpt-4o".to_string(),
            messages: vec![ChatMessage::new("user", "hello")],
            max_tokens: None,
            temperature: None,
            top_p: None,
            n: None,
            stop: None,
        };

        let json = serde_json::to_string(&request).unwrap();
        assert!(!json.contains("max_tokens"));
        assert!(!json.contains("temperature"));
        assert!(json.contains("\"model\":\"gpt-4o\""));
    }

    #[test]
    fn test_parse_openai_shaped_response() {
        let json = r#"{
            "id": "chatcmpl-123",
            "object": "chat.completion",
            "created": 1700000000,
            "model": "gpt-4o",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "Hi there"},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 9, "completion_tokens": 3, "total_tokens": 12}
        }"#;

        let response: ChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.id, "chatcmpl-123");
        assert_eq!(response.first_content(), Some("Hi there"));
        assert_eq!(response.usage.total_tokens, 12);
    }

    #[test]
    fn test_assistant_response_shape() {
        let response = ChatResponse::assistant(
            "resp-1",
            "gpt-4o",
            "answer",
            Some("stop".to_string()),
            TokenUsage::new(10, 5),
        );

        assert_eq!(response.object, "chat.completion");
        assert_eq!(response.choices.len(), 1);
        assert_eq!(response.choices[0].message.role, "assistant");
        assert_eq!(response.choices[0].index, 0);
    }

    #[test]
    fn test_image_request_defaults_parse() {
        let json = r#"{"prompt": "a lighthouse at dusk"}"#;
        let request: ImageRequest = serde_json::from_str(json).unwrap();

        assert_eq!(request.prompt, "a lighthouse at dusk");
        assert!(request.model.is_none());
        assert!(request.n.is_none());
    }
}
