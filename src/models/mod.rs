//! Data models module
//!
//! Defines the normalized chat schema plus the Anthropic and Google wire
//! formats it converts to and from

pub mod anthropic;
pub mod chat;
pub mod google;

pub use chat::{
    ChatChoice, ChatMessage, ChatRequest, ChatResponse, ImageData, ImageRequest, ImageResponse,
    TokenUsage, TranscriptionRequest, TranscriptionResponse,
};
