//! Request dispatch
//!
//! Resolves API keys and routes normalized requests to the matching
//! provider adapter. Also owns the canned response for idea-generation
//! prompts used in demos, served without touching any upstream.

use crate::config::settings::Settings;
use crate::models::chat::{
    ChatRequest, ChatResponse, ImageData, ImageRequest, ImageResponse, TokenUsage,
    TranscriptionRequest, TranscriptionResponse,
};
use crate::providers::openai::DEFAULT_IMAGE_MODEL;
use crate::providers::{
    AnthropicAdapter, GoogleAdapter, OpenAIAdapter, OpenRouterAdapter, ProviderAdapter,
    ProviderKind,
};
use crate::utils::error::{AppError, AppResult};
use tracing::info;

/// Substring that triggers the canned ideas response
const IDEAS_TRIGGER: &str = "Generate 5";

/// Body of the canned ideas response
const IDEAS_TEXT: &str = "Create a social media content calendar\n\
Develop an email marketing campaign\n\
Design a new product landing page\n\
Conduct competitor analysis\n\
Plan a customer feedback survey";

/// Routes requests to provider adapters
pub struct Dispatcher {
    openai: OpenAIAdapter,
    openrouter: OpenRouterAdapter,
    anthropic: AnthropicAdapter,
    google: GoogleAdapter,
    openai_key: Option<String>,
    anthropic_key: Option<String>,
    google_key: Option<String>,
    openrouter_key: Option<String>,
    canned_enabled: bool,
}

impl Dispatcher {
    /// Build all adapters from the configured base URLs
    pub fn new(settings: &Settings) -> AppResult<Self> {
        let providers = &settings.providers;
        let timeout = settings.request.timeout_secs;

        Ok(Self {
            openai: OpenAIAdapter::new(&providers.openai_base_url, timeout)?,
            openrouter: OpenRouterAdapter::new(
                &providers.openrouter_base_url,
                &providers.openrouter_referer,
                timeout,
            )?,
            anthropic: AnthropicAdapter::new(&providers.anthropic_base_url, timeout)?,
            google: GoogleAdapter::new(&providers.google_base_url, timeout)?,
            openai_key: providers.openai_api_key.clone(),
            anthropic_key: providers.anthropic_api_key.clone(),
            google_key: providers.google_api_key.clone(),
            openrouter_key: providers.openrouter_api_key.clone(),
            canned_enabled: settings.canned.enabled,
        })
    }

    /// Pick the API key for a request
    ///
    /// A key supplied by the client wins, otherwise the configured key
    /// for the target provider. Image requests bill against OpenAI.
    pub fn resolve_api_key(
        &self,
        kind: ProviderKind,
        header_key: Option<&str>,
    ) -> AppResult<String> {
        if let Some(key) = header_key {
            if !key.is_empty() {
                return Ok(key.to_string());
            }
        }

        let configured = match kind {
            ProviderKind::OpenAI | ProviderKind::Image => &self.openai_key,
            ProviderKind::Anthropic => &self.anthropic_key,
            ProviderKind::Google => &self.google_key,
            ProviderKind::OpenRouter => &self.openrouter_key,
        };
        configured.clone().ok_or(AppError::MissingApiKey)
    }

    /// Send a chat request to the selected provider
    pub async fn dispatch_chat(
        &self,
        kind: ProviderKind,
        request: &ChatRequest,
        api_key: &str,
    ) -> AppResult<ChatResponse> {
        if let Some(response) = self.canned_ideas(request) {
            info!("Serving canned ideas response for model {}", request.model);
            return Ok(response);
        }

        match kind {
            // An image provider with a chat body still talks to OpenAI
            ProviderKind::OpenAI | ProviderKind::Image => self.openai.chat(request, api_key).await,
            ProviderKind::OpenRouter => self.openrouter.chat(request, api_key).await,
            ProviderKind::Anthropic => self.anthropic.chat(request, api_key).await,
            ProviderKind::Google => self.google.chat(request, api_key).await,
        }
    }

    /// Generate images
    ///
    /// Models without an upstream integration get a placeholder image
    /// so demo clients keep working.
    pub async fn dispatch_image(
        &self,
        request: &ImageRequest,
        api_key: &str,
    ) -> AppResult<ImageResponse> {
        let model = request.model.as_deref().unwrap_or(DEFAULT_IMAGE_MODEL);

        match model {
            "stable-diffusion-3" => Ok(placeholder_image(
                "https://placeholder.com/stable-diffusion-image.png",
            )),
            "midjourney" => Ok(placeholder_image(
                "https://placeholder.com/midjourney-image.png",
            )),
            _ => self.openai.generate_image(request, api_key).await,
        }
    }

    /// Transcribe uploaded audio
    pub async fn transcribe(
        &self,
        request: TranscriptionRequest,
        api_key: &str,
    ) -> AppResult<TranscriptionResponse> {
        self.openai.transcribe(request, api_key).await
    }

    fn canned_ideas(&self, request: &ChatRequest) -> Option<ChatResponse> {
        if !self.canned_enabled {
            return None;
        }

        let triggered = request
            .messages
            .iter()
            .any(|message| message.content.contains(IDEAS_TRIGGER));
        if !triggered {
            return None;
        }

        Some(ChatResponse::assistant(
            "hardcoded-response",
            &request.model,
            IDEAS_TEXT,
            Some("stop".to_string()),
            TokenUsage::new(50, 50),
        ))
    }
}

fn placeholder_image(url: &str) -> ImageResponse {
    ImageResponse {
        created: chrono::Utc::now().timestamp() as u64,
        data: vec![ImageData {
            url: Some(url.to_string()),
            b64_json: None,
            revised_prompt: None,
        }],
    }
}
