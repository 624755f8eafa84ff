//! Application configuration settings
//!
//! Defines all configuration structures and loading logic

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Server configuration
    pub server: ServerConfig,
    /// Upstream provider configuration
    pub providers: ProviderSettings,
    /// Rate limiting configuration
    pub rate_limit: RateLimitConfig,
    /// reCAPTCHA configuration
    pub recaptcha: RecaptchaConfig,
    /// Request configuration
    pub request: RequestConfig,
    /// Usage tracking configuration
    pub usage: UsageConfig,
    /// Canned response configuration
    pub canned: CannedConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen host
    pub host: String,
    /// Listen port
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8082,
        }
    }
}

/// Upstream provider configuration
///
/// API keys are all optional; clients may supply their own key per
/// request instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSettings {
    /// OpenAI API key
    pub openai_api_key: Option<String>,
    /// Anthropic API key
    pub anthropic_api_key: Option<String>,
    /// Google API key
    pub google_api_key: Option<String>,
    /// OpenRouter API key
    pub openrouter_api_key: Option<String>,
    /// OpenAI API base URL
    pub openai_base_url: String,
    /// Anthropic API base URL
    pub anthropic_base_url: String,
    /// Google Generative Language API base URL
    pub google_base_url: String,
    /// OpenRouter API base URL
    pub openrouter_base_url: String,
    /// Referer header sent to OpenRouter
    pub openrouter_referer: String,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            anthropic_api_key: None,
            google_api_key: None,
            openrouter_api_key: None,
            openai_base_url: "https://api.openai.com/v1".to_string(),
            anthropic_base_url: "https://api.anthropic.com".to_string(),
            google_base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            openrouter_base_url: "https://openrouter.ai/api/v1".to_string(),
            openrouter_referer: "https://smashingapps.ai".to_string(),
        }
    }
}

/// Rate limiting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Maximum requests per window
    pub limit: u32,
    /// Window length in seconds
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            limit: 10,
            window_secs: 86400,
        }
    }
}

/// reCAPTCHA configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecaptchaConfig {
    /// Secret key, verification is disabled when unset
    pub secret: Option<String>,
    /// Verification endpoint
    pub verify_url: String,
    /// Minimum acceptable score
    pub min_score: f64,
    /// Verification request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for RecaptchaConfig {
    fn default() -> Self {
        Self {
            secret: None,
            verify_url: "https://www.google.com/recaptcha/api/siteverify".to_string(),
            min_score: 0.5,
            timeout_secs: 5,
        }
    }
}

/// Request configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestConfig {
    /// Maximum request size in bytes
    pub max_request_size: usize,
    /// Upstream request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            max_request_size: 10_485_760,
            timeout_secs: 60,
        }
    }
}

/// Usage tracking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageConfig {
    /// Persistence backend, "file" or "memory"
    pub backend: String,
    /// Override path for the file backend
    pub data_path: Option<String>,
    /// Applications pre-seeded in the per-app aggregates
    pub known_apps: Vec<String>,
}

impl Default for UsageConfig {
    fn default() -> Self {
        Self {
            backend: "file".to_string(),
            data_path: None,
            known_apps: vec!["task-smasher".to_string(), "article-smasher".to_string()],
        }
    }
}

/// Canned response configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CannedConfig {
    /// Serve the canned ideas response instead of calling upstream
    pub enabled: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,
    /// Log format (text/json)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

impl Settings {
    /// Create a new configuration instance
    pub fn new() -> Result<Self> {
        // Load .env file if it exists
        dotenv::dotenv().ok();

        let settings = Self {
            server: ServerConfig {
                host: get_env_or_default("SERVER_HOST", "0.0.0.0"),
                port: get_env_or_default("SERVER_PORT", "8082")
                    .parse()
                    .context("Invalid port number")?,
            },
            providers: ProviderSettings {
                openai_api_key: get_env_optional("OPENAI_API_KEY"),
                anthropic_api_key: get_env_optional("ANTHROPIC_API_KEY"),
                google_api_key: get_env_optional("GOOGLE_API_KEY"),
                openrouter_api_key: get_env_optional("OPENROUTER_API_KEY"),
                openai_base_url: get_env_or_default("OPENAI_BASE_URL", "https://api.openai.com/v1"),
                anthropic_base_url: get_env_or_default(
                    "ANTHROPIC_BASE_URL",
                    "https://api.anthropic.com",
                ),
                google_base_url: get_env_or_default(
                    "GOOGLE_BASE_URL",
                    "https://generativelanguage.googleapis.com/v1beta",
                ),
                openrouter_base_url: get_env_or_default(
                    "OPENROUTER_BASE_URL",
                    "https://openrouter.ai/api/v1",
                ),
                openrouter_referer: get_env_or_default(
                    "OPENROUTER_REFERER",
                    "https://smashingapps.ai",
                ),
            },
            rate_limit: RateLimitConfig {
                limit: get_env_or_default("RATE_LIMIT", "10")
                    .parse()
                    .context("Invalid rate limit")?,
                window_secs: get_env_or_default("RATE_LIMIT_WINDOW_SECS", "86400")
                    .parse()
                    .context("Invalid rate limit window")?,
            },
            recaptcha: RecaptchaConfig {
                secret: get_env_optional("RECAPTCHA_SECRET_KEY"),
                verify_url: get_env_or_default(
                    "RECAPTCHA_VERIFY_URL",
                    "https://www.google.com/recaptcha/api/siteverify",
                ),
                min_score: get_env_or_default("RECAPTCHA_MIN_SCORE", "0.5")
                    .parse()
                    .context("Invalid reCAPTCHA minimum score")?,
                timeout_secs: get_env_or_default("RECAPTCHA_TIMEOUT", "5")
                    .parse()
                    .context("Invalid reCAPTCHA timeout")?,
            },
            request: RequestConfig {
                max_request_size: get_env_or_default("MAX_REQUEST_SIZE", "10485760")
                    .parse()
                    .context("Invalid maximum request size")?,
                timeout_secs: get_env_or_default("REQUEST_TIMEOUT", "60")
                    .parse()
                    .context("Invalid request timeout")?,
            },
            usage: UsageConfig {
                backend: get_env_or_default("USAGE_BACKEND", "file"),
                data_path: get_env_optional("USAGE_DATA_PATH"),
                known_apps: parse_list(&get_env_or_default(
                    "KNOWN_APPS",
                    "task-smasher,article-smasher",
                )),
            },
            canned: CannedConfig {
                enabled: get_env_or_default("CANNED_IDEAS_ENABLED", "false")
                    .parse()
                    .context("Invalid canned ideas flag")?,
            },
            logging: LoggingConfig {
                level: get_env_or_default("RUST_LOG", "info"),
                format: get_env_or_default("LOG_FORMAT", "text"),
            },
        };

        // Validate configuration
        settings.validate()?;

        Ok(settings)
    }

    /// Validate configuration validity
    pub fn validate(&self) -> Result<()> {
        // Validate port range
        if self.server.port == 0 {
            anyhow::bail!("Port number cannot be 0");
        }

        // Validate API key format for every configured key
        let keys = [
            ("OpenAI", &self.providers.openai_api_key),
            ("Anthropic", &self.providers.anthropic_api_key),
            ("Google", &self.providers.google_api_key),
            ("OpenRouter", &self.providers.openrouter_api_key),
        ];
        for (name, key) in keys {
            if let Some(key) = key {
                if key.contains(char::is_whitespace) {
                    anyhow::bail!("{} API key cannot contain whitespace characters", name);
                }
            }
        }

        // Validate URL formats
        let urls = [
            ("OpenAI", &self.providers.openai_base_url),
            ("Anthropic", &self.providers.anthropic_base_url),
            ("Google", &self.providers.google_base_url),
            ("OpenRouter", &self.providers.openrouter_base_url),
            ("reCAPTCHA", &self.recaptcha.verify_url),
        ];
        for (name, url) in urls {
            if !url.starts_with("http") {
                anyhow::bail!("Invalid {} base URL format, should start with 'http'", name);
            }
        }

        // Validate rate limit values
        if self.rate_limit.limit == 0 {
            anyhow::bail!("Rate limit cannot be 0");
        }
        if self.rate_limit.window_secs == 0 {
            anyhow::bail!("Rate limit window cannot be 0");
        }

        // Validate reCAPTCHA score range
        if !(0.0..=1.0).contains(&self.recaptcha.min_score) {
            anyhow::bail!("reCAPTCHA minimum score must be between 0 and 1");
        }

        // Validate timeout values
        if self.request.timeout_secs == 0 || self.recaptcha.timeout_secs == 0 {
            anyhow::bail!("Timeout values cannot be 0");
        }

        // Validate request size limit
        if self.request.max_request_size == 0 {
            anyhow::bail!("Maximum request size cannot be 0");
        }

        // Validate usage backend
        let valid_backends = ["file", "memory"];
        if !valid_backends.contains(&self.usage.backend.as_str()) {
            anyhow::bail!("Invalid usage backend: {}", self.usage.backend);
        }

        // Validate log level
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            anyhow::bail!("Invalid log level: {}", self.logging.level);
        }

        // Validate log format
        let valid_formats = ["text", "json"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            anyhow::bail!("Invalid log format: {}", self.logging.format);
        }

        Ok(())
    }
}

/// Get environment variable or default value
fn get_env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get environment variable, treating empty values as unset
fn get_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.is_empty())
}

/// Split a comma-separated list into trimmed entries
fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|entry| entry.trim().to_string())
        .filter(|entry| !entry.is_empty())
        .collect()
}
