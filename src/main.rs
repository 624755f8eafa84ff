//! AI Proxy Hub Server
//!
//! HTTP proxy that forwards chat, image and transcription requests to AI
//! providers while enforcing per-client rate limits and recording usage

use anyhow::{Context, Result};
use tracing::info;

use aiproxyhub::config::Settings;
use aiproxyhub::handlers::create_router;

#[tokio::main]
async fn main() -> Result<()> {
    // Load settings from environment
    let settings = Settings::new().context("Failed to load server settings")?;

    // Initialize logging
    init_logging(&settings);

    info!("Server settings loaded");

    // Create router
    let app = create_router(settings.clone()).await?;

    // Build server address
    let addr = format!("{}:{}", settings.server.host, settings.server.port);

    // Start server
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("🚀 AI Proxy Hub started!");
    info!("📝 Health check: http://{}/health", addr);
    info!("🔄 Proxy endpoint: http://{}/", addr);
    info!("📊 Usage endpoint: http://{}/usage", addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to start server: {}", e))?;

    Ok(())
}

/// Initialize logging system
fn init_logging(settings: &Settings) {
    let log_level = settings.logging.level.clone();

    let subscriber: Box<dyn tracing::Subscriber + Send + Sync> = if settings.logging.format == "json" {
        // JSON format logs (production environment)
        Box::new(tracing_subscriber::fmt()
            .with_env_filter(log_level)
            .json()
            .with_current_span(false)
            .with_span_list(false)
            .finish())
    } else {
        // Human readable format (development environment)
        Box::new(tracing_subscriber::fmt()
            .with_env_filter(log_level)
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .finish())
    };

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    info!("Logging system initialized");
}
