//! HTTP handlers module
//!
//! Contains all HTTP endpoint handling logic

pub mod health;
pub mod proxy;
pub mod usage;

use crate::config::Settings;
use crate::middleware::logging::request_logging_middleware;
use crate::services::{Dispatcher, FixedWindowLimiter, RecaptchaVerifier};
use crate::usage::{FileStore, MemoryStore, Store, UsageTracker};
use anyhow::Result;
use axum::{
    extract::DefaultBodyLimit,
    routing::{any, get, post},
    Router,
};
use std::path::PathBuf;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};
use tracing::debug;

/// Application state
pub struct AppState {
    pub settings: Settings,
    pub dispatcher: Dispatcher,
    pub limiter: FixedWindowLimiter,
    pub recaptcha: RecaptchaVerifier,
    pub usage: Arc<UsageTracker>,
}

/// Create application router
pub async fn create_router(settings: Settings) -> Result<Router> {
    // Create provider dispatcher
    let dispatcher = Dispatcher::new(&settings)?;

    // Create rate limiter
    let limiter = FixedWindowLimiter::new(
        settings.rate_limit.limit,
        settings.rate_limit.window_secs,
    );

    // Create reCAPTCHA verifier
    let recaptcha = RecaptchaVerifier::new(
        &settings.recaptcha.verify_url,
        settings.recaptcha.secret.clone(),
        settings.recaptcha.min_score,
        settings.recaptcha.timeout_secs,
    )?;

    // Create usage tracker on the configured backend
    let store: Arc<dyn Store> = match settings.usage.backend.as_str() {
        "memory" => Arc::new(MemoryStore::new()),
        _ => {
            let path = settings
                .usage
                .data_path
                .clone()
                .map(PathBuf::from)
                .unwrap_or_else(FileStore::default_path);
            Arc::new(FileStore::open(path))
        }
    };
    let usage = Arc::new(UsageTracker::new(store, settings.usage.known_apps.clone()));
    usage.watch(Box::new(|_| debug!("Usage data persisted")));

    // Create application state
    let app_state = Arc::new(AppState {
        settings: settings.clone(),
        dispatcher,
        limiter,
        recaptcha,
        usage,
    });

    // Create middleware stack
    let middleware_stack = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    // Create routes
    let router = Router::new()
        .route("/", any(proxy::handle_proxy))
        .route("/image", any(proxy::handle_proxy))
        .route("/rate-limit-status", any(proxy::rate_limit_status))
        .route("/usage", get(usage::get_usage).delete(usage::clear_usage))
        .route("/usage/recompute", post(usage::recompute_usage))
        .route("/health", get(health::health_check))
        .route("/health/live", get(health::liveness_check))
        .layer(axum::middleware::from_fn(request_logging_middleware))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(settings.request.max_request_size))
        .with_state(app_state)
        .layer(middleware_stack);

    Ok(router)
}
