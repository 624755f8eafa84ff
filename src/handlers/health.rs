//! Health check handlers
//!
//! Provides application health status check endpoints

use crate::config::Settings;
use crate::handlers::AppState;
use axum::{extract::State, response::Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service name
    pub service: String,
    /// Version information
    pub version: String,
    /// Timestamp
    pub timestamp: String,
    /// Details (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HealthDetails>,
}

/// Check result
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthDetails {
    /// Provider key status
    pub providers: String,
    /// Configuration status
    pub config: String,
    /// Usage events currently tracked
    pub usage_events: u64,
    /// Uptime in seconds
    pub uptime_seconds: u64,
    /// Memory usage (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_usage: Option<MemoryUsage>,
}

/// Memory usage information
#[derive(Debug, Serialize, Deserialize)]
pub struct MemoryUsage {
    /// Used memory in bytes
    pub used_bytes: u64,
    /// Total memory in bytes
    pub total_bytes: u64,
    /// Usage percentage
    pub usage_percent: f64,
}

/// Basic health check
///
/// Returns basic service status information
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    debug!("Executing health check");

    let response = HealthResponse {
        status: "healthy".to_string(),
        service: "AI Proxy Hub".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        details: Some(HealthDetails {
            providers: format!(
                "{} provider keys configured",
                configured_provider_count(&state.settings)
            ),
            config: "valid".to_string(),
            usage_events: state.usage.snapshot().usage_history.len() as u64,
            uptime_seconds: get_uptime_seconds(),
            memory_usage: get_memory_usage(),
        }),
    };

    Json(response)
}

/// Liveness check
///
/// GET /health/live
/// Check if the service is still running
pub async fn liveness_check(State(_state): State<Arc<AppState>>) -> Json<HealthResponse> {
    debug!("Executing liveness check");

    // Liveness only confirms the process is running, external
    // dependencies are not checked
    let details = HealthDetails {
        providers: "not_checked".to_string(),
        config: "valid".to_string(),
        usage_events: 0,
        uptime_seconds: get_uptime_seconds(),
        memory_usage: get_memory_usage(),
    };

    let response = HealthResponse {
        status: "alive".to_string(),
        service: "AI Proxy Hub".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        details: Some(details),
    };

    Json(response)
}

/// Count the providers with a key configured
fn configured_provider_count(settings: &Settings) -> usize {
    [
        &settings.providers.openai_api_key,
        &settings.providers.anthropic_api_key,
        &settings.providers.google_api_key,
        &settings.providers.openrouter_api_key,
    ]
    .iter()
    .filter(|key| key.is_some())
    .count()
}

/// Get service uptime in seconds
fn get_uptime_seconds() -> u64 {
    use once_cell::sync::Lazy;
    use std::time::{SystemTime, UNIX_EPOCH};

    static START_TIME: Lazy<u64> = Lazy::new(|| {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    });

    let current_time = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();

    current_time.saturating_sub(*START_TIME)
}

/// Get memory usage information
fn get_memory_usage() -> Option<MemoryUsage> {
    #[cfg(target_os = "linux")]
    {
        use std::fs;

        // Read /proc/self/status to get memory information
        if let Ok(status) = fs::read_to_string("/proc/self/status") {
            let mut vm_rss = None;
            let mut vm_size = None;

            for line in status.lines() {
                if line.starts_with("VmRSS:") {
                    if let Some(kb_str) = line.split_whitespace().nth(1) {
                        if let Ok(kb) = kb_str.parse::<u64>() {
                            vm_rss = Some(kb * 1024); // Convert to bytes
                        }
                    }
                } else if line.starts_with("VmSize:") {
                    if let Some(kb_str) = line.split_whitespace().nth(1) {
                        if let Ok(kb) = kb_str.parse::<u64>() {
                            vm_size = Some(kb * 1024); // Convert to bytes
                        }
                    }
                }
            }

            if let (Some(used), Some(total)) = (vm_rss, vm_size) {
                let usage_percent = if total > 0 {
                    (used as f64 / total as f64) * 100.0
                } else {
                    0.0
                };

                return Some(MemoryUsage {
                    used_bytes: used,
                    total_bytes: total,
                    usage_percent,
                });
            }
        }
    }

    // No memory probe on other platforms
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{Dispatcher, FixedWindowLimiter, RecaptchaVerifier};
    use crate::usage::{MemoryStore, UsageTracker};

    fn create_test_state() -> Arc<AppState> {
        let mut settings = Settings::default();
        settings.usage.backend = "memory".to_string();
        settings.providers.openai_api_key = Some("sk-test".to_string());

        let dispatcher = Dispatcher::new(&settings).unwrap();
        let limiter = FixedWindowLimiter::new(
            settings.rate_limit.limit,
            settings.rate_limit.window_secs,
        );
        let recaptcha = RecaptchaVerifier::new(
            &settings.recaptcha.verify_url,
            None,
            settings.recaptcha.min_score,
            settings.recaptcha.timeout_secs,
        )
        .unwrap();
        let usage = Arc::new(UsageTracker::new(
            Arc::new(MemoryStore::new()),
            settings.usage.known_apps.clone(),
        ));

        Arc::new(AppState {
            settings,
            dispatcher,
            limiter,
            recaptcha,
            usage,
        })
    }

    #[tokio::test]
    async fn test_health_check() {
        let state = create_test_state();
        let result = health_check(State(state)).await;

        let response = result.0;
        assert_eq!(response.status, "healthy");
        assert_eq!(response.service, "AI Proxy Hub");

        let details = response.details.unwrap();
        assert_eq!(details.providers, "1 provider keys configured");
    }

    #[tokio::test]
    async fn test_liveness_check() {
        let state = create_test_state();
        let result = liveness_check(State(state)).await;

        let response = result.0;
        assert_eq!(response.status, "alive");
        assert!(response.details.is_some());
    }

    #[test]
    fn test_uptime_calculation() {
        let uptime1 = get_uptime_seconds();
        std::thread::sleep(std::time::Duration::from_millis(100));
        let uptime2 = get_uptime_seconds();

        // The second call's uptime should be greater than or equal to the first
        assert!(uptime2 >= uptime1);
    }
}
