//! Logging middleware
//!
//! Records HTTP request and response information

use axum::{
    extract::Request,
    http::{HeaderMap, Method, Uri},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

/// Request logging middleware
///
/// Records detailed information for each HTTP request
pub async fn request_logging_middleware(
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Response {
    let start_time = Instant::now();
    let request_id = Uuid::new_v4().to_string();

    // Create request span
    let span = tracing::info_span!(
        "http_request",
        request_id = %request_id,
        method = %method,
        path = %uri.path(),
        query = %uri.query().unwrap_or(""),
    );

    let _enter = span.enter();

    // Log request start
    info!(
        "Request started: {} {} - Provider: {} - User-Agent: {}",
        method,
        uri,
        headers
            .get("x-provider")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("openai"),
        headers
            .get("user-agent")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown")
    );

    // Execute request
    let response = next.run(request).await;

    // Calculate processing time
    let duration = start_time.elapsed();
    let status = response.status();

    // Log response
    if status.is_success() {
        info!(
            "Request completed: {} - Duration: {:.2}ms",
            status,
            duration.as_secs_f64() * 1000.0
        );
    } else if status.is_client_error() {
        warn!(
            "Client error: {} - Duration: {:.2}ms",
            status,
            duration.as_secs_f64() * 1000.0
        );
    } else if status.is_server_error() {
        warn!(
            "Server error: {} - Duration: {:.2}ms",
            status,
            duration.as_secs_f64() * 1000.0
        );
    } else {
        info!(
            "Request response: {} - Duration: {:.2}ms",
            status,
            duration.as_secs_f64() * 1000.0
        );
    }

    // Log slow requests
    if duration.as_secs() > 5 {
        warn!(
            "Slow request detected: {} {} - Duration: {:.2}s",
            method,
            uri,
            duration.as_secs_f64()
        );
    }

    response
}

/// Get client IP address
///
/// Rate limiting keys off this value, so the order matters: the
/// platform-set client-ip header wins over forwarding chains.
pub fn get_client_ip(headers: &HeaderMap) -> Option<String> {
    // Check different IP headers by priority
    let ip_headers = [
        "client-ip",
        "x-forwarded-for",
        "x-real-ip",
        "cf-connecting-ip", // Cloudflare
    ];

    for header_name in &ip_headers {
        if let Some(header_value) = headers.get(*header_name) {
            if let Ok(ip_str) = header_value.to_str() {
                // X-Forwarded-For may contain multiple IPs, take the first one
                if let Some(first_ip) = ip_str.split(',').next() {
                    let ip = first_ip.trim();
                    if !ip.is_empty() && ip != "unknown" {
                        return Some(ip.to_string());
                    }
                }
            }
        }
    }

    None
}
