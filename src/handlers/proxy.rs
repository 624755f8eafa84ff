//! Proxy handlers
//!
//! The single proxy endpoint that fingerprints the caller, enforces the
//! rate limit and forwards normalized chat, image and transcription
//! requests to the selected provider, plus the rate limit status probe.

use crate::handlers::AppState;
use crate::middleware::logging::get_client_ip;
use crate::models::chat::{ChatRequest, ImageRequest, TranscriptionRequest};
use crate::providers::ProviderKind;
use crate::services::rate_limit::{is_local_address, RateLimitStatus};
use crate::usage::{estimate_cost, UsageEvent};
use crate::utils::error::{AppError, AppResult};
use crate::utils::fingerprint;
use axum::{
    extract::{FromRequest, Multipart, Request, State},
    http::{HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tracing::{debug, warn};

/// Validation message for malformed generation requests
const INVALID_REQUEST_MESSAGE: &str = "Invalid request. 'model' and 'messages' are required.";

/// Handle proxy requests
///
/// POST / (or /image)
///
/// Every request is counted against the caller's fingerprint before it
/// is dispatched; local development addresses are counted but never
/// blocked.
pub async fn handle_proxy(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    request: Request,
) -> Response {
    if request.method() != Method::POST {
        return AppError::MethodNotAllowed.into_response();
    }

    let client = identify_client(&headers);
    let status = state
        .limiter
        .register(&client.fingerprint, reported_call_count(&headers));

    if status.exceeded() && !client.local {
        warn!(
            "Rate limit exceeded for fingerprint {}: {} of {}",
            fingerprint::short(&client.fingerprint),
            status.used,
            status.limit
        );
        let mut response = AppError::RateLimited {
            limit: status.limit,
            reset: status.reset,
        }
        .into_response();
        apply_rate_limit_headers(response.headers_mut(), &status);
        apply_fingerprint_header(response.headers_mut(), &client.fingerprint);
        return response;
    }

    // Advisory verification, skipped for local callers
    let recaptcha_verified = if client.local {
        None
    } else {
        state
            .recaptcha
            .verify(header_str(&headers, "x-recaptcha-token"))
            .await
    };

    match route_request(&state, &headers, request).await {
        Ok(mut response) => {
            apply_rate_limit_headers(response.headers_mut(), &status);
            apply_fingerprint_header(response.headers_mut(), &client.fingerprint);
            if let Some(verified) = recaptcha_verified {
                apply_recaptcha_header(response.headers_mut(), verified);
            }
            response
        }
        Err(error) => error.into_response(),
    }
}

/// Report the caller's current rate limit window
///
/// GET /rate-limit-status
pub async fn rate_limit_status(
    State(state): State<Arc<AppState>>,
    method: Method,
    headers: HeaderMap,
) -> Response {
    if method != Method::GET {
        return AppError::MethodNotAllowed.into_response();
    }

    let client = identify_client(&headers);
    let status = state
        .limiter
        .peek(&client.fingerprint, reported_call_count(&headers));

    let body = serde_json::json!({
        "limit": status.limit,
        "remaining": status.remaining,
        "used": status.used,
        "reset": status.reset.to_rfc3339(),
    });

    let mut response = (StatusCode::OK, Json(body)).into_response();
    apply_rate_limit_headers(response.headers_mut(), &status);
    apply_fingerprint_header(response.headers_mut(), &client.fingerprint);
    response
}

/// Resolved caller identity
struct ClientIdentity {
    fingerprint: String,
    local: bool,
}

/// Derive the caller's fingerprint from its address and user agent
fn identify_client(headers: &HeaderMap) -> ClientIdentity {
    let ip = get_client_ip(headers).unwrap_or_else(|| "unknown-ip".to_string());
    let user_agent = header_str(headers, "user-agent").unwrap_or("unknown-user-agent");

    ClientIdentity {
        fingerprint: fingerprint::client_fingerprint(&ip, user_agent),
        local: is_local_address(&ip),
    }
}

/// Route a request to the matching dispatch branch
async fn route_request(
    state: &Arc<AppState>,
    headers: &HeaderMap,
    request: Request,
) -> AppResult<Response> {
    let provider = ProviderKind::from_header(header_str(headers, "x-provider"))?;
    let api_key = state
        .dispatcher
        .resolve_api_key(provider, header_str(headers, "x-api-key"))?;
    let app_id = header_str(headers, "x-app-id")
        .unwrap_or("unknown-app")
        .to_string();

    // Audio uploads arrive as multipart bodies
    let content_type = header_str(headers, "content-type").unwrap_or("");
    if content_type.starts_with("multipart/form-data") {
        let multipart = Multipart::from_request(request, &())
            .await
            .map_err(|e| AppError::Validation(format!("Invalid multipart request: {}", e)))?;
        let transcription = read_transcription(multipart).await?;

        debug!(
            "Proxying transcription request for model {}",
            transcription.model
        );
        let response = state.dispatcher.transcribe(transcription, &api_key).await?;
        return Ok(Json(response).into_response());
    }

    let is_image = provider == ProviderKind::Image
        || header_str(headers, "x-request-type") == Some("image")
        || request.uri().path().ends_with("/image");

    let body = axum::body::to_bytes(request.into_body(), state.settings.request.max_request_size)
        .await
        .map_err(|e| AppError::Validation(format!("Failed to read request body: {}", e)))?;
    let value: serde_json::Value = serde_json::from_slice(&body)
        .map_err(|_| AppError::Validation(INVALID_REQUEST_MESSAGE.to_string()))?;

    if is_image {
        serve_image(state, value, &api_key).await
    } else {
        serve_chat(state, provider, value, &api_key, &app_id).await
    }
}

/// Validate and dispatch a chat completion request
async fn serve_chat(
    state: &Arc<AppState>,
    provider: ProviderKind,
    value: serde_json::Value,
    api_key: &str,
    app_id: &str,
) -> AppResult<Response> {
    let has_model = value
        .get("model")
        .and_then(|model| model.as_str())
        .map(|model| !model.is_empty())
        .unwrap_or(false);
    let has_messages = value
        .get("messages")
        .map(|messages| messages.is_array())
        .unwrap_or(false);
    if !has_model || !has_messages {
        return Err(AppError::Validation(INVALID_REQUEST_MESSAGE.to_string()));
    }

    let request: ChatRequest = serde_json::from_value(value)
        .map_err(|_| AppError::Validation(INVALID_REQUEST_MESSAGE.to_string()))?;

    debug!(
        "Proxying chat request to {} for model {}",
        provider, request.model
    );
    let response = state
        .dispatcher
        .dispatch_chat(provider, &request, api_key)
        .await?;

    let input_tokens = response.usage.prompt_tokens as u64;
    let output_tokens = response.usage.completion_tokens as u64;
    state.usage.record(UsageEvent::new(
        provider.as_str(),
        app_id,
        &request.model,
        input_tokens,
        output_tokens,
        estimate_cost(&request.model, input_tokens, output_tokens),
    ));

    Ok(Json(response).into_response())
}

/// Validate and dispatch an image generation request
async fn serve_image(
    state: &Arc<AppState>,
    value: serde_json::Value,
    api_key: &str,
) -> AppResult<Response> {
    let has_prompt = value
        .get("prompt")
        .and_then(|prompt| prompt.as_str())
        .map(|prompt| !prompt.is_empty())
        .unwrap_or(false);
    if !has_prompt {
        return Err(AppError::Validation(INVALID_REQUEST_MESSAGE.to_string()));
    }

    let request: ImageRequest = serde_json::from_value(value)
        .map_err(|_| AppError::Validation(INVALID_REQUEST_MESSAGE.to_string()))?;

    debug!("Proxying image generation request");
    let response = state.dispatcher.dispatch_image(&request, api_key).await?;
    Ok(Json(response).into_response())
}

/// Assemble a transcription request from a multipart upload
async fn read_transcription(mut multipart: Multipart) -> AppResult<TranscriptionRequest> {
    let mut data: Option<Vec<u8>> = None;
    let mut file_name = TranscriptionRequest::DEFAULT_FILE_NAME.to_string();
    let mut model = TranscriptionRequest::DEFAULT_MODEL.to_string();
    let mut language = TranscriptionRequest::DEFAULT_LANGUAGE.to_string();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart request: {}", e)))?
    {
        match field.name().unwrap_or("") {
            "file" | "audio" => {
                if let Some(name) = field.file_name() {
                    file_name = name.to_string();
                }
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Invalid audio upload: {}", e)))?;
                data = Some(bytes.to_vec());
            }
            "model" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Invalid multipart field: {}", e)))?;
                if !text.is_empty() {
                    model = text;
                }
            }
            "language" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Invalid multipart field: {}", e)))?;
                if !text.is_empty() {
                    language = text;
                }
            }
            _ => {}
        }
    }

    let data = data.ok_or_else(|| {
        AppError::Validation("Invalid request. An audio file is required.".to_string())
    })?;

    Ok(TranscriptionRequest {
        data,
        file_name,
        model,
        language,
    })
}

/// Read a header value as a string
fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

/// Parse the caller's self-reported call count
fn reported_call_count(headers: &HeaderMap) -> u32 {
    header_str(headers, "x-api-call-count")
        .and_then(|value| value.parse().ok())
        .unwrap_or(0)
}

fn apply_rate_limit_headers(headers: &mut HeaderMap, status: &RateLimitStatus) {
    insert_header(headers, "x-ratelimit-limit", &status.limit.to_string());
    insert_header(headers, "x-ratelimit-remaining", &status.remaining.to_string());
    insert_header(headers, "x-ratelimit-used", &status.used.to_string());
    insert_header(headers, "x-ratelimit-reset", &status.reset.to_rfc3339());
}

fn apply_fingerprint_header(headers: &mut HeaderMap, client_fingerprint: &str) {
    insert_header(headers, "x-fingerprint", fingerprint::short(client_fingerprint));
}

fn apply_recaptcha_header(headers: &mut HeaderMap, verified: bool) {
    insert_header(
        headers,
        "x-recaptcha-verified",
        if verified { "true" } else { "false" },
    );
}

fn insert_header(headers: &mut HeaderMap, name: &'static str, value: &str) {
    if let Ok(value) = HeaderValue::from_str(value) {
        headers.insert(name, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identify_client_is_deterministic() {
        let mut headers = HeaderMap::new();
        headers.insert("client-ip", "203.0.113.9".parse().unwrap());
        headers.insert("user-agent", "Mozilla/5.0".parse().unwrap());

        let first = identify_client(&headers);
        let second = identify_client(&headers);

        assert_eq!(first.fingerprint, second.fingerprint);
        assert!(!first.local);
        assert_eq!(
            first.fingerprint,
            fingerprint::client_fingerprint("203.0.113.9", "Mozilla/5.0")
        );
    }

    #[test]
    fn test_identify_client_falls_back_to_unknown() {
        let headers = HeaderMap::new();
        let client = identify_client(&headers);

        assert_eq!(
            client.fingerprint,
            fingerprint::client_fingerprint("unknown-ip", "unknown-user-agent")
        );
        assert!(!client.local);
    }

    #[test]
    fn test_identify_client_flags_local_addresses() {
        let mut headers = HeaderMap::new();
        headers.insert("client-ip", "127.0.0.1".parse().unwrap());

        assert!(identify_client(&headers).local);
    }

    #[test]
    fn test_reported_call_count_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(reported_call_count(&headers), 0);

        headers.insert("x-api-call-count", "7".parse().unwrap());
        assert_eq!(reported_call_count(&headers), 7);

        headers.insert("x-api-call-count", "not-a-number".parse().unwrap());
        assert_eq!(reported_call_count(&headers), 0);
    }

    #[test]
    fn test_rate_limit_headers_are_applied() {
        let status = RateLimitStatus {
            limit: 10,
            used: 3,
            remaining: 7,
            reset: chrono::Utc::now(),
            fingerprint: "abc123".to_string(),
        };

        let mut headers = HeaderMap::new();
        apply_rate_limit_headers(&mut headers, &status);

        assert_eq!(headers.get("x-ratelimit-limit").unwrap(), "10");
        assert_eq!(headers.get("x-ratelimit-remaining").unwrap(), "7");
        assert_eq!(headers.get("x-ratelimit-used").unwrap(), "3");
        assert!(headers.contains_key("x-ratelimit-reset"));
    }

    #[test]
    fn test_fingerprint_header_is_truncated() {
        let full = fingerprint::client_fingerprint("203.0.113.9", "agent");
        let mut headers = HeaderMap::new();
        apply_fingerprint_header(&mut headers, &full);

        let value = headers.get("x-fingerprint").unwrap().to_str().unwrap();
        assert_eq!(value.len(), 8);
        assert!(full.starts_with(value));
    }
}
