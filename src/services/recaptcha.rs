//! reCAPTCHA verification
//!
//! Validates client tokens against the Google siteverify endpoint.
//! Verification is advisory: requests are allowed through when no token
//! is supplied or when the verification service itself is unreachable.

use crate::providers::build_http_client;
use crate::utils::error::AppResult;
use serde::Deserialize;
use tracing::{info, warn};

/// Token verifier backed by the siteverify API
pub struct RecaptchaVerifier {
    client: reqwest::Client,
    verify_url: String,
    secret: Option<String>,
    min_score: f64,
}

#[derive(Debug, Deserialize)]
struct SiteverifyResponse {
    success: bool,
    #[serde(default)]
    score: Option<f64>,
    #[serde(rename = "error-codes", default)]
    error_codes: Vec<String>,
}

impl RecaptchaVerifier {
    pub fn new(
        verify_url: impl Into<String>,
        secret: Option<String>,
        min_score: f64,
        timeout_secs: u64,
    ) -> AppResult<Self> {
        Ok(Self {
            client: build_http_client(timeout_secs)?,
            verify_url: verify_url.into(),
            secret,
            min_score,
        })
    }

    /// Verify a client token
    ///
    /// Returns `None` when no secret is configured (verification is
    /// disabled entirely), otherwise the verification outcome. A missing
    /// token and a verification transport failure both pass.
    pub async fn verify(&self, token: Option<&str>) -> Option<bool> {
        let secret = self.secret.as_deref()?;

        let token = match token {
            Some(token) if !token.is_empty() => token,
            _ => return Some(true),
        };

        match self.check(secret, token).await {
            Ok(verified) => Some(verified),
            Err(e) => {
                warn!("reCAPTCHA verification unavailable, allowing request: {}", e);
                Some(true)
            }
        }
    }

    async fn check(&self, secret: &str, token: &str) -> AppResult<bool> {
        let response = self
            .client
            .post(&self.verify_url)
            .form(&[("secret", secret), ("response", token)])
            .send()
            .await?;

        let body: SiteverifyResponse = response.json().await?;

        if !body.success {
            info!("reCAPTCHA rejected token: {:?}", body.error_codes);
            return Ok(false);
        }

        if let Some(score) = body.score {
            if score < self.min_score {
                info!("reCAPTCHA score {} below threshold {}", score, self.min_score);
                return Ok(false);
            }
        }

        Ok(true)
    }
}
