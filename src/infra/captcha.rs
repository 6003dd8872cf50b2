//! Cloudflare Turnstile token verification.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};

use crate::application::contact::{CaptchaError, CaptchaVerifier};
use crate::infra::error::InfraError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Serialize)]
struct VerifyRequest<'a> {
    secret: &'a str,
    response: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    remoteip: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    success: bool,
    #[serde(default, rename = "error-codes")]
    error_codes: Vec<String>,
}

#[derive(Clone)]
pub struct TurnstileVerifier {
    client: Client,
    verify_url: Url,
    secret: String,
}

impl TurnstileVerifier {
    pub fn new(verify_url: Url, secret: String) -> Result<Self, InfraError> {
        let client = Client::builder()
            .user_agent(concat!("meridian/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| InfraError::http_client(err.to_string()))?;
        Ok(Self {
            client,
            verify_url,
            secret,
        })
    }
}

/// Provider-side failures that say nothing about the visitor's token.
fn is_provider_fault(codes: &[String]) -> bool {
    codes.iter().any(|code| {
        matches!(
            code.as_str(),
            "missing-input-secret" | "invalid-input-secret" | "internal-error"
        )
    })
}

#[async_trait]
impl CaptchaVerifier for TurnstileVerifier {
    async fn verify(&self, token: &str, remote_ip: Option<&str>) -> Result<bool, CaptchaError> {
        let body = VerifyRequest {
            secret: &self.secret,
            response: token,
            remoteip: remote_ip,
        };

        let response = self
            .client
            .post(self.verify_url.clone())
            .json(&body)
            .send()
            .await
            .map_err(|err| CaptchaError(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CaptchaError(format!("verifier returned status {status}")));
        }

        let outcome: VerifyResponse = response
            .json()
            .await
            .map_err(|err| CaptchaError(err.to_string()))?;

        if !outcome.success && is_provider_fault(&outcome.error_codes) {
            return Err(CaptchaError(outcome.error_codes.join(", ")));
        }
        Ok(outcome.success)
    }
}
