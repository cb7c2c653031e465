//! reCAPTCHA token verification
//!
//! Posts the site secret, the caller's IP and the widget token to Google's
//! `siteverify` endpoint and decodes the verdict. The request is not retried
//! and carries no timeout of its own beyond the HTTP client defaults.

use async_trait::async_trait;

use crate::types::VerificationResult;
use crate::VerificationError;

/// Google reCAPTCHA verification endpoint
pub const RECAPTCHA_VERIFY_URL: &str = "https://www.google.com/recaptcha/api/siteverify";

/// Anything that can judge a captcha token
#[async_trait]
pub trait Verifier: Send + Sync {
    /// Verify `response` (the widget token) presented from `remote_ip`
    async fn verify(
        &self,
        remote_ip: &str,
        response: &str,
    ) -> Result<VerificationResult, VerificationError>;
}

/// HTTP client for the reCAPTCHA `siteverify` API
pub struct RecaptchaClient {
    /// Site secret sent as `secret`
    secret: String,

    /// Verification URL
    endpoint: String,

    /// HTTP client
    http_client: reqwest::Client,
}

impl RecaptchaClient {
    /// Create a client for Google's public endpoint
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            endpoint: RECAPTCHA_VERIFY_URL.to_string(),
            http_client: reqwest::Client::new(),
        }
    }

    /// Point the client at a different verification URL
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Verification URL in use
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl std::fmt::Debug for RecaptchaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecaptchaClient")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Verifier for RecaptchaClient {
    async fn verify(
        &self,
        remote_ip: &str,
        response: &str,
    ) -> Result<VerificationResult, VerificationError> {
        let params = [
            ("secret", self.secret.as_str()),
            ("remoteip", remote_ip),
            ("response", response),
        ];

        let resp = self
            .http_client
            .post(&self.endpoint)
            .form(&params)
            .send()
            .await
            .map_err(|e| VerificationError::Transport(e.to_string()))?;

        let body = resp
            .bytes()
            .await
            .map_err(|e| VerificationError::Read(e.to_string()))?;

        let result: VerificationResult = serde_json::from_slice(&body)
            .map_err(|e| VerificationError::Decode(e.to_string()))?;

        tracing::debug!(
            success = result.success,
            score = result.score,
            hostname = %result.hostname,
            "recaptcha verdict"
        );

        Ok(result)
    }
}
