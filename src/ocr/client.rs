//! Cloud OCR client — Baidu-style general text recognition over HTTP.
//!
//! Two-step protocol: exchange the API key pair for a short-lived access
//! token, then POST the base64 screenshot as a form field. Provider errors
//! arrive as `error_code`/`error_msg` inside a 200 body, so the client
//! inspects the payload before deserializing the recognition result.

use std::time::Duration;

use base64::Engine;
use serde::Deserialize;
use thiserror::Error;

use super::OcrResponse;

const TOKEN_URL: &str = "https://aip.baidubce.com/oauth/2.0/token";
const GENERAL_OCR_URL: &str = "https://aip.baidubce.com/rest/2.0/ocr/v1/general";

/// Errors surfaced by the OCR client.
///
/// Per-fragment problems never appear here — the reconstructor filters those.
/// These are whole-request failures only.
#[derive(Debug, Error)]
pub enum OcrError {
    #[error("OCR credentials not configured")]
    MissingCredentials,

    #[error("access token request failed: {0}")]
    Token(String),

    #[error("OCR request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("OCR provider error {code}: {message}")]
    Provider { code: i64, message: String },
}

/// Bounded retry for the surrounding network calls.
///
/// The reconstructor itself is deterministic and is never retried; only the
/// OCR fetch (and the non-streaming LLM call) go through this. The default
/// mirrors the source behavior: up to 3 attempts, no backoff. Callers wanting
/// spacing between attempts set `delay`.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::ZERO,
        }
    }
}

impl RetryPolicy {
    /// A single attempt, no retries. Used by connection tests.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            delay: Duration::ZERO,
        }
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error_description: Option<String>,
}

/// Client for the cloud OCR provider.
pub struct OcrClient {
    client: reqwest::Client,
    api_key: String,
    secret_key: String,
    retry: RetryPolicy,
}

impl OcrClient {
    pub fn new(api_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            secret_key: secret_key.into(),
            retry: RetryPolicy::default(),
        }
    }

    /// Build a client from `BAIDU_API_KEY` / `BAIDU_SECRET_KEY`.
    pub fn from_env() -> Result<Self, OcrError> {
        let api_key = std::env::var("BAIDU_API_KEY").unwrap_or_default();
        let secret_key = std::env::var("BAIDU_SECRET_KEY").unwrap_or_default();
        if api_key.is_empty() || secret_key.is_empty() {
            return Err(OcrError::MissingCredentials);
        }
        Ok(Self::new(api_key, secret_key))
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Recognize text in an image, retrying per the configured policy.
    pub async fn recognize(&self, image_bytes: &[u8]) -> Result<OcrResponse, OcrError> {
        let mut last_err = None;
        for attempt in 1..=self.retry.max_attempts.max(1) {
            match self.recognize_once(image_bytes).await {
                Ok(resp) => {
                    if attempt > 1 {
                        log::info!("[OCR] Succeeded on attempt {}", attempt);
                    }
                    return Ok(resp);
                }
                Err(OcrError::MissingCredentials) => return Err(OcrError::MissingCredentials),
                Err(e) => {
                    log::warn!("[OCR] Attempt {} failed: {}", attempt, e);
                    last_err = Some(e);
                    if !self.retry.delay.is_zero() {
                        tokio::time::sleep(self.retry.delay).await;
                    }
                }
            }
        }
        Err(last_err.unwrap_or(OcrError::MissingCredentials))
    }

    async fn recognize_once(&self, image_bytes: &[u8]) -> Result<OcrResponse, OcrError> {
        let token = self.fetch_access_token().await?;

        let start = std::time::Instant::now();
        let base64_image = base64::engine::general_purpose::STANDARD.encode(image_bytes);
        log::info!(
            "[OCR] Uploading image: {} bytes raw, {} bytes base64",
            image_bytes.len(),
            base64_image.len()
        );

        let response = self
            .client
            .post(format!("{}?access_token={}", GENERAL_OCR_URL, token))
            .form(&[("image", base64_image.as_str())])
            .send()
            .await?;

        let body: serde_json::Value = response.json().await?;
        log::info!("[OCR] Provider answered in {}ms", start.elapsed().as_millis());

        parse_recognition_body(body)
    }

    async fn fetch_access_token(&self) -> Result<String, OcrError> {
        log::debug!("[OCR] Requesting access token");
        let response = self
            .client
            .get(TOKEN_URL)
            .query(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.api_key.as_str()),
                ("client_secret", self.secret_key.as_str()),
            ])
            .send()
            .await?;

        let token: TokenResponse = response.json().await?;
        match token.access_token {
            Some(t) if !t.is_empty() => Ok(t),
            _ => Err(OcrError::Token(
                token
                    .error_description
                    .unwrap_or_else(|| "no access_token in response".to_string()),
            )),
        }
    }
}

/// Split a provider body into recognition result or typed provider error.
fn parse_recognition_body(body: serde_json::Value) -> Result<OcrResponse, OcrError> {
    if let Some(code) = body.get("error_code").and_then(|c| c.as_i64()) {
        let message = body
            .get("error_msg")
            .and_then(|m| m.as_str())
            .unwrap_or("unknown")
            .to_string();
        return Err(OcrError::Provider { code, message });
    }
    // Missing words_result is an empty recognition, not an error.
    Ok(serde_json::from_value(body).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_code_is_typed() {
        let body = serde_json::json!({"error_code": 17, "error_msg": "daily limit reached"});
        match parse_recognition_body(body) {
            Err(OcrError::Provider { code, message }) => {
                assert_eq!(code, 17);
                assert_eq!(message, "daily limit reached");
            }
            other => panic!("expected provider error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn missing_words_result_is_empty_response() {
        let body = serde_json::json!({"log_id": 99});
        let resp = parse_recognition_body(body).unwrap();
        assert!(resp.words_result.is_empty());
        assert_eq!(resp.log_id, 99);
    }

    #[test]
    fn recognition_body_parses() {
        let body = serde_json::json!({
            "words_result": [
                {"words": "hi", "location": {"left": 1, "top": 2, "width": 3, "height": 4}}
            ],
            "words_result_num": 1,
            "log_id": 7
        });
        let resp = parse_recognition_body(body).unwrap();
        assert_eq!(resp.words_result_num, 1);
        assert_eq!(resp.words_result[0].words, "hi");
    }

    #[test]
    fn default_retry_is_three_immediate_attempts() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert!(policy.delay.is_zero());
    }
}
