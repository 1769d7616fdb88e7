//! REST client for the Gemini `generateContent` endpoint.
//!
//! Wraps `POST {base}/v1beta/models/{model}:generateContent` using
//! [`reqwest`], retrying transient transport errors and statuses.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;

use crate::config::GeminiConfig;
use crate::messages::{GenerateContentRequest, GenerateContentResponse};
use crate::{GenerativeModel, InlineImage, ReferenceImage};

const RETRY_BASE_DELAY_MS: u64 = 900;

/// Longest error body kept in [`GeminiError::Api`].
const MAX_ERROR_BODY_CHARS: usize = 2000;

/// Errors from the Gemini REST layer.
#[derive(Debug, thiserror::Error)]
pub enum GeminiError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    /// The message has the API key redacted.
    #[error("Gemini request failed: {0}")]
    Request(String),

    /// Gemini returned a non-2xx status code.
    #[error("Gemini API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// The response body was not the expected JSON.
    #[error("Gemini response could not be decoded: {0}")]
    Decode(String),
}

/// HTTP client for the Gemini API.
pub struct GeminiClient {
    client: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, config: GeminiConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.config.base_url, model, self.config.api_key
        )
    }

    fn redact(&self, text: &str) -> String {
        redact_key(text, &self.config.api_key)
    }

    /// Send one request, retrying transient failures up to
    /// `max_attempts` times in total.
    async fn call(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, GeminiError> {
        let url = self.endpoint(model);
        let max_attempts = self.config.max_attempts.max(1);

        let mut attempt = 0usize;
        loop {
            attempt += 1;
            let sent = self
                .client
                .post(&url)
                .timeout(self.config.timeout)
                .json(request)
                .send()
                .await;

            let response = match sent {
                Ok(response) => response,
                Err(err) => {
                    let message = self.redact(&err.to_string());
                    let retrying = should_retry_error(&err) && attempt < max_attempts;
                    tracing::warn!(
                        model,
                        attempt,
                        timeout = err.is_timeout(),
                        connect = err.is_connect(),
                        retrying,
                        error = %message,
                        "Gemini request failed to send",
                    );
                    if retrying {
                        tokio::time::sleep(retry_delay(attempt)).await;
                        continue;
                    }
                    return Err(GeminiError::Request(message));
                }
            };

            let status = response.status();
            if !status.is_success() {
                let body = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "<unreadable body>".to_string());
                let body = truncate(&self.redact(&body), MAX_ERROR_BODY_CHARS);
                let retrying = should_retry_status(status) && attempt < max_attempts;
                tracing::warn!(
                    model,
                    attempt,
                    status = status.as_u16(),
                    retrying,
                    "Gemini API error",
                );
                if retrying {
                    tokio::time::sleep(retry_delay(attempt)).await;
                    continue;
                }
                return Err(GeminiError::Api {
                    status: status.as_u16(),
                    body,
                });
            }

            return response
                .json::<GenerateContentResponse>()
                .await
                .map_err(|e| GeminiError::Decode(self.redact(&e.to_string())));
        }
    }
}

#[async_trait]
impl GenerativeModel for GeminiClient {
    async fn generate_text(
        &self,
        prompt: &str,
        images: &[ReferenceImage],
    ) -> Result<String, GeminiError> {
        let request = GenerateContentRequest::user_turn(prompt, images);
        let started = std::time::Instant::now();
        let response = self.call(&self.config.text_model, &request).await?;
        let text = response.text();
        tracing::debug!(
            model = %self.config.text_model,
            references = images.len(),
            chars = text.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Gemini text generated",
        );
        Ok(text)
    }

    async fn generate_image(
        &self,
        prompt: &str,
        images: &[ReferenceImage],
    ) -> Result<Option<InlineImage>, GeminiError> {
        let request = GenerateContentRequest::user_turn(prompt, images).with_image_output();
        let started = std::time::Instant::now();
        let response = self.call(&self.config.image_model, &request).await?;
        let image = response.first_image();
        tracing::debug!(
            model = %self.config.image_model,
            references = images.len(),
            has_image = image.is_some(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Gemini image generated",
        );
        Ok(image)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn should_retry_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect()
}

fn should_retry_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
        || status.is_server_error()
}

/// Linear back-off: 900ms after the first attempt, 1800ms after the second.
fn retry_delay(attempt: usize) -> Duration {
    let attempt = attempt.max(1) as u64;
    Duration::from_millis(RETRY_BASE_DELAY_MS.saturating_mul(attempt))
}

fn redact_key(text: &str, key: &str) -> String {
    let key = key.trim();
    if key.is_empty() {
        return text.to_string();
    }
    text.replace(key, "[redacted]")
}

fn truncate(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let mut out: String = text.chars().take(limit).collect();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retries_only_transient_statuses() {
        assert!(should_retry_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(should_retry_status(StatusCode::REQUEST_TIMEOUT));
        assert!(should_retry_status(StatusCode::SERVICE_UNAVAILABLE));
        assert!(!should_retry_status(StatusCode::BAD_REQUEST));
        assert!(!should_retry_status(StatusCode::FORBIDDEN));
    }

    #[test]
    fn delay_grows_linearly() {
        assert_eq!(retry_delay(0), Duration::from_millis(900));
        assert_eq!(retry_delay(1), Duration::from_millis(900));
        assert_eq!(retry_delay(2), Duration::from_millis(1800));
    }

    #[test]
    fn key_is_redacted() {
        assert_eq!(
            redact_key("GET /models?key=sekret failed", "sekret"),
            "GET /models?key=[redacted] failed"
        );
        assert_eq!(redact_key("no key here", "  "), "no key here");
    }

    #[test]
    fn endpoint_includes_model_and_key() {
        let mut config = GeminiConfig::new("k");
        config.base_url = "http://localhost:9".to_string();
        let client = GeminiClient::new(config);
        assert_eq!(
            client.endpoint("gemini-2.5-flash"),
            "http://localhost:9/v1beta/models/gemini-2.5-flash:generateContent?key=k"
        );
    }

    #[test]
    fn long_bodies_are_truncated() {
        let body = "x".repeat(10);
        assert_eq!(truncate(&body, 4), "xxxx...");
        assert_eq!(truncate("short", 10), "short");
    }
}
