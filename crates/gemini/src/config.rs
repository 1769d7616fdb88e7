use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.0-flash-preview-image-generation";

/// Gemini connection settings.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    /// Scheme and host, without the `/v1beta` path.
    pub base_url: String,
    pub text_model: String,
    pub image_model: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Total attempts per call, including the first.
    pub max_attempts: usize,
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            timeout: Duration::from_secs(120),
            max_attempts: 2,
        }
    }

    /// Load from environment variables.
    ///
    /// Returns `None` when `GEMINI_API_KEY` is unset or blank; the server
    /// still starts and AI endpoints answer 503.
    ///
    /// | Env var               | Default                                       |
    /// |-----------------------|-----------------------------------------------|
    /// | `GEMINI_API_KEY`      | (required)                                    |
    /// | `GEMINI_BASE_URL`     | `https://generativelanguage.googleapis.com`   |
    /// | `GEMINI_TEXT_MODEL`   | `gemini-2.5-flash`                            |
    /// | `GEMINI_IMAGE_MODEL`  | `gemini-2.0-flash-preview-image-generation`   |
    /// | `GEMINI_TIMEOUT_SECS` | `120`                                         |
    /// | `GEMINI_MAX_ATTEMPTS` | `2`                                           |
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("GEMINI_API_KEY").ok()?;
        if api_key.trim().is_empty() {
            return None;
        }

        let defaults = Self::new(api_key.trim());

        let timeout_secs: u64 = std::env::var("GEMINI_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.timeout.as_secs());

        let max_attempts: usize = std::env::var("GEMINI_MAX_ATTEMPTS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.max_attempts);

        Some(Self {
            base_url: std::env::var("GEMINI_BASE_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            text_model: std::env::var("GEMINI_TEXT_MODEL").unwrap_or(defaults.text_model),
            image_model: std::env::var("GEMINI_IMAGE_MODEL").unwrap_or(defaults.image_model),
            timeout: Duration::from_secs(timeout_secs),
            max_attempts: max_attempts.max(1),
            api_key: defaults.api_key,
        })
    }
}
