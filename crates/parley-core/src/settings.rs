//! Settings domain types and validation.
//!
//! These are pure domain types with no infrastructure dependencies. Every
//! field is optional so partial configuration (from flags, environment or a
//! file) falls back to sensible defaults through the `effective_*` getters.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default quiet period before a spoken transcript counts as complete.
pub const DEFAULT_DEBOUNCE_MS: u64 = 1000;

/// Default delay before listening resumes after a voice turn ends.
pub const DEFAULT_RESTART_DELAY_MS: u64 = 1000;

/// Default timeout for response and synthesis requests.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

pub const DEFAULT_TTS_URL: &str = "http://localhost:3000/api/tts";
pub const DEFAULT_RESPONSE_URL: &str = "http://localhost:3000/api/chat";

/// Which wire protocol the response service speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseBackend {
    /// `POST {"message": text}` → `{"content": reply}`.
    #[default]
    Simple,
    /// OpenAI-compatible `/v1/chat/completions`.
    OpenAi,
}

impl ResponseBackend {
    /// Parse a backend name (`"simple"` | `"openai"`).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "simple" => Some(Self::Simple),
            "openai" => Some(Self::OpenAi),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::OpenAi => "openai",
        }
    }
}

/// Application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Quiet period (ms) after the last speech update before the transcript
    /// is submitted.
    pub debounce_ms: Option<u64>,

    /// Delay (ms) before listening automatically resumes after a voice turn.
    pub restart_delay_ms: Option<u64>,

    /// Speech synthesis endpoint (`POST {"text": ...}` → audio bytes).
    pub tts_url: Option<String>,

    /// Response service protocol.
    pub response_backend: Option<ResponseBackend>,

    /// Response service endpoint. For the OpenAI backend this is the base
    /// URL (e.g. `http://localhost:8080/v1`).
    pub response_url: Option<String>,

    /// Model name sent to OpenAI-compatible backends.
    pub model: Option<String>,

    /// System prompt prepended to OpenAI-compatible conversations.
    pub system_prompt: Option<String>,

    /// Timeout for response and synthesis requests, in seconds.
    pub request_timeout_secs: Option<u64>,

    /// Bearer token for the response service, if it needs one.
    pub api_key: Option<String>,
}

impl Settings {
    /// Create settings with sensible defaults.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self {
            debounce_ms: Some(DEFAULT_DEBOUNCE_MS),
            restart_delay_ms: Some(DEFAULT_RESTART_DELAY_MS),
            tts_url: Some(DEFAULT_TTS_URL.to_string()),
            response_backend: Some(ResponseBackend::Simple),
            response_url: Some(DEFAULT_RESPONSE_URL.to_string()),
            model: None,
            system_prompt: None,
            request_timeout_secs: Some(DEFAULT_REQUEST_TIMEOUT_SECS),
            api_key: None,
        }
    }

    #[must_use]
    pub fn effective_debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms.unwrap_or(DEFAULT_DEBOUNCE_MS))
    }

    #[must_use]
    pub fn effective_restart_delay(&self) -> Duration {
        Duration::from_millis(self.restart_delay_ms.unwrap_or(DEFAULT_RESTART_DELAY_MS))
    }

    #[must_use]
    pub fn effective_request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.request_timeout_secs
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        )
    }

    #[must_use]
    pub fn effective_tts_url(&self) -> &str {
        self.tts_url.as_deref().unwrap_or(DEFAULT_TTS_URL)
    }

    #[must_use]
    pub fn effective_response_url(&self) -> &str {
        self.response_url.as_deref().unwrap_or(DEFAULT_RESPONSE_URL)
    }

    #[must_use]
    pub fn effective_response_backend(&self) -> ResponseBackend {
        self.response_backend.unwrap_or_default()
    }

    /// Overlay every `Some` field of `other` onto `self`.
    pub fn merge(&mut self, other: &Self) {
        if other.debounce_ms.is_some() {
            self.debounce_ms = other.debounce_ms;
        }
        if other.restart_delay_ms.is_some() {
            self.restart_delay_ms = other.restart_delay_ms;
        }
        if other.tts_url.is_some() {
            self.tts_url.clone_from(&other.tts_url);
        }
        if other.response_backend.is_some() {
            self.response_backend = other.response_backend;
        }
        if other.response_url.is_some() {
            self.response_url.clone_from(&other.response_url);
        }
        if other.model.is_some() {
            self.model.clone_from(&other.model);
        }
        if other.system_prompt.is_some() {
            self.system_prompt.clone_from(&other.system_prompt);
        }
        if other.request_timeout_secs.is_some() {
            self.request_timeout_secs = other.request_timeout_secs;
        }
        if other.api_key.is_some() {
            self.api_key.clone_from(&other.api_key);
        }
    }
}

/// Settings validation error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SettingsError {
    #[error("Debounce interval must be between 100 and 10,000 ms, got {0}")]
    InvalidDebounce(u64),

    #[error("Restart delay must be at most 10,000 ms, got {0}")]
    InvalidRestartDelay(u64),

    #[error("Request timeout must be between 1 and 600 seconds, got {0}")]
    InvalidTimeout(u64),

    #[error("{field} must be an http(s) URL, got '{value}'")]
    InvalidUrl { field: &'static str, value: String },

    #[error("The OpenAI backend needs a model name")]
    MissingModel,
}

/// Validate settings values.
pub fn validate_settings(settings: &Settings) -> Result<(), SettingsError> {
    if let Some(ms) = settings.debounce_ms {
        if !(100..=10_000).contains(&ms) {
            return Err(SettingsError::InvalidDebounce(ms));
        }
    }

    if let Some(ms) = settings.restart_delay_ms {
        if ms > 10_000 {
            return Err(SettingsError::InvalidRestartDelay(ms));
        }
    }

    if let Some(secs) = settings.request_timeout_secs {
        if !(1..=600).contains(&secs) {
            return Err(SettingsError::InvalidTimeout(secs));
        }
    }

    check_url("tts_url", settings.tts_url.as_deref())?;
    check_url("response_url", settings.response_url.as_deref())?;

    if settings.effective_response_backend() == ResponseBackend::OpenAi
        && settings
            .model
            .as_ref()
            .is_none_or(|m| m.trim().is_empty())
    {
        return Err(SettingsError::MissingModel);
    }

    Ok(())
}

fn check_url(field: &'static str, value: Option<&str>) -> Result<(), SettingsError> {
    match value {
        Some(url) if !(url.starts_with("http://") || url.starts_with("https://")) => {
            Err(SettingsError::InvalidUrl {
                field,
                value: url.to_string(),
            })
        }
        _ => Ok(()),
    }
}
