//! Speech synthesis over HTTP.

use async_trait::async_trait;
use parley_core::{SpeechSynthesizer, SynthesisError};
use serde::Serialize;
use tracing::debug;
use url::Url;

use crate::error::HttpResult;
use crate::http::{HttpBackend, ReqwestBackend};

#[derive(Serialize)]
struct SynthesisRequest<'a> {
    text: &'a str,
}

/// Posts `{"text": ...}` to a TTS endpoint and returns the encoded audio.
pub struct HttpSpeechSynthesizer<B: HttpBackend> {
    backend: B,
    endpoint: Url,
}

/// The synthesizer used in production.
pub type DefaultSpeechSynthesizer = HttpSpeechSynthesizer<ReqwestBackend>;

impl<B: HttpBackend> HttpSpeechSynthesizer<B> {
    /// Create a synthesizer that posts to `endpoint`.
    pub fn with_backend(backend: B, endpoint: &str) -> HttpResult<Self> {
        Ok(Self {
            backend,
            endpoint: Url::parse(endpoint)?,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl<B: HttpBackend> SpeechSynthesizer for HttpSpeechSynthesizer<B> {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, SynthesisError> {
        let body = serde_json::to_value(SynthesisRequest { text })
            .map_err(|e| SynthesisError::Transport(e.to_string()))?;

        let audio = self.backend.post_json(&self.endpoint, &body).await?;
        if audio.is_empty() {
            return Err(SynthesisError::EmptyPayload);
        }

        debug!(chars = text.len(), bytes = audio.len(), "Synthesized speech");
        Ok(audio)
    }
}
