#![doc = include_str!("../README.md")]
#![deny(unused_crate_dependencies)]

mod error;
mod http;
mod openai;
mod simple;
mod tts;

use std::sync::Arc;

use parley_core::{ResponseBackend, ResponseService, Settings, SpeechSynthesizer};
use tracing::info;

pub use error::{HttpError, HttpResult};
pub use http::{HttpBackend, ReqwestBackend};
pub use openai::{DefaultOpenAiChatService, OpenAiChatService};
pub use simple::{DefaultResponseService, HttpResponseService};
pub use tts::{DefaultSpeechSynthesizer, HttpSpeechSynthesizer};

/// Build the speech synthesizer described by `settings`.
pub fn build_synthesizer(settings: &Settings) -> HttpResult<Arc<dyn SpeechSynthesizer>> {
    let backend = ReqwestBackend::new(settings.effective_request_timeout(), None)?;
    let synthesizer = HttpSpeechSynthesizer::with_backend(backend, settings.effective_tts_url())?;
    info!(endpoint = %synthesizer.endpoint(), "Speech synthesizer ready");
    Ok(Arc::new(synthesizer))
}

/// Build the response service described by `settings`.
///
/// Assumes `settings` already passed `validate_settings`; an OpenAI backend
/// without a model falls back to an empty model name and is rejected by the
/// server.
pub fn build_response_service(settings: &Settings) -> HttpResult<Arc<dyn ResponseService>> {
    let backend = ReqwestBackend::new(
        settings.effective_request_timeout(),
        settings.api_key.clone(),
    )?;
    let url = settings.effective_response_url();

    let service: Arc<dyn ResponseService> = match settings.effective_response_backend() {
        ResponseBackend::Simple => Arc::new(HttpResponseService::with_backend(backend, url)?),
        ResponseBackend::OpenAi => {
            let model = settings.model.clone().unwrap_or_default();
            Arc::new(OpenAiChatService::with_backend(
                backend,
                url,
                model,
                settings.system_prompt.clone(),
            )?)
        }
    };

    info!(
        backend = settings.effective_response_backend().as_str(),
        url,
        "Response service ready"
    );
    Ok(service)
}
