//! OpenAI-compatible chat completions.
//!
//! Unlike [`crate::HttpResponseService`], this adapter keeps the session's
//! message history and sends it with every request. A user message and its
//! reply are appended together, and only once the reply arrives; a failed or
//! aborted request leaves the history untouched.

use std::sync::Mutex;

use async_trait::async_trait;
use parley_core::{BotReply, ChatMessage, ResponseError, ResponseService, UtteranceSource};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::error::{HttpError, HttpResult};
use crate::http::{HttpBackend, ReqwestBackend};

// ─────────────────────────────────────────────────────────────────────────────
// Wire DTOs
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

impl<'a> From<&'a ChatMessage> for WireMessage<'a> {
    fn from(message: &'a ChatMessage) -> Self {
        Self {
            role: message.role.as_str(),
            content: &message.content,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Service
// ─────────────────────────────────────────────────────────────────────────────

/// Response service for any `/chat/completions` endpoint.
pub struct OpenAiChatService<B: HttpBackend> {
    backend: B,
    endpoint: Url,
    model: String,
    system_prompt: Option<String>,
    history: Mutex<Vec<ChatMessage>>,
}

pub type DefaultOpenAiChatService = OpenAiChatService<ReqwestBackend>;

impl<B: HttpBackend> OpenAiChatService<B> {
    /// Create a service against `base_url` (e.g. `https://api.openai.com/v1`).
    pub fn with_backend(
        backend: B,
        base_url: &str,
        model: impl Into<String>,
        system_prompt: Option<String>,
    ) -> HttpResult<Self> {
        let endpoint = Url::parse(&format!(
            "{}/chat/completions",
            base_url.trim_end_matches('/')
        ))?;
        Ok(Self {
            backend,
            endpoint,
            model: model.into(),
            system_prompt: system_prompt.filter(|p| !p.trim().is_empty()),
            history: Mutex::new(Vec::new()),
        })
    }

    /// Messages exchanged so far, oldest first. The system prompt is not
    /// included.
    pub fn history(&self) -> Vec<ChatMessage> {
        self.history.lock().unwrap().clone()
    }

    fn build_body(&self, user: &ChatMessage) -> HttpResult<serde_json::Value> {
        let system = self.system_prompt.as_deref().map(ChatMessage::system);
        let history = self.history.lock().unwrap();

        let messages = system
            .iter()
            .chain(history.iter())
            .chain(std::iter::once(user))
            .map(WireMessage::from)
            .collect();

        Ok(serde_json::to_value(CompletionRequest {
            model: &self.model,
            messages,
            stream: false,
        })?)
    }

    async fn complete(&self, text: &str) -> HttpResult<String> {
        let user = ChatMessage::user(text, UtteranceSource::Text);
        let body = self.build_body(&user)?;

        let bytes = self.backend.post_json(&self.endpoint, &body).await?;
        let response: CompletionResponse = serde_json::from_slice(&bytes)?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| HttpError::InvalidResponse {
                message: "completion has no message content".to_string(),
            })?;

        let mut history = self.history.lock().unwrap();
        history.push(user);
        history.push(ChatMessage::assistant(content.clone()));
        Ok(content)
    }
}

#[async_trait]
impl<B: HttpBackend> ResponseService for OpenAiChatService<B> {
    async fn generate(&self, text: &str) -> Result<BotReply, ResponseError> {
        let content = self.complete(text).await?;
        debug!(model = %self.model, chars = content.len(), "Received completion");
        Ok(BotReply::new(content))
    }
}
