//! Single-shot response service: one message in, one reply out.

use async_trait::async_trait;
use parley_core::{BotReply, ResponseError, ResponseService};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::error::{HttpError, HttpResult};
use crate::http::{HttpBackend, ReqwestBackend};

#[derive(Serialize)]
struct ReplyRequest<'a> {
    message: &'a str,
}

#[derive(Deserialize)]
struct ReplyBody {
    content: String,
}

/// Posts `{"message": ...}` and expects `{"content": ...}` back.
///
/// The service is stateless; any conversation memory lives server-side.
pub struct HttpResponseService<B: HttpBackend> {
    backend: B,
    endpoint: Url,
}

pub type DefaultResponseService = HttpResponseService<ReqwestBackend>;

impl<B: HttpBackend> HttpResponseService<B> {
    pub fn with_backend(backend: B, endpoint: &str) -> HttpResult<Self> {
        Ok(Self {
            backend,
            endpoint: Url::parse(endpoint)?,
        })
    }

    async fn request(&self, text: &str) -> HttpResult<BotReply> {
        let body = serde_json::to_value(ReplyRequest { message: text })?;
        let bytes = self.backend.post_json(&self.endpoint, &body).await?;
        let reply: ReplyBody = serde_json::from_slice(&bytes)?;
        if reply.content.trim().is_empty() {
            return Err(HttpError::InvalidResponse {
                message: "reply content is empty".to_string(),
            });
        }
        Ok(BotReply::new(reply.content))
    }
}

#[async_trait]
impl<B: HttpBackend> ResponseService for HttpResponseService<B> {
    async fn generate(&self, text: &str) -> Result<BotReply, ResponseError> {
        let reply = self.request(text).await?;
        debug!(chars = reply.content.len(), "Received reply");
        Ok(reply)
    }
}
