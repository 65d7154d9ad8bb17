//! Response generation port.
//!
//! The response service turns a user utterance into the assistant's reply.
//! It is a black box to the engine: any failure simply ends the turn without
//! a reply.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The assistant's reply to one utterance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotReply {
    pub content: String,
}

impl BotReply {
    #[must_use]
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

/// Errors returned by [`ResponseService::generate`].
///
/// The orchestrator never inspects these beyond logging; every variant ends
/// the turn the same way.
#[derive(Debug, Error)]
pub enum ResponseError {
    /// The service could not be reached.
    #[error("Response service unreachable: {0}")]
    Transport(String),

    /// The service answered with a non-success status.
    #[error("Response service returned HTTP {status}")]
    Status { status: u16 },

    /// The request did not complete in time.
    #[error("Response service timed out")]
    Timeout,

    /// The body could not be understood.
    #[error("Invalid response from response service: {0}")]
    InvalidResponse(String),
}

/// Port for generating assistant replies.
#[async_trait]
pub trait ResponseService: Send + Sync {
    /// Generate a reply for the given user text.
    async fn generate(&self, text: &str) -> Result<BotReply, ResponseError>;
}
