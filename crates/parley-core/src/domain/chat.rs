//! Chat domain types.
//!
//! The session transcript is kept in memory for the lifetime of one
//! conversation and never persisted.

use serde::{Deserialize, Serialize};

use super::turn::UtteranceSource;

/// The role of a message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl MessageRole {
    /// Convert role to string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single message in the session transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
    /// How the user entered the message; `None` for non-user messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<UtteranceSource>,
}

impl ChatMessage {
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
            source: None,
        }
    }

    #[must_use]
    pub fn user(content: impl Into<String>, source: UtteranceSource) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
            source: Some(source),
        }
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
            source: None,
        }
    }
}
