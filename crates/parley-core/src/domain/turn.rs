//! Turn domain types.
//!
//! A *turn* is one full cycle from an utterance being submitted to either
//! playback completing or a silent (text-only) response arriving.

use serde::{Deserialize, Serialize};

/// Where an utterance came from.
///
/// The source decides how the reply is delivered: voice input is answered
/// with synthesized speech, typed input with a silent text-only reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UtteranceSource {
    /// Produced by the speech recognizer after a quiet period.
    Voice,
    /// Typed directly into the surface.
    Text,
}

impl UtteranceSource {
    /// Whether replies to this source are spoken aloud.
    #[must_use]
    pub const fn is_spoken(self) -> bool {
        matches!(self, Self::Voice)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Voice => "voice",
            Self::Text => "text",
        }
    }
}

impl std::fmt::Display for UtteranceSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A finalized piece of user input, ready to be sent for a response.
///
/// Utterances are immutable once built and never contain empty text:
/// [`Utterance::new`] trims its input and refuses whitespace-only strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utterance {
    text: String,
    source: UtteranceSource,
}

impl Utterance {
    /// Build an utterance, returning `None` when `text` is blank.
    #[must_use]
    pub fn new(text: impl AsRef<str>, source: UtteranceSource) -> Option<Self> {
        let trimmed = text.as_ref().trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self {
            text: trimmed.to_owned(),
            source,
        })
    }

    #[must_use]
    pub fn voice(text: impl AsRef<str>) -> Option<Self> {
        Self::new(text, UtteranceSource::Voice)
    }

    #[must_use]
    pub fn typed(text: impl AsRef<str>) -> Option<Self> {
        Self::new(text, UtteranceSource::Text)
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub const fn source(&self) -> UtteranceSource {
        self.source
    }

    /// Consume the utterance and return its text.
    #[must_use]
    pub fn into_text(self) -> String {
        self.text
    }
}

/// The orchestrator's turn state.
///
/// Exactly one value holds at any time. `is_loading` on the surface is
/// simply "not idle".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnState {
    /// No turn in progress; new utterances are accepted.
    #[default]
    Idle,
    /// An utterance was sent and the reply has not arrived yet.
    AwaitingResponse,
    /// The reply to a voice utterance is being synthesized or played.
    Speaking,
}

impl TurnState {
    #[must_use]
    pub const fn is_idle(self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Whether a turn is in progress (the surface shows a busy indicator).
    #[must_use]
    pub const fn is_loading(self) -> bool {
        !self.is_idle()
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::AwaitingResponse => "awaiting_response",
            Self::Speaking => "speaking",
        }
    }
}

impl std::fmt::Display for TurnState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
