//! Events and observable state published to the turn surface.
//!
//! The surface is the boundary that receives user input and renders bot
//! output. It learns about the engine through two channels:
//!
//! - [`SurfaceSnapshot`]: the latest value of every observable flag
//!   (`listening`, `is_loading`, `is_playing`, ...), suitable for a watch
//!   channel.
//! - [`TurnEvent`]: discrete happenings in order (messages, rejections,
//!   state changes), suitable for an event stream.
//!
//! # Wire Format
//!
//! Events are serialized with a `type` tag:
//!
//! ```json
//! { "type": "state_changed", "state": "awaiting_response" }
//! ```

use serde::{Deserialize, Serialize};

use crate::domain::{ChatMessage, TurnState};

/// Discrete events emitted by the conversation orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TurnEvent {
    /// The turn state changed.
    StateChanged { state: TurnState },

    /// A message was appended to the session transcript.
    MessageAdded { message: ChatMessage },

    /// A submission arrived while a turn was already in progress.
    SubmissionRejected { state: TurnState },

    /// The turn ended without a reply (service failure). No detail is given.
    ResponseUnavailable,

    /// The voice surface was opened or closed.
    VoiceSurfaceChanged { open: bool },

    /// The recognizer started or stopped listening.
    ListeningChanged { listening: bool },

    /// The recognizer's accumulated transcript changed.
    TranscriptUpdated { text: String },

    /// Audio playback started or stopped being audible / in flight.
    PlaybackChanged {
        #[serde(rename = "isPlaying")]
        is_playing: bool,
        #[serde(rename = "isAudioProcessing")]
        is_audio_processing: bool,
    },

    /// Speech capture is not available on this platform. Emitted once.
    CaptureUnavailable,
}

/// Snapshot of everything the surface renders.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurfaceSnapshot {
    pub state: TurnState,
    pub voice_open: bool,
    pub listening: bool,
    pub transcript: String,
    pub is_playing: bool,
    pub is_audio_processing: bool,
    pub capture_supported: bool,
}

impl SurfaceSnapshot {
    /// A turn is in progress (awaiting a reply or speaking it).
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.state.is_loading()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_are_type_tagged() {
        let json = serde_json::to_value(TurnEvent::StateChanged {
            state: TurnState::Speaking,
        })
        .unwrap();
        assert_eq!(json["type"], "state_changed");
        assert_eq!(json["state"], "speaking");
    }

    #[test]
    fn playback_event_uses_surface_names() {
        let json = serde_json::to_value(TurnEvent::PlaybackChanged {
            is_playing: true,
            is_audio_processing: false,
        })
        .unwrap();
        assert_eq!(json["isPlaying"], true);
        assert_eq!(json["isAudioProcessing"], false);
    }

    #[test]
    fn snapshot_loading_follows_state() {
        let mut snapshot = SurfaceSnapshot::default();
        assert!(!snapshot.is_loading());
        snapshot.state = TurnState::AwaitingResponse;
        assert!(snapshot.is_loading());
    }
}
