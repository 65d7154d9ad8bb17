#![doc = include_str!("../README.md")]
#![deny(unused_crate_dependencies)]

pub mod domain;
pub mod events;
pub mod ports;
pub mod settings;

// Re-export commonly used types for convenience
pub use domain::{
    ChatMessage, JobId, JobState, MessageRole, PlaybackStatus, TurnState, Utterance,
    UtteranceSource,
};
pub use events::{SurfaceSnapshot, TurnEvent};
pub use ports::{BotReply, ResponseError, ResponseService, SpeechSynthesizer, SynthesisError};
pub use settings::{
    DEFAULT_DEBOUNCE_MS, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_RESPONSE_URL,
    DEFAULT_RESTART_DELAY_MS, DEFAULT_TTS_URL, ResponseBackend, Settings, SettingsError,
    validate_settings,
};

// Dev-only dependency used by serde assertions in unit tests
#[cfg(test)]
use serde_json as _;
