#![doc = include_str!("../README.md")]
#![deny(unused_crate_dependencies)]

pub mod audio_io;
pub mod audio_thread;
pub mod error;
pub mod gate;
pub mod orchestrator;
pub mod playback;
pub mod recognizer;
pub mod speech;

// Re-export key types for convenience
pub use audio_io::{
    AudioOutput, DecodedAudio, RenderDoneCallback, SilentOutput, SpeechSource, SpeechUpdate,
};
pub use audio_thread::RodioOutput;
pub use error::VoiceError;
pub use gate::EchoGate;
pub use orchestrator::{ConversationOrchestrator, OrchestratorConfig, OrchestratorHandle};
pub use playback::PlaybackController;
pub use recognizer::{SessionUtterance, TurnRecognizer};
pub use speech::{ChannelSpeechSource, SpeechFeeder, UnsupportedSpeechSource};

// Dev-only dependencies used by the integration tests
#[cfg(test)]
use mockall as _;
#[cfg(test)]
use tokio_test as _;
