//! Domain types for the conversation engine.
//!
//! Pure data with no infrastructure dependencies.

mod chat;
mod playback;
mod turn;

pub use chat::{ChatMessage, MessageRole};
pub use playback::{JobId, JobState, PlaybackStatus};
pub use turn::{TurnState, Utterance, UtteranceSource};
