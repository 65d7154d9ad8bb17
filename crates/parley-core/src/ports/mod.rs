//! Port definitions (trait abstractions) for external collaborators.
//!
//! Ports define the interfaces that the engine expects from the outside
//! world. They contain no transport details and use only domain types.
//!
//! # Design Rules
//!
//! - No `reqwest` types in any signature
//! - Cancellation is expressed by dropping futures, never by flags in the
//!   signature
//! - Every failure is a typed error; the engine decides what is fatal

pub mod response;
pub mod synthesis;

pub use response::{BotReply, ResponseError, ResponseService};
pub use synthesis::{SpeechSynthesizer, SynthesisError};
