//! Echo gate: keeps the recognizer deaf while synthesized speech is audible.
//!
//! When the playback controller renders a reply, whatever the microphone
//! picks up is the bot's own voice. The recognizer checks this flag and drops
//! speech updates while it is closed.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared flag coordinating playback and recognition.
///
/// Closed by the [`PlaybackController`](crate::playback::PlaybackController)
/// when a job enters `Playing`, opened again when that job ends for any
/// reason.
#[derive(Debug, Clone, Default)]
pub struct EchoGate {
    closed: Arc<AtomicBool>,
}

impl EchoGate {
    /// Create a new, open gate.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Close the gate: audio output has started.
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            tracing::debug!("Echo gate closed, speech updates suppressed");
        }
    }

    /// Open the gate: audio output has stopped.
    pub fn open(&self) {
        if self.closed.swap(false, Ordering::SeqCst) {
            tracing::debug!("Echo gate open");
        }
    }

    /// Whether speech updates should currently be discarded.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}
