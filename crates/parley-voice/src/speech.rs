//! Speech sources that do not own a microphone themselves.
//!
//! [`ChannelSpeechSource`] accepts recognizer updates pushed from elsewhere
//! (the terminal surface, an external recognizer process) through a
//! [`SpeechFeeder`]. [`UnsupportedSpeechSource`] models a platform with no
//! capture capability.

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use crate::audio_io::{SpeechSource, SpeechUpdate};
use crate::error::VoiceError;

type SessionSender = Arc<Mutex<Option<mpsc::UnboundedSender<SpeechUpdate>>>>;

/// A speech source fed by a [`SpeechFeeder`].
///
/// Updates pushed while no session is open are dropped.
#[derive(Debug, Default)]
pub struct ChannelSpeechSource {
    session: SessionSender,
}

impl ChannelSpeechSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle for pushing updates into whichever session is open.
    #[must_use]
    pub fn feeder(&self) -> SpeechFeeder {
        SpeechFeeder {
            session: Arc::clone(&self.session),
        }
    }
}

impl SpeechSource for ChannelSpeechSource {
    fn is_supported(&self) -> bool {
        true
    }

    fn open(&self) -> Result<mpsc::UnboundedReceiver<SpeechUpdate>, VoiceError> {
        let (tx, rx) = mpsc::unbounded_channel();
        // Replacing the sender ends any previous session's stream.
        *self.session.lock().unwrap() = Some(tx);
        tracing::debug!("Channel speech session opened");
        Ok(rx)
    }

    fn close(&self) {
        if self.session.lock().unwrap().take().is_some() {
            tracing::debug!("Channel speech session closed");
        }
    }
}

/// Cloneable producer side of a [`ChannelSpeechSource`].
#[derive(Debug, Clone)]
pub struct SpeechFeeder {
    session: SessionSender,
}

impl SpeechFeeder {
    /// Push an interim hypothesis. Returns `false` when no session is open.
    pub fn interim(&self, text: impl Into<String>) -> bool {
        self.push(SpeechUpdate::Interim(text.into()))
    }

    /// Push a committed segment. Returns `false` when no session is open.
    pub fn commit(&self, text: impl Into<String>) -> bool {
        self.push(SpeechUpdate::Final(text.into()))
    }

    /// Signal that the source stopped on its own.
    pub fn end(&self) -> bool {
        self.push(SpeechUpdate::Ended)
    }

    /// Signal a capture failure.
    pub fn fail(&self, message: impl Into<String>) -> bool {
        self.push(SpeechUpdate::Error(message.into()))
    }

    /// Whether a session is currently open.
    pub fn is_open(&self) -> bool {
        self.session
            .lock()
            .unwrap()
            .as_ref()
            .is_some_and(|tx| !tx.is_closed())
    }

    fn push(&self, update: SpeechUpdate) -> bool {
        self.session
            .lock()
            .unwrap()
            .as_ref()
            .is_some_and(|tx| tx.send(update).is_ok())
    }
}

/// Speech source for platforms without capture capability.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedSpeechSource;

impl SpeechSource for UnsupportedSpeechSource {
    fn is_supported(&self) -> bool {
        false
    }

    fn open(&self) -> Result<mpsc::UnboundedReceiver<SpeechUpdate>, VoiceError> {
        Err(VoiceError::CaptureUnsupported)
    }

    fn close(&self) {}
}
