//! Speech synthesis port (the TTS encoder endpoint).

use async_trait::async_trait;
use thiserror::Error;

/// Errors returned by [`SpeechSynthesizer::synthesize`].
#[derive(Debug, Error)]
pub enum SynthesisError {
    /// The caller aborted the request. Not a fault.
    #[error("Speech synthesis cancelled")]
    Cancelled,

    /// The endpoint could not be reached.
    #[error("Speech synthesis endpoint unreachable: {0}")]
    Transport(String),

    /// The endpoint answered with a non-success status.
    #[error("Speech synthesis failed with HTTP {status}")]
    Status { status: u16 },

    /// The request did not complete in time.
    #[error("Speech synthesis timed out")]
    Timeout,

    /// The endpoint returned no audio bytes.
    #[error("Speech synthesis returned an empty payload")]
    EmptyPayload,
}

impl SynthesisError {
    /// Whether this error is a user- or system-initiated abort rather than a
    /// genuine failure.
    #[must_use]
    pub const fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Port for turning text into an encoded audio payload.
///
/// # Cancellation
///
/// Implementations must abort the underlying request when the returned
/// future is dropped. The playback controller cancels a job by racing this
/// future against its cancellation token and dropping the loser.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text` and return the encoded audio (wav, mp3, ...).
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, SynthesisError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_cancelled_is_cancellation() {
        assert!(SynthesisError::Cancelled.is_cancellation());
        assert!(!SynthesisError::Timeout.is_cancellation());
        assert!(!SynthesisError::Status { status: 500 }.is_cancellation());
    }
}
