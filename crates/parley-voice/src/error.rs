//! Voice engine error types.

/// Errors that can occur in the voice engine.
#[derive(Debug, thiserror::Error)]
pub enum VoiceError {
    /// The platform has no speech capture capability.
    #[error("Speech capture is not supported on this platform")]
    CaptureUnsupported,

    /// The speech source failed to open or died mid-session.
    #[error("Speech capture failed: {0}")]
    CaptureError(String),

    /// Failed to open the audio output stream.
    #[error("Failed to open audio output stream: {0}")]
    OutputStreamError(String),

    /// The synthesized payload could not be decoded into samples.
    #[error("Failed to decode synthesized audio: {0}")]
    DecodeError(String),

    /// The dedicated audio thread exited unexpectedly.
    #[error("Audio thread is no longer running")]
    AudioThreadDied,

    /// The orchestrator task has shut down.
    #[error("Conversation orchestrator is not running")]
    OrchestratorStopped,
}
