//! `AudioOutput` and `SpeechSource` trait abstractions for the engine's
//! device-facing collaborators.
//!
//! These traits decouple the [`PlaybackController`](crate::playback::PlaybackController)
//! and [`TurnRecognizer`](crate::recognizer::TurnRecognizer) from any
//! specific audio backend:
//!
//! | Implementor | Where used |
//! |---|---|
//! | [`RodioOutput`](crate::audio_thread::RodioOutput) | CLI, default output device |
//! | [`ChannelSpeechSource`](crate::speech::ChannelSpeechSource) | CLI and tests, pushed updates |
//! | [`UnsupportedSpeechSource`](crate::speech::UnsupportedSpeechSource) | Text-only mode |
//!
//! Both traits are **object-safe** (`Arc<dyn AudioOutput>` / `Arc<dyn SpeechSource>`).
//! All methods take `&self`; implementations use interior mutability.

use std::time::Duration;

use tokio::sync::mpsc;

use crate::error::VoiceError;

// ── Decoded audio ──────────────────────────────────────────────────

/// Interleaved f32 PCM ready for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    pub samples: Vec<f32>,
    pub channels: u16,
    pub sample_rate: u32,
}

impl DecodedAudio {
    #[must_use]
    pub const fn new(samples: Vec<f32>, channels: u16, sample_rate: u32) -> Self {
        Self {
            samples,
            channels,
            sample_rate,
        }
    }

    /// Playing time of the buffer.
    #[must_use]
    pub fn duration(&self) -> Duration {
        if self.channels == 0 || self.sample_rate == 0 {
            return Duration::ZERO;
        }
        let frames = self.samples.len() as u64 / u64::from(self.channels);
        Duration::from_micros(frames * 1_000_000 / u64::from(self.sample_rate))
    }
}

/// Callback invoked once when a rendered buffer drains naturally.
pub type RenderDoneCallback = Box<dyn FnOnce() + Send + 'static>;

// ── AudioOutput ────────────────────────────────────────────────────

/// Abstraction over the audio output device.
///
/// Exclusively owned by the playback controller; at most one buffer renders
/// at a time.
pub trait AudioOutput: Send + Sync {
    /// Turn an encoded payload (wav, mp3) into PCM. CPU bound; the
    /// controller runs it on the blocking pool.
    fn decode(&self, payload: &[u8]) -> Result<DecodedAudio, VoiceError>;

    /// Start rendering `audio`, replacing anything currently audible.
    ///
    /// `on_end` fires once when the buffer drains naturally, from another
    /// thread or task. It must never be invoked from inside `render` itself,
    /// and it is not invoked after [`halt`](AudioOutput::halt).
    fn render(&self, audio: DecodedAudio, on_end: RenderDoneCallback) -> Result<(), VoiceError>;

    /// Stop rendering immediately. No-op when nothing is audible.
    fn halt(&self);
}

// ── SpeechSource ───────────────────────────────────────────────────

/// One update from a continuous speech recognizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechUpdate {
    /// Uncommitted hypothesis for the segment in progress; replaces the
    /// previous interim text.
    Interim(String),
    /// A committed segment.
    Final(String),
    /// The source stopped on its own (silence timeout, device closed).
    Ended,
    /// The source failed; the session is over.
    Error(String),
}

/// Abstraction over a continuous-listening speech-to-text source.
///
/// Exclusively owned by the turn recognizer.
pub trait SpeechSource: Send + Sync {
    /// Whether the platform can capture speech at all. A `false` answer is
    /// permanent.
    fn is_supported(&self) -> bool;

    /// Begin a capture session and return its update stream. The stream
    /// ends (or yields [`SpeechUpdate::Ended`]) when the session is over.
    fn open(&self) -> Result<mpsc::UnboundedReceiver<SpeechUpdate>, VoiceError>;

    /// End the current capture session. No-op when none is open.
    fn close(&self);
}

// ── SilentOutput ───────────────────────────────────────────────────

/// Output for machines without an audio device: every buffer "drains"
/// immediately and nothing is heard.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentOutput;

impl AudioOutput for SilentOutput {
    fn decode(&self, payload: &[u8]) -> Result<DecodedAudio, VoiceError> {
        if payload.is_empty() {
            return Err(VoiceError::DecodeError("empty payload".into()));
        }
        Ok(DecodedAudio::new(Vec::new(), 1, 16_000))
    }

    fn render(&self, _audio: DecodedAudio, on_end: RenderDoneCallback) -> Result<(), VoiceError> {
        std::thread::spawn(on_end);
        Ok(())
    }

    fn halt(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_counts_frames_not_samples() {
        let audio = DecodedAudio::new(vec![0.0; 48_000], 2, 24_000);
        assert_eq!(audio.duration(), Duration::from_secs(1));
    }

    #[test]
    fn degenerate_format_has_no_duration() {
        let audio = DecodedAudio::new(vec![0.0; 10], 0, 16_000);
        assert_eq!(audio.duration(), Duration::ZERO);
    }
}
