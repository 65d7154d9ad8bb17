//! Dedicated audio output thread: isolates `!Send` rodio resources from the
//! async runtime.
//!
//! `rodio::OutputStream` is `!Send` on some platforms. Rather than reaching
//! for `unsafe impl Send`, the stream lives on a single OS thread and
//! [`RodioOutput`] proxies every operation through an [`OutputCommand`].

use std::io::Cursor;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::thread;

use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};

use crate::audio_io::{AudioOutput, DecodedAudio, RenderDoneCallback};
use crate::error::VoiceError;

// ── Commands ───────────────────────────────────────────────────────

/// A command sent from the playback controller to the audio thread.
enum OutputCommand {
    /// Replace whatever is audible with `audio`.
    Render {
        audio: DecodedAudio,
        on_end: RenderDoneCallback,
        reply: mpsc::Sender<Result<(), VoiceError>>,
    },

    /// Stop playback immediately (fire-and-forget).
    Halt,

    /// Shut down the audio thread, releasing the output stream.
    Shutdown,
}

// ── Decode ─────────────────────────────────────────────────────────

/// Decode a wav or mp3 payload into interleaved f32 samples.
pub fn decode_payload(payload: &[u8]) -> Result<DecodedAudio, VoiceError> {
    if payload.is_empty() {
        return Err(VoiceError::DecodeError("empty payload".into()));
    }

    let decoder = Decoder::new(Cursor::new(payload.to_vec()))
        .map_err(|e| VoiceError::DecodeError(e.to_string()))?;
    let channels = decoder.channels();
    let sample_rate = decoder.sample_rate();
    let samples: Vec<f32> = decoder.convert_samples().collect();

    if samples.is_empty() {
        return Err(VoiceError::DecodeError("payload contains no samples".into()));
    }

    Ok(DecodedAudio::new(samples, channels, sample_rate))
}

// ── Handle (Send + Sync proxy) ─────────────────────────────────────

/// [`AudioOutput`] backed by rodio on the default output device.
pub struct RodioOutput {
    cmd_tx: mpsc::Sender<OutputCommand>,
    thread: Option<thread::JoinHandle<()>>,
}

impl RodioOutput {
    /// Spawn the audio thread, open the default output device, and return
    /// the handle. Device errors are propagated back through a one-shot init
    /// channel.
    pub fn spawn() -> Result<Self, VoiceError> {
        let (cmd_tx, cmd_rx) = mpsc::channel::<OutputCommand>();
        let (init_tx, init_rx) = mpsc::channel::<Result<(), VoiceError>>();

        let thread = thread::Builder::new()
            .name("parley-audio".into())
            .spawn(move || Self::run(&cmd_rx, &init_tx))
            .map_err(|e| {
                VoiceError::OutputStreamError(format!("failed to spawn audio thread: {e}"))
            })?;

        init_rx.recv().map_err(|_| VoiceError::AudioThreadDied)??;

        Ok(Self {
            cmd_tx,
            thread: Some(thread),
        })
    }

    // ── Internal helpers ───────────────────────────────────────────

    fn send_and_recv<T>(
        &self,
        build: impl FnOnce(mpsc::Sender<Result<T, VoiceError>>) -> OutputCommand,
    ) -> Result<T, VoiceError> {
        let (tx, rx) = mpsc::channel();
        self.cmd_tx
            .send(build(tx))
            .map_err(|_| VoiceError::AudioThreadDied)?;
        rx.recv().map_err(|_| VoiceError::AudioThreadDied)?
    }

    // ── Audio thread event loop ────────────────────────────────────

    fn run(cmd_rx: &mpsc::Receiver<OutputCommand>, init_tx: &mpsc::Sender<Result<(), VoiceError>>) {
        let mut player = match Player::open() {
            Ok(p) => p,
            Err(e) => {
                let _ = init_tx.send(Err(e));
                return;
            }
        };

        if init_tx.send(Ok(())).is_err() {
            return;
        }

        while let Ok(cmd) = cmd_rx.recv() {
            match cmd {
                OutputCommand::Render {
                    audio,
                    on_end,
                    reply,
                } => {
                    let _ = reply.send(player.render(audio, on_end));
                }
                OutputCommand::Halt => player.halt(),
                OutputCommand::Shutdown => break,
            }
        }

        player.halt();
        tracing::debug!("Audio thread shutting down");
    }
}

impl AudioOutput for RodioOutput {
    fn decode(&self, payload: &[u8]) -> Result<DecodedAudio, VoiceError> {
        decode_payload(payload)
    }

    fn render(&self, audio: DecodedAudio, on_end: RenderDoneCallback) -> Result<(), VoiceError> {
        self.send_and_recv(|reply| OutputCommand::Render {
            audio,
            on_end,
            reply,
        })
    }

    fn halt(&self) {
        let _ = self.cmd_tx.send(OutputCommand::Halt);
    }
}

impl Drop for RodioOutput {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(OutputCommand::Shutdown);
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}

// ── Player (audio thread only) ─────────────────────────────────────

/// rodio state confined to the audio thread.
struct Player {
    _stream: OutputStream,
    stream_handle: OutputStreamHandle,
    sink: Option<Arc<Sink>>,
    /// Cleared by `halt` so the completion watcher stays quiet.
    active: Arc<AtomicBool>,
}

impl Player {
    fn open() -> Result<Self, VoiceError> {
        let (stream, stream_handle) = OutputStream::try_default()
            .map_err(|e| VoiceError::OutputStreamError(e.to_string()))?;

        tracing::info!("Audio output initialized on default device");

        Ok(Self {
            _stream: stream,
            stream_handle,
            sink: None,
            active: Arc::new(AtomicBool::new(false)),
        })
    }

    fn render(
        &mut self,
        audio: DecodedAudio,
        on_end: RenderDoneCallback,
    ) -> Result<(), VoiceError> {
        self.halt();

        let sink = Arc::new(
            Sink::try_new(&self.stream_handle)
                .map_err(|e| VoiceError::OutputStreamError(e.to_string()))?,
        );
        let duration = audio.duration();
        sink.append(rodio::buffer::SamplesBuffer::new(
            audio.channels,
            audio.sample_rate,
            audio.samples,
        ));

        let active = Arc::new(AtomicBool::new(true));
        self.active = Arc::clone(&active);
        self.sink = Some(Arc::clone(&sink));

        // `sleep_until_end` returns when the queue drains or `stop()` drops
        // the sources.
        thread::spawn(move || {
            sink.sleep_until_end();
            if active.swap(false, Ordering::SeqCst) {
                tracing::debug!("Rendered buffer drained");
                on_end();
            }
        });

        tracing::debug!(?duration, "Rendering started");
        Ok(())
    }

    fn halt(&mut self) {
        self.active.store(false, Ordering::SeqCst);
        if let Some(sink) = self.sink.take() {
            sink.stop();
            tracing::debug!("Rendering halted");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal 16-bit PCM wav file.
    fn wav_bytes(channels: u16, sample_rate: u32, samples: &[i16]) -> Vec<u8> {
        let data_len = u32::try_from(samples.len() * 2).unwrap();
        let mut out = Vec::new();
        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&(36 + data_len).to_le_bytes());
        out.extend_from_slice(b"WAVE");
        out.extend_from_slice(b"fmt ");
        out.extend_from_slice(&16u32.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&channels.to_le_bytes());
        out.extend_from_slice(&sample_rate.to_le_bytes());
        out.extend_from_slice(&(sample_rate * u32::from(channels) * 2).to_le_bytes());
        out.extend_from_slice(&(channels * 2).to_le_bytes());
        out.extend_from_slice(&16u16.to_le_bytes());
        out.extend_from_slice(b"data");
        out.extend_from_slice(&data_len.to_le_bytes());
        for s in samples {
            out.extend_from_slice(&s.to_le_bytes());
        }
        out
    }

    #[test]
    fn decodes_wav_payload() {
        let payload = wav_bytes(1, 16_000, &[0, 1000, -1000, 0]);
        let audio = decode_payload(&payload).unwrap();
        assert_eq!(audio.channels, 1);
        assert_eq!(audio.sample_rate, 16_000);
        assert_eq!(audio.samples.len(), 4);
        assert!(audio.samples.iter().all(|s| (-1.0..=1.0).contains(s)));
    }

    #[test]
    fn empty_payload_is_a_decode_error() {
        assert!(matches!(
            decode_payload(&[]),
            Err(VoiceError::DecodeError(_))
        ));
    }
}
