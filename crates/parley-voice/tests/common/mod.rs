//! Hand-written fakes shared by the integration tests.
//!
//! No audio hardware or network is touched. Timing comes from
//! `tokio::time::sleep`, so tests run under `start_paused = true` and the
//! runtime auto-advances through every delay.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, mpsc as std_mpsc};
use std::time::Duration;

use async_trait::async_trait;
use parley_core::{BotReply, ResponseError, ResponseService, SpeechSynthesizer, SynthesisError};
use parley_voice::{AudioOutput, DecodedAudio, RenderDoneCallback, VoiceError};

// ── Synthesizer ────────────────────────────────────────────────────

/// Synthesizer whose payload is the UTF-8 text itself.
#[derive(Default)]
pub struct FakeSynthesizer {
    delays: Mutex<HashMap<String, Duration>>,
    failing: Mutex<Vec<String>>,
    requests: Mutex<Vec<String>>,
}

impl FakeSynthesizer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make requests for `text` take `delay`.
    pub fn delay(&self, text: &str, delay: Duration) {
        self.delays.lock().unwrap().insert(text.to_string(), delay);
    }

    /// Make requests for `text` fail with HTTP 500.
    pub fn fail(&self, text: &str) {
        self.failing.lock().unwrap().push(text.to_string());
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl SpeechSynthesizer for FakeSynthesizer {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, SynthesisError> {
        self.requests.lock().unwrap().push(text.to_string());
        let delay = self.delays.lock().unwrap().get(text).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.lock().unwrap().iter().any(|t| t == text) {
            return Err(SynthesisError::Status { status: 500 });
        }
        Ok(text.as_bytes().to_vec())
    }
}

// ── Output ─────────────────────────────────────────────────────────

/// Output that records what it renders. Buffers drain only when the test
/// calls [`FakeOutput::finish`].
#[derive(Default)]
pub struct FakeOutput {
    rendered: Mutex<Vec<String>>,
    pending: Mutex<Option<RenderDoneCallback>>,
    halts: AtomicUsize,
    fail_decode: Mutex<bool>,
    decode_hold: Mutex<Option<(Vec<u8>, std_mpsc::Receiver<()>)>>,
}

impl FakeOutput {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_decoding(&self) {
        *self.fail_decode.lock().unwrap() = true;
    }

    /// Block the decode of `text`'s payload until the returned sender fires
    /// or is dropped. Other payloads decode immediately.
    pub fn hold_decode(&self, text: &str) -> std_mpsc::Sender<()> {
        let (tx, rx) = std_mpsc::channel();
        *self.decode_hold.lock().unwrap() = Some((text.as_bytes().to_vec(), rx));
        tx
    }

    /// Texts handed to `render`, in order.
    pub fn rendered(&self) -> Vec<String> {
        self.rendered.lock().unwrap().clone()
    }

    pub fn halts(&self) -> usize {
        self.halts.load(Ordering::SeqCst)
    }

    /// Drain the current buffer naturally. Returns `false` if nothing is
    /// rendering.
    pub fn finish(&self) -> bool {
        let callback = self.pending.lock().unwrap().take();
        callback.map(|cb| cb()).is_some()
    }
}

impl AudioOutput for FakeOutput {
    fn decode(&self, payload: &[u8]) -> Result<DecodedAudio, VoiceError> {
        let hold = self
            .decode_hold
            .lock()
            .unwrap()
            .take_if(|(held, _)| held.as_slice() == payload);
        if let Some((_, release)) = hold {
            let _ = release.recv();
        }
        if *self.fail_decode.lock().unwrap() {
            return Err(VoiceError::DecodeError("corrupt payload".into()));
        }
        let samples = payload.iter().map(|b| f32::from(*b)).collect();
        Ok(DecodedAudio::new(samples, 1, 16_000))
    }

    fn render(&self, audio: DecodedAudio, on_end: RenderDoneCallback) -> Result<(), VoiceError> {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let bytes: Vec<u8> = audio.samples.iter().map(|s| *s as u8).collect();
        self.rendered
            .lock()
            .unwrap()
            .push(String::from_utf8_lossy(&bytes).into_owned());
        *self.pending.lock().unwrap() = Some(on_end);
        Ok(())
    }

    fn halt(&self) {
        self.halts.fetch_add(1, Ordering::SeqCst);
        self.pending.lock().unwrap().take();
    }
}

// ── Response service ───────────────────────────────────────────────

/// Responder that answers `"re: <text>"` after an optional delay.
#[derive(Default)]
pub struct FakeResponder {
    delay: Mutex<Option<Duration>>,
    failing: Mutex<bool>,
    calls: Mutex<Vec<String>>,
}

impl FakeResponder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_delay(delay: Duration) -> Arc<Self> {
        let responder = Self::default();
        *responder.delay.lock().unwrap() = Some(delay);
        Arc::new(responder)
    }

    pub fn failing() -> Arc<Self> {
        let responder = Self::default();
        *responder.failing.lock().unwrap() = true;
        Arc::new(responder)
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ResponseService for FakeResponder {
    async fn generate(&self, text: &str) -> Result<BotReply, ResponseError> {
        self.calls.lock().unwrap().push(text.to_string());
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if *self.failing.lock().unwrap() {
            return Err(ResponseError::Status { status: 503 });
        }
        Ok(BotReply::new(format!("re: {text}")))
    }
}

/// Yield long enough for spawned tasks to react to a just-sent message.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(10)).await;
}
