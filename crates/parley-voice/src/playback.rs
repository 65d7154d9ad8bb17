//! Playback controller: owns the single audio-rendering job.
//!
//! ```text
//!   play(text) ──► Requesting ──► Decoding ──► Playing ──► Finished
//!                      │              │           │
//!   stop() / play() ───┴──────────────┴───────────┴──► Cancelled
//!   synthesis / decode / output error ────────────────► Failed
//! ```
//!
//! Each job carries a [`JobId`] and a [`CancellationToken`]. `play` and
//! `stop` invalidate the current job synchronously under the job lock. The
//! async continuations (after synthesis, after decode, on render end) take
//! the same lock and re-check that their captured id is still current and in
//! the expected state before doing anything visible, so a superseded job can
//! never become audible.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use parley_core::{JobId, JobState, PlaybackStatus, SpeechSynthesizer};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::audio_io::{AudioOutput, DecodedAudio};
use crate::gate::EchoGate;

/// The job the controller currently considers authoritative.
struct CurrentJob {
    id: JobId,
    state: JobState,
    cancel: CancellationToken,
}

struct Inner {
    synthesizer: Arc<dyn SpeechSynthesizer>,
    output: Arc<dyn AudioOutput>,
    gate: EchoGate,
    next_id: AtomicU64,
    current: Mutex<Option<CurrentJob>>,
    status_tx: watch::Sender<PlaybackStatus>,
}

/// Controller for synthesized speech output.
///
/// Cheap to clone; clones share the same job.
#[derive(Clone)]
pub struct PlaybackController {
    inner: Arc<Inner>,
}

impl PlaybackController {
    pub fn new(
        synthesizer: Arc<dyn SpeechSynthesizer>,
        output: Arc<dyn AudioOutput>,
        gate: EchoGate,
    ) -> Self {
        let (status_tx, _) = watch::channel(PlaybackStatus::default());
        Self {
            inner: Arc::new(Inner {
                synthesizer,
                output,
                gate,
                next_id: AtomicU64::new(1),
                current: Mutex::new(None),
                status_tx,
            }),
        }
    }

    /// Start speaking `text`, superseding whatever is in flight.
    ///
    /// Fire-and-forget: progress is observed through [`subscribe`]. The
    /// returned id identifies this job in status updates. Must be called
    /// from within a tokio runtime.
    ///
    /// [`subscribe`]: PlaybackController::subscribe
    pub fn play(&self, text: &str) -> JobId {
        let id = JobId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let cancel = CancellationToken::new();
        let text = text.trim().to_string();

        {
            let mut current = self.inner.current.lock().unwrap();
            if let Some(previous) = current.take() {
                self.inner.cancel_job(previous);
            }

            let state = if text.is_empty() {
                JobState::Finished
            } else {
                JobState::Requesting
            };
            *current = Some(CurrentJob {
                id,
                state,
                cancel: cancel.clone(),
            });
            self.inner.publish(id, state);
        }

        if text.is_empty() {
            tracing::debug!(job = %id, "Nothing to speak");
            return id;
        }

        tracing::debug!(job = %id, chars = text.len(), "Playback job started");
        tokio::spawn(run_job(Arc::clone(&self.inner), id, text, cancel));
        id
    }

    /// Cancel the current job and silence the output. Idempotent.
    pub fn stop(&self) {
        let mut current = self.inner.current.lock().unwrap();
        let Some(job) = current.as_mut() else {
            return;
        };
        if job.state.is_terminal() {
            return;
        }

        job.cancel.cancel();
        if job.state == JobState::Playing {
            self.inner.output.halt();
            self.inner.gate.open();
        }
        job.state = JobState::Cancelled;
        self.inner.publish(job.id, JobState::Cancelled);
        tracing::debug!(job = %job.id, "Playback stopped");
    }

    /// Latest status snapshot.
    pub fn status(&self) -> PlaybackStatus {
        *self.inner.status_tx.borrow()
    }

    /// Audio is audible right now.
    pub fn is_playing(&self) -> bool {
        self.status().is_playing()
    }

    /// Audio is being requested or decoded.
    pub fn is_processing(&self) -> bool {
        self.status().is_processing()
    }

    /// Watch status transitions.
    pub fn subscribe(&self) -> watch::Receiver<PlaybackStatus> {
        self.inner.status_tx.subscribe()
    }
}

impl Inner {
    fn publish(&self, id: JobId, state: JobState) {
        self.status_tx.send_replace(PlaybackStatus::new(id, state));
    }

    /// Tear down a superseded job, which ends Cancelled if it was still
    /// live. Caller holds the job lock.
    fn cancel_job(&self, job: CurrentJob) {
        job.cancel.cancel();
        if job.state.is_terminal() {
            return;
        }
        if job.state == JobState::Playing {
            self.output.halt();
            self.gate.open();
        }
        self.publish(job.id, JobState::Cancelled);
        tracing::debug!(job = %job.id, from = ?job.state, "Superseded by a newer job");
    }

    /// Move `id` from `from` to `to` if it is still the current job in the
    /// expected state.
    fn advance(&self, id: JobId, from: JobState, to: JobState) -> bool {
        let mut current = self.current.lock().unwrap();
        match current.as_mut() {
            Some(job) if job.id == id && job.state == from => {
                job.state = to;
                self.publish(id, to);
                true
            }
            _ => {
                tracing::debug!(job = %id, "Ignoring stale continuation");
                false
            }
        }
    }

    /// End `id` with a terminal state if it is still current and live.
    fn finish(&self, id: JobId, to: JobState) {
        let mut current = self.current.lock().unwrap();
        let Some(job) = current.as_mut().filter(|job| job.id == id) else {
            return;
        };
        if job.state.is_terminal() {
            return;
        }
        if job.state == JobState::Playing {
            self.gate.open();
        }
        job.state = to;
        self.publish(id, to);
    }

    /// Hand the decoded buffer to the output if `id` is still current.
    ///
    /// The render call happens under the job lock, so a concurrent `stop`
    /// either runs before it (and the buffer is dropped) or after it (and
    /// halts the output).
    fn begin_render(self: &Arc<Self>, id: JobId, audio: DecodedAudio) {
        let mut current = self.current.lock().unwrap();
        let Some(job) = current
            .as_mut()
            .filter(|job| job.id == id && job.state == JobState::Decoding)
        else {
            tracing::debug!(job = %id, "Dropping decoded audio for stale job");
            return;
        };

        let weak: Weak<Self> = Arc::downgrade(self);
        let on_end = Box::new(move || {
            if let Some(inner) = weak.upgrade() {
                tracing::debug!(job = %id, "Playback finished");
                inner.finish(id, JobState::Finished);
            }
        });

        let duration = audio.duration();
        match self.output.render(audio, on_end) {
            Ok(()) => {
                self.gate.close();
                job.state = JobState::Playing;
                self.publish(id, JobState::Playing);
                tracing::debug!(job = %id, ?duration, "Playback started");
            }
            Err(e) => {
                tracing::warn!(job = %id, error = %e, "Audio output failed");
                job.state = JobState::Failed;
                self.publish(id, JobState::Failed);
            }
        }
    }
}

/// Drive one job through synthesis and decode.
async fn run_job(inner: Arc<Inner>, id: JobId, text: String, cancel: CancellationToken) {
    let synthesized = tokio::select! {
        biased;
        () = cancel.cancelled() => {
            tracing::debug!(job = %id, "Synthesis request aborted");
            return;
        }
        result = inner.synthesizer.synthesize(&text) => result,
    };

    let payload = match synthesized {
        Ok(payload) => payload,
        Err(e) if e.is_cancellation() => {
            tracing::debug!(job = %id, "Synthesis cancelled");
            inner.finish(id, JobState::Cancelled);
            return;
        }
        Err(e) => {
            tracing::warn!(job = %id, error = %e, "Speech synthesis failed");
            inner.finish(id, JobState::Failed);
            return;
        }
    };

    if !inner.advance(id, JobState::Requesting, JobState::Decoding) {
        return;
    }

    let output = Arc::clone(&inner.output);
    let decode = tokio::task::spawn_blocking(move || output.decode(&payload));
    let decoded = tokio::select! {
        biased;
        () = cancel.cancelled() => {
            tracing::debug!(job = %id, "Decode abandoned");
            return;
        }
        result = decode => result,
    };

    match decoded {
        Ok(Ok(audio)) => inner.begin_render(id, audio),
        Ok(Err(e)) => {
            tracing::warn!(job = %id, error = %e, "Audio decode failed");
            inner.finish(id, JobState::Failed);
        }
        Err(e) => {
            tracing::warn!(job = %id, error = %e, "Decode task panicked");
            inner.finish(id, JobState::Failed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio_io::SilentOutput;
    use parley_core::SynthesisError;

    struct NeverSynthesizer;

    #[async_trait::async_trait]
    impl SpeechSynthesizer for NeverSynthesizer {
        async fn synthesize(&self, _text: &str) -> Result<Vec<u8>, SynthesisError> {
            std::future::pending().await
        }
    }

    fn controller() -> PlaybackController {
        PlaybackController::new(
            Arc::new(NeverSynthesizer),
            Arc::new(SilentOutput),
            EchoGate::new(),
        )
    }

    fn job(id: u64, state: JobState) -> (CurrentJob, CancellationToken) {
        let cancel = CancellationToken::new();
        let job = CurrentJob {
            id: JobId(id),
            state,
            cancel: cancel.clone(),
        };
        (job, cancel)
    }

    #[test]
    fn superseded_live_job_is_published_cancelled() {
        let controller = controller();
        let mut status = controller.subscribe();

        let (decoding, cancel) = job(3, JobState::Decoding);
        controller.inner.cancel_job(decoding);

        assert!(cancel.is_cancelled());
        assert!(status.has_changed().unwrap());
        assert_eq!(
            *status.borrow_and_update(),
            PlaybackStatus::new(JobId(3), JobState::Cancelled)
        );
    }

    #[test]
    fn superseded_finished_job_keeps_its_state() {
        let controller = controller();
        let status = controller.subscribe();

        let (finished, cancel) = job(4, JobState::Finished);
        controller.inner.cancel_job(finished);

        assert!(cancel.is_cancelled());
        assert!(!status.has_changed().unwrap());
        assert_eq!(controller.status(), PlaybackStatus::default());
    }
}
