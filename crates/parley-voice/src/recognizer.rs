//! Turn recognizer: turns a continuous speech stream into complete
//! utterances.
//!
//! A listening session runs from [`TurnRecognizer::start`] until one of:
//!
//! - the transcript has been stable for the debounce interval,
//! - [`TurnRecognizer::stop`] is called,
//! - the source ends or fails,
//! - [`TurnRecognizer::abort`] is called.
//!
//! All but the last emit the accumulated transcript as a voice
//! [`Utterance`] when it is non-empty, tagged with the session it came from.
//! Every session has an id; the session task re-checks it under the session
//! lock before touching shared state, so a task that outlived its session is
//! inert.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use parley_core::Utterance;
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;

use crate::audio_io::{SpeechSource, SpeechUpdate};
use crate::error::VoiceError;
use crate::gate::EchoGate;

/// A finished utterance and the listening session that produced it.
///
/// Session ids increase monotonically per recognizer, so a consumer can tell
/// utterances heard before some point apart from later ones by comparing
/// against [`TurnRecognizer::last_session`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUtterance {
    pub session: u64,
    pub utterance: Utterance,
}

struct ActiveSession {
    id: u64,
    cancel: CancellationToken,
}

#[derive(Default)]
struct SessionSlot {
    last_id: u64,
    current: Option<ActiveSession>,
}

struct Inner {
    source: Arc<dyn SpeechSource>,
    gate: EchoGate,
    debounce: Duration,
    slot: Mutex<SessionSlot>,
    listening_tx: watch::Sender<bool>,
    transcript_tx: watch::Sender<String>,
    utterance_tx: mpsc::UnboundedSender<SessionUtterance>,
}

/// Debounced wrapper around a [`SpeechSource`].
pub struct TurnRecognizer {
    inner: Arc<Inner>,
}

impl TurnRecognizer {
    /// Create a recognizer and the stream its utterances are delivered on.
    pub fn new(
        source: Arc<dyn SpeechSource>,
        gate: EchoGate,
        debounce: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<SessionUtterance>) {
        let (utterance_tx, utterance_rx) = mpsc::unbounded_channel();
        let (listening_tx, _) = watch::channel(false);
        let (transcript_tx, _) = watch::channel(String::new());

        let recognizer = Self {
            inner: Arc::new(Inner {
                source,
                gate,
                debounce,
                slot: Mutex::new(SessionSlot::default()),
                listening_tx,
                transcript_tx,
                utterance_tx,
            }),
        };
        (recognizer, utterance_rx)
    }

    /// Whether the source can capture speech at all.
    pub fn is_supported(&self) -> bool {
        self.inner.source.is_supported()
    }

    /// Open a listening session. No-op when already listening.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self) -> Result<(), VoiceError> {
        if !self.inner.source.is_supported() {
            return Err(VoiceError::CaptureUnsupported);
        }

        let mut slot = self.inner.slot.lock().unwrap();
        if slot.current.is_some() {
            return Ok(());
        }

        let updates = self.inner.source.open()?;
        slot.last_id += 1;
        let id = slot.last_id;
        let cancel = CancellationToken::new();
        slot.current = Some(ActiveSession {
            id,
            cancel: cancel.clone(),
        });

        self.inner.transcript_tx.send_if_modified(take_nonempty);
        self.inner.set_listening(true);
        drop(slot);

        tracing::info!(session = id, "Listening started");
        tokio::spawn(run_session(Arc::clone(&self.inner), id, updates, cancel));
        Ok(())
    }

    /// Close the session and submit the transcript if it is non-empty.
    /// No-op when not listening.
    pub fn stop(&self) {
        self.inner.end_session(None, true);
    }

    /// Close the session and discard the transcript.
    pub fn abort(&self) {
        self.inner.end_session(None, false);
    }

    /// Id of the most recently started session, `0` before the first.
    pub fn last_session(&self) -> u64 {
        self.inner.slot.lock().unwrap().last_id
    }

    pub fn is_listening(&self) -> bool {
        *self.inner.listening_tx.borrow()
    }

    /// The transcript accumulated in the current session.
    pub fn transcript(&self) -> String {
        self.inner.transcript_tx.borrow().clone()
    }

    pub fn subscribe_listening(&self) -> watch::Receiver<bool> {
        self.inner.listening_tx.subscribe()
    }

    pub fn subscribe_transcript(&self) -> watch::Receiver<String> {
        self.inner.transcript_tx.subscribe()
    }
}

/// `send_if_modified` helper: clear the transcript, reporting whether it
/// had content.
fn take_nonempty(text: &mut String) -> bool {
    if text.is_empty() {
        false
    } else {
        text.clear();
        true
    }
}

impl Inner {
    fn set_listening(&self, listening: bool) {
        self.listening_tx.send_if_modified(|current| {
            let changed = *current != listening;
            *current = listening;
            changed
        });
    }

    /// End session `id` (or whichever is current when `None`). Returns
    /// `false` if that session is already over.
    fn end_session(&self, id: Option<u64>, emit: bool) -> bool {
        let mut slot = self.slot.lock().unwrap();
        let Some(session) = slot
            .current
            .take_if(|session| id.is_none_or(|id| session.id == id))
        else {
            return false;
        };

        session.cancel.cancel();
        // Closed under the lock so a racing `start` cannot have its freshly
        // opened session closed by this one.
        self.source.close();

        let mut transcript = String::new();
        self.transcript_tx.send_if_modified(|text| {
            transcript = std::mem::take(text);
            !transcript.is_empty()
        });
        self.set_listening(false);
        drop(slot);

        match emit.then(|| Utterance::voice(&transcript)).flatten() {
            Some(utterance) => {
                tracing::info!(
                    session = session.id,
                    chars = utterance.text().len(),
                    "Utterance complete"
                );
                let _ = self.utterance_tx.send(SessionUtterance {
                    session: session.id,
                    utterance,
                });
            }
            None => tracing::info!(session = session.id, "Listening stopped"),
        }
        true
    }

    /// Publish the session's transcript if it is still the current one.
    fn publish_transcript(&self, id: u64, text: String) -> bool {
        let slot = self.slot.lock().unwrap();
        if slot.current.as_ref().is_none_or(|session| session.id != id) {
            return false;
        }
        self.transcript_tx.send_if_modified(|current| {
            if *current == text {
                false
            } else {
                *current = text;
                true
            }
        });
        true
    }
}

/// Committed segments plus the uncommitted tail.
#[derive(Debug, Default)]
struct Transcript {
    committed: Vec<String>,
    interim: String,
}

impl Transcript {
    fn apply(&mut self, update: SpeechUpdate) {
        match update {
            SpeechUpdate::Interim(text) => self.interim = text,
            SpeechUpdate::Final(text) => {
                self.interim.clear();
                let text = text.trim();
                if !text.is_empty() {
                    self.committed.push(text.to_string());
                }
            }
            SpeechUpdate::Ended | SpeechUpdate::Error(_) => {}
        }
    }

    fn text(&self) -> String {
        self.committed
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(self.interim.trim()))
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

async fn run_session(
    inner: Arc<Inner>,
    id: u64,
    mut updates: mpsc::UnboundedReceiver<SpeechUpdate>,
    cancel: CancellationToken,
) {
    let mut transcript = Transcript::default();
    let mut deadline: Option<Instant> = None;

    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => return,

            () = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                tracing::debug!(session = id, "Transcript stable");
                inner.end_session(Some(id), true);
                return;
            }

            update = updates.recv() => match update {
                Some(update @ (SpeechUpdate::Interim(_) | SpeechUpdate::Final(_))) => {
                    if inner.gate.is_closed() {
                        tracing::trace!(session = id, "Speech update dropped during playback");
                        continue;
                    }
                    transcript.apply(update);
                    let text = transcript.text();
                    deadline = (!text.is_empty()).then(|| Instant::now() + inner.debounce);
                    if !inner.publish_transcript(id, text) {
                        return;
                    }
                }
                Some(SpeechUpdate::Error(message)) => {
                    tracing::warn!(session = id, error = %message, "Speech capture failed");
                    inner.end_session(Some(id), true);
                    return;
                }
                Some(SpeechUpdate::Ended) | None => {
                    tracing::debug!(session = id, "Speech source ended");
                    inner.end_session(Some(id), true);
                    return;
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interim_replaces_tail_and_final_commits() {
        let mut transcript = Transcript::default();
        transcript.apply(SpeechUpdate::Interim("hel".into()));
        assert_eq!(transcript.text(), "hel");

        transcript.apply(SpeechUpdate::Interim("hello".into()));
        assert_eq!(transcript.text(), "hello");

        transcript.apply(SpeechUpdate::Final(" hello there ".into()));
        transcript.apply(SpeechUpdate::Interim("how".into()));
        assert_eq!(transcript.text(), "hello there how");
    }

    #[test]
    fn blank_updates_leave_transcript_empty() {
        let mut transcript = Transcript::default();
        transcript.apply(SpeechUpdate::Interim("   ".into()));
        transcript.apply(SpeechUpdate::Final(String::new()));
        assert_eq!(transcript.text(), "");
    }

    #[test]
    fn take_nonempty_reports_changes() {
        let mut text = String::from("hi");
        assert!(take_nonempty(&mut text));
        assert!(text.is_empty());
        assert!(!take_nonempty(&mut text));
    }
}
