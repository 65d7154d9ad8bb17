//! Conversation orchestrator: the turn state machine.
//!
//! ```text
//!            utterance                 reply (voice)
//!   Idle ──────────────► AwaitingResponse ─────────────► Speaking
//!    ▲                         │  reply (text) / failure       │
//!    ├─────────────────────────┘                               │
//!    └──────────── playback job ended ─────────────────────────┘
//!
//!   close (any state) ──► Idle, recognizer aborted, playback stopped
//! ```
//!
//! The orchestrator is an actor. One task owns every piece of turn state and
//! handles surface commands, utterances, response results, playback status
//! changes and restart timers in a single `select!` loop, so transitions
//! never interleave. Work that suspends (response generation, the restart
//! delay) runs in spawned tasks that report back with the id of the turn or
//! voice session they were started for; reports carrying a stale id are
//! dropped.

use std::sync::Arc;
use std::time::Duration;

use parley_core::{
    BotReply, ChatMessage, JobId, PlaybackStatus, ResponseError, ResponseService, Settings,
    SurfaceSnapshot, TurnEvent, TurnState, Utterance, UtteranceSource,
};
use tokio::sync::{mpsc, oneshot, watch};
use tokio_util::sync::CancellationToken;

use crate::error::VoiceError;
use crate::playback::PlaybackController;
use crate::recognizer::{SessionUtterance, TurnRecognizer};

// ── Configuration ──────────────────────────────────────────────────

/// Orchestrator tuning.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Delay before listening resumes after a voice turn, and before the
    /// first session when the voice surface opens.
    pub restart_delay: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            restart_delay: Duration::from_millis(parley_core::DEFAULT_RESTART_DELAY_MS),
        }
    }
}

impl OrchestratorConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            restart_delay: settings.effective_restart_delay(),
        }
    }
}

// ── Commands ───────────────────────────────────────────────────────

/// A command sent from the surface to the orchestrator.
#[derive(Debug)]
enum Command {
    SubmitText(String),
    OpenVoice,
    CloseVoice,
    ToggleMic,
    StopAudio,
    History(oneshot::Sender<Vec<ChatMessage>>),
    Shutdown,
}

/// Cloneable handle the surface uses to drive the orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorHandle {
    cmd_tx: mpsc::UnboundedSender<Command>,
    snapshot_rx: watch::Receiver<SurfaceSnapshot>,
}

impl OrchestratorHandle {
    /// Submit typed text. Blank text is ignored.
    pub fn submit_text(&self, text: impl Into<String>) -> Result<(), VoiceError> {
        self.send(Command::SubmitText(text.into()))
    }

    pub fn open_voice(&self) -> Result<(), VoiceError> {
        self.send(Command::OpenVoice)
    }

    /// Close the voice surface, halting everything in flight.
    pub fn close_voice(&self) -> Result<(), VoiceError> {
        self.send(Command::CloseVoice)
    }

    pub fn toggle_mic(&self) -> Result<(), VoiceError> {
        self.send(Command::ToggleMic)
    }

    pub fn stop_audio(&self) -> Result<(), VoiceError> {
        self.send(Command::StopAudio)
    }

    pub fn shutdown(&self) -> Result<(), VoiceError> {
        self.send(Command::Shutdown)
    }

    /// The session transcript so far.
    pub async fn history(&self) -> Result<Vec<ChatMessage>, VoiceError> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::History(tx))?;
        rx.await.map_err(|_| VoiceError::OrchestratorStopped)
    }

    /// Latest surface snapshot.
    pub fn snapshot(&self) -> SurfaceSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SurfaceSnapshot> {
        self.snapshot_rx.clone()
    }

    fn send(&self, cmd: Command) -> Result<(), VoiceError> {
        self.cmd_tx
            .send(cmd)
            .map_err(|_| VoiceError::OrchestratorStopped)
    }
}

// ── Internal state ─────────────────────────────────────────────────

/// The turn currently in progress.
struct ActiveTurn {
    id: u64,
    source: UtteranceSource,
    /// Aborts the response request when the turn is abandoned.
    cancel: CancellationToken,
    /// Set once the reply is handed to playback.
    job: Option<JobId>,
}

/// An open voice surface. Restart timers die with it.
struct VoiceSession {
    id: u64,
    cancel: CancellationToken,
    /// Last recognizer session started before this surface opened. Only
    /// utterances from later sessions belong to it.
    heard_after: u64,
}

/// Result of one response request.
struct TurnOutcome {
    turn: u64,
    result: Result<BotReply, ResponseError>,
}

// ── Orchestrator ───────────────────────────────────────────────────

/// Actor that owns turn state. Construct with [`new`], then drive with
/// [`run`] on a spawned task.
///
/// [`new`]: ConversationOrchestrator::new
/// [`run`]: ConversationOrchestrator::run
pub struct ConversationOrchestrator {
    responder: Arc<dyn ResponseService>,
    playback: PlaybackController,
    recognizer: TurnRecognizer,
    utterances: mpsc::UnboundedReceiver<SessionUtterance>,
    config: OrchestratorConfig,

    cmd_rx: mpsc::UnboundedReceiver<Command>,
    events_tx: mpsc::UnboundedSender<TurnEvent>,
    snapshot_tx: watch::Sender<SurfaceSnapshot>,
    outcome_tx: mpsc::UnboundedSender<TurnOutcome>,
    outcome_rx: mpsc::UnboundedReceiver<TurnOutcome>,
    restart_tx: mpsc::UnboundedSender<u64>,
    restart_rx: mpsc::UnboundedReceiver<u64>,

    state: TurnState,
    turn: Option<ActiveTurn>,
    last_turn_id: u64,
    voice: Option<VoiceSession>,
    last_voice_id: u64,
    history: Vec<ChatMessage>,
    capture_reported: bool,
}

impl ConversationOrchestrator {
    /// Wire the orchestrator to its collaborators.
    ///
    /// `utterances` is the stream returned by [`TurnRecognizer::new`].
    /// Returns the actor, the surface handle and the surface event stream.
    pub fn new(
        responder: Arc<dyn ResponseService>,
        playback: PlaybackController,
        recognizer: TurnRecognizer,
        utterances: mpsc::UnboundedReceiver<SessionUtterance>,
        config: OrchestratorConfig,
    ) -> (Self, OrchestratorHandle, mpsc::UnboundedReceiver<TurnEvent>) {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
        let (restart_tx, restart_rx) = mpsc::unbounded_channel();

        let snapshot = SurfaceSnapshot {
            capture_supported: recognizer.is_supported(),
            ..SurfaceSnapshot::default()
        };
        let (snapshot_tx, snapshot_rx) = watch::channel(snapshot);

        let orchestrator = Self {
            responder,
            playback,
            recognizer,
            utterances,
            config,
            cmd_rx,
            events_tx,
            snapshot_tx,
            outcome_tx,
            outcome_rx,
            restart_tx,
            restart_rx,
            state: TurnState::Idle,
            turn: None,
            last_turn_id: 0,
            voice: None,
            last_voice_id: 0,
            history: Vec::new(),
            capture_reported: false,
        };
        let handle = OrchestratorHandle {
            cmd_tx,
            snapshot_rx,
        };
        (orchestrator, handle, events_rx)
    }

    /// Process events until shutdown is requested or every handle is
    /// dropped.
    pub async fn run(mut self) {
        let mut playback_rx = self.playback.subscribe();
        let mut listening_rx = self.recognizer.subscribe_listening();
        let mut transcript_rx = self.recognizer.subscribe_transcript();

        tracing::info!("Conversation orchestrator started");

        loop {
            tokio::select! {
                cmd = self.cmd_rx.recv() => match cmd {
                    Some(Command::Shutdown) | None => break,
                    Some(cmd) => self.handle_command(cmd),
                },
                Some(heard) = self.utterances.recv() => self.on_utterance(heard),
                Some(outcome) = self.outcome_rx.recv() => self.on_outcome(outcome),
                Some(session) = self.restart_rx.recv() => self.on_restart_due(session),
                Ok(()) = playback_rx.changed() => {
                    let status = *playback_rx.borrow_and_update();
                    self.on_playback(status);
                }
                Ok(()) = listening_rx.changed() => {
                    let listening = *listening_rx.borrow_and_update();
                    self.on_listening(listening);
                }
                Ok(()) = transcript_rx.changed() => {
                    let text = transcript_rx.borrow_and_update().clone();
                    self.on_transcript(text);
                }
            }
        }

        self.teardown();
        tracing::info!("Conversation orchestrator stopped");
    }

    fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::SubmitText(text) => match Utterance::typed(&text) {
                Some(utterance) => self.begin_turn(utterance),
                None => tracing::debug!("Ignoring blank text submission"),
            },
            Command::OpenVoice => self.open_voice(),
            Command::CloseVoice => self.close_voice(),
            Command::ToggleMic => self.toggle_mic(),
            Command::StopAudio => self.playback.stop(),
            Command::History(reply) => {
                let _ = reply.send(self.history.clone());
            }
            Command::Shutdown => {}
        }
    }

    // ── Turns ──────────────────────────────────────────────────────

    /// An utterance can still be queued when the surface closes, or closes
    /// and reopens; it only counts if it was heard by the open surface.
    fn on_utterance(&mut self, heard: SessionUtterance) {
        let current = self
            .voice
            .as_ref()
            .is_some_and(|voice| heard.session > voice.heard_after);
        if !current {
            tracing::debug!(
                session = heard.session,
                "Dropping utterance from a closed voice session"
            );
            return;
        }
        self.begin_turn(heard.utterance);
    }

    fn begin_turn(&mut self, utterance: Utterance) {
        if self.state.is_loading() {
            tracing::debug!(
                state = %self.state,
                source = %utterance.source(),
                "Submission rejected, turn in progress"
            );
            self.emit(TurnEvent::SubmissionRejected { state: self.state });
            return;
        }

        self.last_turn_id += 1;
        let id = self.last_turn_id;
        let source = utterance.source();
        let cancel = CancellationToken::new();

        self.push_message(ChatMessage::user(utterance.text(), source));

        let responder = Arc::clone(&self.responder);
        let outcome_tx = self.outcome_tx.clone();
        let token = cancel.clone();
        let text = utterance.into_text();
        tokio::spawn(async move {
            tokio::select! {
                () = token.cancelled() => {
                    tracing::debug!(turn = id, "Response request abandoned");
                }
                result = responder.generate(&text) => {
                    let _ = outcome_tx.send(TurnOutcome { turn: id, result });
                }
            }
        });

        tracing::debug!(turn = id, %source, "Turn started");
        self.turn = Some(ActiveTurn {
            id,
            source,
            cancel,
            job: None,
        });
        self.set_state(TurnState::AwaitingResponse);
    }

    fn on_outcome(&mut self, outcome: TurnOutcome) {
        let source = match &self.turn {
            Some(turn) if turn.id == outcome.turn && self.state == TurnState::AwaitingResponse => {
                turn.source
            }
            _ => {
                tracing::debug!(turn = outcome.turn, "Discarding response for abandoned turn");
                return;
            }
        };

        match outcome.result {
            Ok(reply) => {
                self.push_message(ChatMessage::assistant(reply.content.clone()));
                if source.is_spoken() {
                    let job = self.playback.play(&reply.content);
                    if let Some(turn) = self.turn.as_mut() {
                        turn.job = Some(job);
                    }
                    self.set_state(TurnState::Speaking);
                } else {
                    self.finish_turn();
                }
            }
            Err(e) => {
                tracing::warn!(turn = outcome.turn, error = %e, "Response generation failed");
                self.emit(TurnEvent::ResponseUnavailable);
                self.finish_turn();
            }
        }
    }

    fn on_playback(&mut self, status: PlaybackStatus) {
        let is_playing = status.is_playing();
        let is_audio_processing = status.is_processing();
        let changed = self.snapshot_tx.send_if_modified(|snapshot| {
            let changed = snapshot.is_playing != is_playing
                || snapshot.is_audio_processing != is_audio_processing;
            snapshot.is_playing = is_playing;
            snapshot.is_audio_processing = is_audio_processing;
            changed
        });
        if changed {
            self.emit(TurnEvent::PlaybackChanged {
                is_playing,
                is_audio_processing,
            });
        }

        if self.state != TurnState::Speaking {
            return;
        }
        let ended = self
            .turn
            .as_ref()
            .and_then(|turn| turn.job)
            .is_some_and(|job| status.has_ended(job));
        if ended {
            self.finish_turn();
        }
    }

    /// Back to Idle. Voice turns schedule the next listening session.
    fn finish_turn(&mut self) {
        let Some(turn) = self.turn.take() else {
            return;
        };
        tracing::debug!(turn = turn.id, "Turn finished");
        self.set_state(TurnState::Idle);
        if turn.source.is_spoken() {
            self.schedule_restart();
        }
    }

    // ── Voice surface ──────────────────────────────────────────────

    fn open_voice(&mut self) {
        if self.voice.is_some() {
            return;
        }
        if !self.recognizer.is_supported() {
            self.report_capture_unavailable();
            return;
        }

        self.last_voice_id += 1;
        self.voice = Some(VoiceSession {
            id: self.last_voice_id,
            cancel: CancellationToken::new(),
            heard_after: self.recognizer.last_session(),
        });
        tracing::info!(session = self.last_voice_id, "Voice surface opened");
        self.snapshot_tx.send_modify(|snapshot| snapshot.voice_open = true);
        self.emit(TurnEvent::VoiceSurfaceChanged { open: true });

        if self.state.is_idle() {
            self.schedule_restart();
        }
    }

    /// Halt everything: listening, playback, the pending response.
    fn close_voice(&mut self) {
        if let Some(voice) = self.voice.take() {
            voice.cancel.cancel();
            tracing::info!(session = voice.id, "Voice surface closed");
            self.snapshot_tx.send_modify(|snapshot| snapshot.voice_open = false);
            self.emit(TurnEvent::VoiceSurfaceChanged { open: false });
        }

        self.recognizer.abort();
        self.playback.stop();
        if let Some(turn) = self.turn.take() {
            turn.cancel.cancel();
            tracing::debug!(turn = turn.id, "Turn abandoned");
        }
        self.set_state(TurnState::Idle);
    }

    fn toggle_mic(&mut self) {
        if self.voice.is_none() {
            tracing::debug!("Mic toggle ignored, voice surface is closed");
            return;
        }
        if self.recognizer.is_listening() {
            self.recognizer.stop();
        } else if self.state.is_idle() {
            self.start_listening();
        } else {
            tracing::debug!(state = %self.state, "Mic toggle ignored, turn in progress");
        }
    }

    fn schedule_restart(&self) {
        let Some(voice) = &self.voice else {
            return;
        };
        let session = voice.id;
        let cancel = voice.cancel.clone();
        let restart_tx = self.restart_tx.clone();
        let delay = self.config.restart_delay;

        tokio::spawn(async move {
            tokio::select! {
                () = cancel.cancelled() => {}
                () = tokio::time::sleep(delay) => {
                    let _ = restart_tx.send(session);
                }
            }
        });
        tracing::debug!(session, ?delay, "Listening restart scheduled");
    }

    fn on_restart_due(&mut self, session: u64) {
        let current = self.voice.as_ref().map(|voice| voice.id);
        if current != Some(session) {
            tracing::debug!(session, "Ignoring restart for closed voice session");
            return;
        }
        if !self.state.is_idle() || self.recognizer.is_listening() {
            return;
        }
        self.start_listening();
    }

    fn start_listening(&mut self) {
        match self.recognizer.start() {
            Ok(()) => {}
            Err(VoiceError::CaptureUnsupported) => self.report_capture_unavailable(),
            Err(e) => tracing::warn!(error = %e, "Could not start listening"),
        }
    }

    fn report_capture_unavailable(&mut self) {
        if self.capture_reported {
            return;
        }
        self.capture_reported = true;
        tracing::warn!("Speech capture unavailable, voice mode disabled");
        self.emit(TurnEvent::CaptureUnavailable);
    }

    // ── Recognizer observation ─────────────────────────────────────

    fn on_listening(&mut self, listening: bool) {
        self.snapshot_tx.send_modify(|snapshot| snapshot.listening = listening);
        self.emit(TurnEvent::ListeningChanged { listening });
    }

    fn on_transcript(&mut self, text: String) {
        self.snapshot_tx
            .send_modify(|snapshot| snapshot.transcript.clone_from(&text));
        self.emit(TurnEvent::TranscriptUpdated { text });
    }

    // ── Helpers ────────────────────────────────────────────────────

    fn set_state(&mut self, state: TurnState) {
        if self.state == state {
            return;
        }
        tracing::debug!(from = %self.state, to = %state, "Turn state changed");
        self.state = state;
        self.snapshot_tx.send_modify(|snapshot| snapshot.state = state);
        self.emit(TurnEvent::StateChanged { state });
    }

    fn push_message(&mut self, message: ChatMessage) {
        self.history.push(message.clone());
        self.emit(TurnEvent::MessageAdded { message });
    }

    fn emit(&self, event: TurnEvent) {
        // The surface may already be gone during shutdown.
        let _ = self.events_tx.send(event);
    }

    fn teardown(&mut self) {
        if let Some(voice) = self.voice.take() {
            voice.cancel.cancel();
        }
        if let Some(turn) = self.turn.take() {
            turn.cancel.cancel();
        }
        self.recognizer.abort();
        self.playback.stop();
    }
}
