//! Composition root: wires adapters into the conversation engine.

use std::sync::Arc;

use anyhow::{Context, Result};
use parley_core::{Settings, TurnEvent, validate_settings};
use parley_voice::{
    AudioOutput, ChannelSpeechSource, ConversationOrchestrator, EchoGate, OrchestratorConfig,
    OrchestratorHandle, PlaybackController, RodioOutput, SilentOutput, SpeechFeeder, SpeechSource,
    TurnRecognizer, UnsupportedSpeechSource,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Start-up options that are not part of [`Settings`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CliConfig {
    /// Run without a speech source.
    pub no_voice: bool,
    /// Discard audio instead of opening an output device.
    pub mute: bool,
}

/// A running conversation.
pub struct CliContext {
    pub handle: OrchestratorHandle,
    pub events: mpsc::UnboundedReceiver<TurnEvent>,
    /// Keyboard stand-in for a speech recognizer; `None` with `--no-voice`.
    pub feeder: Option<SpeechFeeder>,
    pub engine: JoinHandle<()>,
}

/// Validate settings, build every collaborator and spawn the orchestrator.
pub fn bootstrap(settings: &Settings, config: CliConfig) -> Result<CliContext> {
    validate_settings(settings).context("Invalid settings")?;

    let synthesizer =
        parley_http::build_synthesizer(settings).context("Failed to set up speech synthesis")?;
    let responder = parley_http::build_response_service(settings)
        .context("Failed to set up the response service")?;

    let gate = EchoGate::new();
    let playback = PlaybackController::new(synthesizer, audio_output(config.mute), gate.clone());

    let (source, feeder) = speech_source(config.no_voice);
    let (recognizer, utterances) =
        TurnRecognizer::new(source, gate, settings.effective_debounce());

    let (orchestrator, handle, events) = ConversationOrchestrator::new(
        responder,
        playback,
        recognizer,
        utterances,
        OrchestratorConfig::from_settings(settings),
    );
    let engine = tokio::spawn(orchestrator.run());

    info!(
        voice = !config.no_voice,
        debounce_ms = settings.effective_debounce().as_millis(),
        "Conversation engine started"
    );

    Ok(CliContext {
        handle,
        events,
        feeder,
        engine,
    })
}

fn speech_source(no_voice: bool) -> (Arc<dyn SpeechSource>, Option<SpeechFeeder>) {
    if no_voice {
        return (Arc::new(UnsupportedSpeechSource), None);
    }
    let source = ChannelSpeechSource::new();
    let feeder = source.feeder();
    (Arc::new(source), Some(feeder))
}

fn audio_output(mute: bool) -> Arc<dyn AudioOutput> {
    if mute {
        return Arc::new(SilentOutput);
    }
    match RodioOutput::spawn() {
        Ok(output) => Arc::new(output),
        Err(e) => {
            warn!(error = %e, "No audio output device, replies will not be audible");
            Arc::new(SilentOutput)
        }
    }
}
