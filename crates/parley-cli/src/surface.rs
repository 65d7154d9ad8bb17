//! The interactive terminal surface.
//!
//! Line editing runs on its own OS thread (rustyline blocks); lines are
//! forwarded to the async loop, which also prints engine events as they
//! arrive.

use std::ops::ControlFlow;
use std::thread;

use anyhow::Result;
use parley_voice::{OrchestratorHandle, SpeechFeeder, VoiceError};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::bootstrap::CliContext;
use crate::commands::{HELP, LineCommand};
use crate::presentation::{history_line, render_event};

const PROMPT: &str = "> ";

/// Run the surface until `/quit`, Ctrl-C or end of input, then shut the
/// engine down.
pub async fn run(ctx: CliContext) -> Result<()> {
    let CliContext {
        handle,
        mut events,
        feeder,
        engine,
    } = ctx;
    let surface = Surface { handle, feeder };
    let mut lines = spawn_reader()?;

    println!("parley ready. /help for commands.");

    loop {
        tokio::select! {
            line = lines.recv() => {
                let Some(line) = line else { break };
                if surface.dispatch(LineCommand::parse(&line)).await?.is_break() {
                    break;
                }
            }
            Some(event) = events.recv() => {
                if let Some(text) = render_event(&event) {
                    println!("{text}");
                }
            }
        }
    }

    // The engine may already be gone if every handle was dropped.
    let _ = surface.handle.shutdown();
    engine.await?;
    Ok(())
}

struct Surface {
    handle: OrchestratorHandle,
    feeder: Option<SpeechFeeder>,
}

impl Surface {
    async fn dispatch(&self, command: LineCommand) -> Result<ControlFlow<()>, VoiceError> {
        match command {
            LineCommand::Text(text) => self.handle.submit_text(text)?,
            LineCommand::OpenVoice => self.handle.open_voice()?,
            LineCommand::CloseVoice => self.handle.close_voice()?,
            LineCommand::ToggleMic => self.handle.toggle_mic()?,
            LineCommand::StopAudio => self.handle.stop_audio()?,
            LineCommand::Say(words) => self.feed(|f| f.interim(words)),
            LineCommand::Final(words) => self.feed(|f| f.commit(words)),
            LineCommand::History => {
                for message in self.handle.history().await? {
                    println!("{}", history_line(&message));
                }
            }
            LineCommand::Help => println!("{HELP}"),
            LineCommand::Invalid(line) => println!("unknown command: {line} (try /help)"),
            LineCommand::Empty => {}
            LineCommand::Quit => return Ok(ControlFlow::Break(())),
        }
        Ok(ControlFlow::Continue(()))
    }

    fn feed(&self, push: impl FnOnce(&SpeechFeeder) -> bool) {
        match &self.feeder {
            None => println!("voice is disabled (--no-voice)"),
            Some(feeder) if !push(feeder) => println!("not listening (try /voice or /mic)"),
            Some(_) => {}
        }
    }
}

/// Read lines on a dedicated thread. The channel closes on end of input;
/// Ctrl-C is forwarded as `/quit`.
fn spawn_reader() -> Result<mpsc::UnboundedReceiver<String>> {
    let mut editor = DefaultEditor::new()?;
    let (tx, rx) = mpsc::unbounded_channel();

    thread::Builder::new()
        .name("parley-input".into())
        .spawn(move || {
            loop {
                match editor.readline(PROMPT) {
                    Ok(line) => {
                        if !line.trim().is_empty() {
                            let _ = editor.add_history_entry(line.as_str());
                        }
                        if tx.send(line).is_err() {
                            break;
                        }
                    }
                    Err(ReadlineError::Interrupted) => {
                        let _ = tx.send("/quit".to_string());
                        break;
                    }
                    Err(ReadlineError::Eof) => break,
                    Err(e) => {
                        warn!(error = %e, "Input error");
                        break;
                    }
                }
            }
            debug!("Input thread exiting");
        })?;

    Ok(rx)
}
