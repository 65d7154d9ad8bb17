//! Turning surface events into terminal lines.
//!
//! Format-only: no decisions about the conversation happen here.

use parley_core::{ChatMessage, MessageRole, TurnEvent, TurnState};

/// The line to print for `event`, if any.
///
/// User messages are not echoed for typed input (the user just typed them)
/// but are for voice input, where the transcript is the only feedback.
pub fn render_event(event: &TurnEvent) -> Option<String> {
    match event {
        TurnEvent::StateChanged { state } => match state {
            TurnState::AwaitingResponse => Some("… thinking".to_string()),
            TurnState::Speaking => Some("🔊 speaking".to_string()),
            TurnState::Idle => None,
        },
        TurnEvent::MessageAdded { message } => render_message(message),
        TurnEvent::SubmissionRejected { state } => {
            Some(format!("⚠️  still busy ({state}), message ignored"))
        }
        TurnEvent::ResponseUnavailable => Some("⚠️  no reply, try again".to_string()),
        TurnEvent::VoiceSurfaceChanged { open: true } => Some("🎙  voice on".to_string()),
        TurnEvent::VoiceSurfaceChanged { open: false } => Some("🎙  voice off".to_string()),
        TurnEvent::ListeningChanged { listening: true } => Some("● listening".to_string()),
        TurnEvent::ListeningChanged { listening: false } => Some("○ not listening".to_string()),
        TurnEvent::TranscriptUpdated { text } if !text.is_empty() => Some(format!("  » {text}")),
        TurnEvent::TranscriptUpdated { .. } | TurnEvent::PlaybackChanged { .. } => None,
        TurnEvent::CaptureUnavailable => {
            Some("⚠️  speech capture is not available, type instead".to_string())
        }
    }
}

/// One transcript line for `/history`.
pub fn history_line(message: &ChatMessage) -> String {
    match message.source {
        Some(source) => format!("[{} · {source}] {}", message.role, message.content),
        None => format!("[{}] {}", message.role, message.content),
    }
}

fn render_message(message: &ChatMessage) -> Option<String> {
    match message.role {
        MessageRole::Assistant => Some(format!("bot: {}", message.content)),
        MessageRole::User if message.source.is_some_and(|s| s.is_spoken()) => {
            Some(format!("you (voice): {}", message.content))
        }
        MessageRole::User | MessageRole::System => None,
    }
}
