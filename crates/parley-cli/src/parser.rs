//! Command-line arguments.

use clap::Parser;
use parley_core::{ResponseBackend, Settings};

/// Talk to a response service by text or (simulated) voice.
#[derive(Debug, Parser)]
#[command(name = "parley")]
#[command(about = "Voice-first conversational turn taking in the terminal")]
#[command(version)]
pub struct Cli {
    /// Speech synthesis endpoint
    #[arg(long, env = "PARLEY_TTS_URL")]
    pub tts_url: Option<String>,

    /// Response service protocol (simple | openai)
    #[arg(long, env = "PARLEY_RESPONSE_BACKEND", value_parser = parse_backend)]
    pub response_backend: Option<ResponseBackend>,

    /// Response endpoint, or the API base URL for the openai backend
    #[arg(long, env = "PARLEY_RESPONSE_URL")]
    pub response_url: Option<String>,

    /// Model name for the openai backend
    #[arg(long, env = "PARLEY_MODEL")]
    pub model: Option<String>,

    /// System prompt for the openai backend
    #[arg(long, env = "PARLEY_SYSTEM_PROMPT")]
    pub system_prompt: Option<String>,

    /// Bearer token sent to the response service
    #[arg(long, env = "PARLEY_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Quiet period (ms) before a spoken transcript is submitted
    #[arg(long, env = "PARLEY_DEBOUNCE_MS")]
    pub debounce_ms: Option<u64>,

    /// Delay (ms) before listening resumes after a voice turn
    #[arg(long, env = "PARLEY_RESTART_DELAY_MS")]
    pub restart_delay_ms: Option<u64>,

    /// Timeout (s) for response and synthesis requests
    #[arg(long, env = "PARLEY_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,

    /// Run text-only, without a speech source
    #[arg(long)]
    pub no_voice: bool,

    /// Discard synthesized audio instead of playing it
    #[arg(long)]
    pub mute: bool,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

impl Cli {
    /// Settings from flags and environment. Unset values keep their
    /// defaults.
    pub fn settings(&self) -> Settings {
        let mut settings = Settings::with_defaults();
        settings.merge(&Settings {
            debounce_ms: self.debounce_ms,
            restart_delay_ms: self.restart_delay_ms,
            tts_url: self.tts_url.clone(),
            response_backend: self.response_backend,
            response_url: self.response_url.clone(),
            model: self.model.clone(),
            system_prompt: self.system_prompt.clone(),
            request_timeout_secs: self.timeout_secs,
            api_key: self.api_key.clone(),
        });
        settings
    }
}

fn parse_backend(value: &str) -> Result<ResponseBackend, String> {
    ResponseBackend::parse(value)
        .ok_or_else(|| format!("unknown backend '{value}', expected 'simple' or 'openai'"))
}
