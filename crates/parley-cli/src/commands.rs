//! Line commands accepted by the terminal surface.

/// One line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineCommand {
    /// Plain text: submit a typed turn.
    Text(String),
    OpenVoice,
    CloseVoice,
    ToggleMic,
    /// Feed an interim speech result.
    Say(String),
    /// Feed a final speech result.
    Final(String),
    StopAudio,
    History,
    Help,
    Quit,
    /// Blank line.
    Empty,
    /// A `/word` that is not a command, or a command missing its argument.
    Invalid(String),
}

impl LineCommand {
    /// Parse one input line. Anything not starting with `/` is text.
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Self::Empty;
        }
        let Some(rest) = line.strip_prefix('/') else {
            return Self::Text(line.to_string());
        };

        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };

        match (name, arg.is_empty()) {
            ("voice", true) => Self::OpenVoice,
            ("close", true) => Self::CloseVoice,
            ("mic", true) => Self::ToggleMic,
            ("stop", true) => Self::StopAudio,
            ("history", true) => Self::History,
            ("help", true) => Self::Help,
            ("quit" | "exit", true) => Self::Quit,
            ("say", false) => Self::Say(arg.to_string()),
            ("final", false) => Self::Final(arg.to_string()),
            _ => Self::Invalid(line.to_string()),
        }
    }
}

pub const HELP: &str = "\
commands:
  <text>          send a typed message
  /voice          open the voice surface
  /close          close the voice surface
  /mic            toggle listening
  /say <words>    interim speech result
  /final <words>  final speech result
  /stop           stop audio
  /history        show the transcript
  /quit           exit";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_submitted_trimmed() {
        assert_eq!(
            LineCommand::parse("  what's the weather?  "),
            LineCommand::Text("what's the weather?".to_string())
        );
        assert_eq!(LineCommand::parse("   "), LineCommand::Empty);
    }

    #[test]
    fn bare_commands() {
        assert_eq!(LineCommand::parse("/voice"), LineCommand::OpenVoice);
        assert_eq!(LineCommand::parse("/close"), LineCommand::CloseVoice);
        assert_eq!(LineCommand::parse("/mic"), LineCommand::ToggleMic);
        assert_eq!(LineCommand::parse("/stop"), LineCommand::StopAudio);
        assert_eq!(LineCommand::parse("/exit"), LineCommand::Quit);
    }

    #[test]
    fn speech_commands_take_the_rest_of_the_line() {
        assert_eq!(
            LineCommand::parse("/say  turn the   lights"),
            LineCommand::Say("turn the   lights".to_string())
        );
        assert_eq!(
            LineCommand::parse("/final off"),
            LineCommand::Final("off".to_string())
        );
    }

    #[test]
    fn malformed_commands_are_invalid() {
        assert!(matches!(LineCommand::parse("/say"), LineCommand::Invalid(_)));
        assert!(matches!(LineCommand::parse("/mic now"), LineCommand::Invalid(_)));
        assert!(matches!(LineCommand::parse("/dance"), LineCommand::Invalid(_)));
    }
}
