//! Slash command parsing for the chat REPL

/// One line of user input, interpreted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    /// Plain text to send to the active session
    Ask(String),
    New,
    List,
    Switch(String),
    History,
    Help,
    Quit,
    /// A recognised command used incorrectly, with a usage hint
    Invalid(String),
    Unknown(String),
    Empty,
}

pub const HELP_TEXT: &str = "\
Commands:
  /new                 start a new chat and switch to it
  /list                list chats (alias: /sessions)
  /switch <n|id>       switch to chat number n or an id prefix
  /history             show the active chat again
  /help                show this help
  /quit                exit (alias: /exit)
Anything else is sent as a question to the active chat.";

impl ReplCommand {
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return ReplCommand::Empty;
        }

        let Some(command) = trimmed.strip_prefix('/') else {
            return ReplCommand::Ask(trimmed.to_string());
        };

        let (name, argument) = match command.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (command, ""),
        };

        match name.to_lowercase().as_str() {
            "new" => ReplCommand::New,
            "list" | "sessions" => ReplCommand::List,
            "switch" if argument.is_empty() => {
                ReplCommand::Invalid("Usage: /switch <number|id>".to_string())
            }
            "switch" => ReplCommand::Switch(argument.to_string()),
            "history" => ReplCommand::History,
            "help" | "?" => ReplCommand::Help,
            "quit" | "exit" => ReplCommand::Quit,
            _ => ReplCommand::Unknown(format!("/{}", name)),
        }
    }
}
