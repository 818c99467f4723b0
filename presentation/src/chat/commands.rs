//! Slash commands of the chat REPL

/// A parsed `/command` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Help,
    Quit,
    /// Start a fresh conversation on the next message
    New,
    Pending,
    Approve(String),
    Reject(String),
    Conversations,
    /// Retitle the current conversation
    Rename(String),
    /// Hide the current conversation from listings
    Archive,
    /// Remove the current conversation with its log and actions
    Delete,
    /// Recognized command missing its selector
    MissingSelector(&'static str),
    Unknown(String),
}

impl ReplCommand {
    /// Parse a line starting with `/`. Returns `None` for ordinary messages.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if !line.starts_with('/') {
            return None;
        }
        let mut parts = line.split_whitespace();
        let name = parts.next().unwrap_or("");
        let rest = line[name.len()..].trim();
        let selector = parts.next().map(str::to_string);

        let command = match name {
            "/quit" | "/exit" | "/q" => ReplCommand::Quit,
            "/help" | "/h" | "/?" => ReplCommand::Help,
            "/new" => ReplCommand::New,
            "/pending" | "/p" => ReplCommand::Pending,
            "/conversations" | "/c" => ReplCommand::Conversations,
            "/approve" | "/a" => match selector {
                Some(s) => ReplCommand::Approve(s),
                None => ReplCommand::MissingSelector("/approve"),
            },
            "/reject" | "/r" => match selector {
                Some(s) => ReplCommand::Reject(s),
                None => ReplCommand::MissingSelector("/reject"),
            },
            "/rename" if rest.is_empty() => ReplCommand::MissingSelector("/rename"),
            "/rename" => ReplCommand::Rename(rest.to_string()),
            "/archive" => ReplCommand::Archive,
            "/delete" => ReplCommand::Delete,
            other => ReplCommand::Unknown(other.to_string()),
        };
        Some(command)
    }

    pub fn help_text() -> &'static str {
        "Commands:
  /help, /h, /?          - Show this help
  /pending, /p           - List actions awaiting confirmation
  /approve, /a <n|id>    - Approve and run a pending action
  /reject, /r <n|id>     - Reject a pending action
  /new                   - Start a new conversation
  /conversations, /c     - List conversations
  /rename <title>        - Retitle the current conversation
  /archive               - Hide the current conversation from the list
  /delete                - Delete the current conversation
  /quit, /exit, /q       - Exit chat"
    }
}
