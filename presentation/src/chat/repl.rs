//! REPL (Read-Eval-Print Loop) for interactive chat

use super::commands::ReplCommand;
use super::session::{ChatSession, SessionError};
use crate::output::{ConsoleFormatter, ConsoleRenderer};
use crate::progress::WaitingSpinner;
use chrono::Utc;
use colored::Colorize;
use ledger_application::{LlmProvider, ToolExecutorPort};
use reedline::{DefaultPrompt, DefaultPromptSegment, FileBackedHistory, Reedline, Signal};
use std::io;

const HISTORY_CAPACITY: usize = 1000;

/// Interactive chat REPL
pub struct ChatRepl<P: LlmProvider + 'static, T: ToolExecutorPort + 'static> {
    session: ChatSession<P, T>,
    streaming: bool,
    model: String,
}

impl<P: LlmProvider + 'static, T: ToolExecutorPort + 'static> ChatRepl<P, T> {
    pub fn new(session: ChatSession<P, T>) -> Self {
        Self {
            session,
            streaming: true,
            model: String::new(),
        }
    }

    /// Use turn-based exchanges instead of streaming
    pub fn with_streaming(mut self, streaming: bool) -> Self {
        self.streaming = streaming;
        self
    }

    /// Model name shown in the welcome banner
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    fn line_editor() -> Reedline {
        let editor = Reedline::create();
        let history_path = dirs::data_dir().map(|p| p.join("ledger-assistant").join("history.txt"));
        let Some(path) = history_path else {
            return editor;
        };
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        match FileBackedHistory::with_file(HISTORY_CAPACITY, path) {
            Ok(history) => editor.with_history(Box::new(history)),
            Err(e) => {
                tracing::debug!(error = %e, "History file unavailable");
                editor
            }
        }
    }

    /// Run the interactive REPL
    pub async fn run(&mut self) -> io::Result<()> {
        let mut editor = Self::line_editor();
        let prompt = DefaultPrompt::new(
            DefaultPromptSegment::Basic("ledger".to_string()),
            DefaultPromptSegment::Empty,
        );

        self.print_welcome();

        loop {
            match editor.read_line(&prompt) {
                Ok(Signal::Success(buffer)) => {
                    let line = buffer.trim();

                    // Skip empty lines
                    if line.is_empty() {
                        continue;
                    }

                    if let Some(command) = ReplCommand::parse(line) {
                        if self.handle_command(command).await {
                            break;
                        }
                        continue;
                    }

                    self.process_message(line).await;
                }
                Ok(Signal::CtrlC) => {
                    println!("^C");
                    continue;
                }
                Ok(Signal::CtrlD) => {
                    println!("Bye!");
                    break;
                }
                Ok(_) => continue,
                Err(err) => {
                    eprintln!("Error: {:?}", err);
                    break;
                }
            }
        }

        Ok(())
    }

    fn print_welcome(&self) {
        println!();
        println!("╭─────────────────────────────────────────────╮");
        println!("│        Ledger Assistant - Chat Mode         │");
        println!("╰─────────────────────────────────────────────╯");
        println!();
        if !self.model.is_empty() {
            println!("Model: {}", self.model);
        }
        let tools: Vec<&str> = self.session.engine().tools().definitions().names().collect();
        println!("Tools: {}", tools.join(", "));
        println!();
        println!("{}", ReplCommand::help_text());
        println!();
    }

    /// Handle slash commands. Returns true if should exit.
    async fn handle_command(&mut self, command: ReplCommand) -> bool {
        match command {
            ReplCommand::Quit => {
                println!("Bye!");
                return true;
            }
            ReplCommand::Help => {
                println!();
                println!("{}", ReplCommand::help_text());
                println!();
            }
            ReplCommand::New => {
                self.session.new_conversation();
                println!("{}", "Started a new conversation.".dimmed());
            }
            ReplCommand::Pending => match self.session.pending().await {
                Ok(actions) => println!(
                    "{}",
                    ConsoleFormatter::format_pending_list(&actions, Utc::now())
                ),
                Err(e) => Self::print_error(&e),
            },
            ReplCommand::Approve(selector) => match self.session.approve(&selector).await {
                Ok((action, outcome)) => {
                    println!("{}", action.tool_name.bold());
                    let detail = ConsoleFormatter::format_approval(&outcome);
                    println!("{}", ConsoleFormatter::indent(&detail, "  "));
                }
                Err(e) => Self::print_error(&e),
            },
            ReplCommand::Reject(selector) => match self.session.reject(&selector).await {
                Ok(action) => println!(
                    "{} {} [{}]",
                    "Rejected".yellow(),
                    action.tool_name,
                    ConsoleFormatter::short_id(&action.id)
                ),
                Err(e) => Self::print_error(&e),
            },
            ReplCommand::Conversations => match self.session.conversations().await {
                Ok(conversations) => println!(
                    "{}",
                    ConsoleFormatter::format_conversations(&conversations, self.session.current())
                ),
                Err(e) => Self::print_error(&e),
            },
            ReplCommand::Rename(title) => match self.session.rename(&title).await {
                Ok(conversation) => println!("Renamed to {}", conversation.title.bold()),
                Err(e) => Self::print_error(&e),
            },
            ReplCommand::Archive => match self.session.archive().await {
                Ok(()) => println!(
                    "{}",
                    "Archived. The next message starts a new conversation.".dimmed()
                ),
                Err(e) => Self::print_error(&e),
            },
            ReplCommand::Delete => match self.session.delete().await {
                Ok(()) => println!(
                    "{}",
                    "Deleted. The next message starts a new conversation.".dimmed()
                ),
                Err(e) => Self::print_error(&e),
            },
            ReplCommand::MissingSelector("/rename") => println!("Usage: /rename <title>"),
            ReplCommand::MissingSelector(name) => {
                println!("Usage: {} <n|id>", name);
            }
            ReplCommand::Unknown(cmd) => {
                println!("Unknown command: {}", cmd);
                println!("Type /help for available commands");
            }
        }
        false
    }

    fn print_error(error: &SessionError) {
        eprintln!("{} {}", "Error:".red().bold(), error);
    }

    async fn process_message(&mut self, text: &str) {
        println!();

        if self.streaming {
            let mut renderer = ConsoleRenderer::new(io::stdout());
            let mut spinner = WaitingSpinner::start("Thinking...");
            match self.session.stream(text, &mut renderer, &mut spinner).await {
                Ok(deferred) if deferred > 0 => {
                    println!();
                    println!("{}", "Use /approve <n> or /reject <n> to decide.".dimmed());
                }
                Ok(_) => {}
                Err(e) => Self::print_error(&e),
            }
        } else {
            let mut spinner = WaitingSpinner::start("Thinking...");
            let result = self.session.send(text).await;
            spinner.stop();
            match result {
                Ok(reply) => println!("{}", ConsoleFormatter::format_reply(&reply, Utc::now())),
                Err(e) => Self::print_error(&e),
            }
        }
        println!();
    }
}
