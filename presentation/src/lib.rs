//! Presentation layer for ledger-assistant
//!
//! This crate contains CLI definitions, the chat REPL, output formatters
//! and progress display.

pub mod chat;
pub mod cli;
pub mod output;
pub mod progress;

pub use chat::{ChatRepl, ChatSession, ReplCommand, SessionError};
pub use cli::commands::{Cli, OutputFormat};
pub use output::{ConsoleFormatter, ConsoleRenderer, EventSink, NdjsonWriter};
pub use progress::WaitingSpinner;
