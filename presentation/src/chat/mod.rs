//! Interactive chat mode

pub mod commands;
pub mod repl;
pub mod session;

pub use commands::ReplCommand;
pub use repl::ChatRepl;
pub use session::{ChatSession, SessionError, select_action};
