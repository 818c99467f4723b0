//! Output formatting for assistant turns

pub mod console;
pub mod ndjson;

use ledger_domain::ChatEvent;
use std::io;

/// Receives the events of a streamed turn, in order.
pub trait EventSink {
    fn emit(&mut self, event: &ChatEvent) -> io::Result<()>;
}

pub use console::{ConsoleFormatter, ConsoleRenderer};
pub use ndjson::NdjsonWriter;
