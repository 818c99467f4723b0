//! Newline-delimited JSON output

use super::EventSink;
use ledger_domain::ChatEvent;
use serde::Serialize;
use std::io::{self, Write};

/// Writes each value as one compact JSON object per line.
pub struct NdjsonWriter<W: Write> {
    out: W,
}

impl<W: Write> NdjsonWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn write_value<T: Serialize>(&mut self, value: &T) -> io::Result<()> {
        serde_json::to_writer(&mut self.out, value)?;
        self.out.write_all(b"\n")?;
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> EventSink for NdjsonWriter<W> {
    fn emit(&mut self, event: &ChatEvent) -> io::Result<()> {
        self.write_value(event)
    }
}
