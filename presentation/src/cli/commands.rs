//! CLI command definitions

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// How events and replies are written to stdout
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Colored, human-readable console output
    Console,
    /// One JSON object per line
    Json,
}

/// CLI arguments for ledger-assistant
#[derive(Parser, Debug)]
#[command(name = "ledger-assistant")]
#[command(author, version, about = "Conversational assistant for invoices, tasks and reminders")]
#[command(long_about = r#"
Ledger Assistant answers questions about your tasks and invoices and can act
on them through tools. Actions with side effects (creating an invoice,
scheduling a reminder) are queued for your confirmation instead of running
immediately; approve or reject them from chat mode.

Configuration files are loaded from (in priority order):
1. LEDGER_* environment variables (e.g. LEDGER_PROVIDER__MODEL)
2. --config <path>     Explicit config file
3. ./ledger.toml       Project-level config
4. ~/.config/ledger-assistant/config.toml   Global config

Example:
  ledger-assistant "Which tasks have unbilled hours?"
  ledger-assistant --json "Invoice the website redesign for January"
  ledger-assistant --chat
"#)]
pub struct Cli {
    /// The message to send (not required in chat mode)
    pub message: Option<String>,

    /// Start interactive chat mode
    #[arg(short, long)]
    pub chat: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "console")]
    pub output: OutputFormat,

    /// Shorthand for `--output json`
    #[arg(long)]
    pub json: bool,

    /// Use the turn-based path instead of streaming
    #[arg(long)]
    pub no_stream: bool,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,

    /// Write diagnostic logs to daily files in this directory
    #[arg(long, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,
}

impl Cli {
    pub fn output_format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else {
            self.output
        }
    }
}
