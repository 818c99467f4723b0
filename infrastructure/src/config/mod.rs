//! Configuration file loading for ledger-assistant
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `LEDGER_*` environment variables
//! 2. `--config <path>` specified file
//! 3. Project root: `./ledger.toml` or `./.ledger.toml`
//! 4. Global: `<config dir>/ledger-assistant/config.toml`
//! 5. Default values

mod file_config;
mod loader;
mod settings;

pub use file_config::{ConfigIssue, FileAssistantConfig, FileConfig, FileProviderConfig, Severity};
pub use loader::ConfigLoader;
pub use settings::FileSettingsSource;
