//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and converted into domain and application
//! types on demand.

mod assistant;
mod provider;

pub use assistant::FileAssistantConfig;
pub use provider::FileProviderConfig;

use serde::{Deserialize, Serialize};

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Provider credentials and request defaults
    pub provider: FileProviderConfig,
    /// Orchestration settings
    pub assistant: FileAssistantConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

/// A problem found in a loaded configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigIssue {
    pub severity: Severity,
    /// Dotted path of the offending key, e.g. `provider.temperature`
    pub field: String,
    pub message: String,
}

impl ConfigIssue {
    fn error(field: &str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            field: field.to_string(),
            message: message.into(),
        }
    }

    fn warning(field: &str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        if self.assistant.max_rounds == 0 {
            issues.push(ConfigIssue::error(
                "assistant.max_rounds",
                "must be at least 1",
            ));
        }
        if self.assistant.pending_action_ttl_minutes <= 0 {
            issues.push(ConfigIssue::error(
                "assistant.pending_action_ttl_minutes",
                "must be positive",
            ));
        }
        if self.assistant.sweep_interval_secs == 0 {
            issues.push(ConfigIssue::warning(
                "assistant.sweep_interval_secs",
                "0 disables the expiry sweep; expired actions are still refused",
            ));
        }
        if !(0.0..=1.0).contains(&self.provider.temperature) {
            issues.push(ConfigIssue::error(
                "provider.temperature",
                format!("{} is outside 0.0..=1.0", self.provider.temperature),
            ));
        }
        if self.provider.max_tokens == 0 {
            issues.push(ConfigIssue::error("provider.max_tokens", "must be at least 1"));
        }
        if self.provider.model.trim().is_empty() {
            issues.push(ConfigIssue::error("provider.model", "must not be empty"));
        }
        if self.provider.api_key.is_some() {
            issues.push(ConfigIssue::warning(
                "provider.api_key",
                format!(
                    "storing the key in a file is not recommended, set {} instead",
                    self.provider.api_key_env
                ),
            ));
        }

        issues
    }

    /// True when [`validate`](Self::validate) reports no errors.
    pub fn is_valid(&self) -> bool {
        self.validate()
            .iter()
            .all(|issue| issue.severity != Severity::Error)
    }
}
