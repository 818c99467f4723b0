//! Provider configuration value objects

use serde::{Deserialize, Serialize};

pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
pub const DEFAULT_MAX_TOKENS: u32 = 4096;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_API_VERSION: &str = "2023-06-01";

/// Resolved settings for talking to the provider.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub api_key: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub base_url: String,
    pub api_version: String,
}

impl ProviderConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    /// Overlay the fields set in `patch`.
    pub fn merged(&self, patch: &ProviderConfigPatch) -> Self {
        Self {
            api_key: patch.api_key.clone().unwrap_or_else(|| self.api_key.clone()),
            model: patch.model.clone().unwrap_or_else(|| self.model.clone()),
            max_tokens: patch.max_tokens.unwrap_or(self.max_tokens),
            temperature: patch.temperature.unwrap_or(self.temperature),
            base_url: patch.base_url.clone().unwrap_or_else(|| self.base_url.clone()),
            api_version: patch
                .api_version
                .clone()
                .unwrap_or_else(|| self.api_version.clone()),
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self::new("")
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("base_url", &self.base_url)
            .field("api_version", &self.api_version)
            .finish()
    }
}

/// A partial configuration, e.g. a key typed into a settings form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfigPatch {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub base_url: Option<String>,
    pub api_version: Option<String>,
}

impl ProviderConfigPatch {
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

/// Mask all but the last four characters of a secret.
pub fn redact(secret: &str) -> String {
    let count = secret.chars().count();
    if count <= 4 {
        return "*".repeat(count);
    }
    let tail: String = secret.chars().skip(count - 4).collect();
    format!("{}{}", "*".repeat(8), tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_overlays_only_set_fields() {
        let base = ProviderConfig::new("sk-base").with_model("claude-a");
        let merged = base.merged(&ProviderConfigPatch::default().with_api_key("sk-new"));
        assert_eq!(merged.api_key, "sk-new");
        assert_eq!(merged.model, "claude-a");
        assert_eq!(merged.max_tokens, DEFAULT_MAX_TOKENS);
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = ProviderConfig::new("sk-ant-secret-1234");
        let debug = format!("{:?}", config);
        assert!(!debug.contains("secret"));
        assert!(debug.contains("********1234"));
        assert!(!ProviderConfig::default().has_api_key());
    }
}
