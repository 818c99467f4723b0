//! File-backed settings source
//!
//! Re-reads the configuration sources on every call, so invalidating the
//! engine's cached provider config picks up edited files and environment.

use super::loader::ConfigLoader;
use async_trait::async_trait;
use ledger_application::ports::llm_provider::ProviderError;
use ledger_application::ports::settings::SettingsSource;
use ledger_domain::ProviderConfig;
use std::path::PathBuf;

pub struct FileSettingsSource {
    config_path: Option<PathBuf>,
}

impl FileSettingsSource {
    pub fn new(config_path: Option<PathBuf>) -> Self {
        Self { config_path }
    }
}

#[async_trait]
impl SettingsSource for FileSettingsSource {
    async fn provider_config(&self) -> Result<ProviderConfig, ProviderError> {
        let config = ConfigLoader::load(self.config_path.as_ref())
            .map_err(|e| ProviderError::Configuration(e.to_string()))?;
        let resolved = config.provider.to_provider_config();
        tracing::debug!(
            model = %resolved.model,
            base_url = %resolved.base_url,
            has_key = resolved.has_api_key(),
            "Loaded provider settings"
        );
        Ok(resolved)
    }
}
