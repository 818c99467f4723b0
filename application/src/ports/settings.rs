//! Settings source port
//!
//! Where provider settings come from (config files, environment, a settings
//! table). Read on demand; the engine caches the result until invalidated.

use super::llm_provider::ProviderError;
use async_trait::async_trait;
use ledger_domain::ProviderConfig;

#[async_trait]
pub trait SettingsSource: Send + Sync {
    async fn provider_config(&self) -> Result<ProviderConfig, ProviderError>;
}

/// A fixed configuration, for tests and embedding.
pub struct StaticSettings(pub ProviderConfig);

#[async_trait]
impl SettingsSource for StaticSettings {
    async fn provider_config(&self) -> Result<ProviderConfig, ProviderError> {
        Ok(self.0.clone())
    }
}
