//! Lazily loaded provider configuration
//!
//! Read from the settings source on first use and cached until
//! [`invalidate`](ProviderConfigCache::invalidate) is called.

use crate::ports::llm_provider::ProviderError;
use crate::ports::settings::SettingsSource;
use ledger_domain::ProviderConfig;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

pub struct ProviderConfigCache {
    source: Arc<dyn SettingsSource>,
    cached: RwLock<Option<ProviderConfig>>,
}

impl ProviderConfigCache {
    pub fn new(source: Arc<dyn SettingsSource>) -> Self {
        Self {
            source,
            cached: RwLock::new(None),
        }
    }

    /// The cached configuration, loading it on first use.
    ///
    /// A configuration without an API key is a [`ProviderError::Configuration`]
    /// and is not cached.
    pub async fn get(&self) -> Result<ProviderConfig, ProviderError> {
        if let Some(config) = self.cached.read().await.as_ref() {
            return Ok(config.clone());
        }

        let mut slot = self.cached.write().await;
        if let Some(config) = slot.as_ref() {
            return Ok(config.clone());
        }

        let config = self.source.provider_config().await?;
        if !config.has_api_key() {
            return Err(ProviderError::Configuration(
                "no API key configured".to_string(),
            ));
        }
        debug!(model = %config.model, "Loaded provider configuration");
        *slot = Some(config.clone());
        Ok(config)
    }

    /// Drop the cached value; the next [`get`](Self::get) reloads.
    pub async fn invalidate(&self) {
        *self.cached.write().await = None;
        debug!("Provider configuration invalidated");
    }
}
