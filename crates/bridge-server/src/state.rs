use crate::bootstrap::TemplateLoader;
use bridge_core::assets::AssetResolver;
use bridge_core::config::BridgeConfig;
use bridge_core::error::ConfigurationError;
use bridge_core::messages::{MessageStore, RequestMessageStore};
use bridge_core::packer::AdapterRegistry;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared state for the negotiation middleware and the handlers behind it.
///
/// The config sits behind a lock so it can be swapped at runtime; each
/// request takes an `Arc` snapshot and never sees a half-applied change.
#[derive(Clone)]
pub struct BridgeState {
    config: Arc<RwLock<Arc<BridgeConfig>>>,
    pub registry: Arc<AdapterRegistry>,
    pub resolver: Arc<AssetResolver>,
    pub templates: Arc<TemplateLoader>,
    pub messages: Arc<dyn MessageStore>,
}

impl BridgeState {
    pub fn new(config: BridgeConfig) -> Result<Self, ConfigurationError> {
        config.asset_source()?;
        Ok(Self {
            config: Arc::new(RwLock::new(Arc::new(config))),
            registry: Arc::new(AdapterRegistry::with_defaults()),
            resolver: Arc::new(AssetResolver::new()),
            templates: Arc::new(TemplateLoader::new()),
            messages: Arc::new(RequestMessageStore),
        })
    }

    pub fn with_registry(mut self, registry: AdapterRegistry) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    pub fn with_message_store(mut self, store: impl MessageStore + 'static) -> Self {
        self.messages = Arc::new(store);
        self
    }

    /// Snapshot of the current config.
    pub async fn config(&self) -> Arc<BridgeConfig> {
        Arc::clone(&*self.config.read().await)
    }

    /// Replace the config. Cached manifests and templates are dropped so the
    /// next request reads them under the new settings.
    pub async fn reload(&self, config: BridgeConfig) -> Result<(), ConfigurationError> {
        config.asset_source()?;
        *self.config.write().await = Arc::new(config);
        self.resolver.clear_cache();
        self.templates.clear_cache();
        tracing::info!("bridge configuration reloaded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn new_rejects_missing_source() {
        let mut config = BridgeConfig::development("http://localhost:5173");
        config.dev_server_url = None;
        assert!(matches!(
            BridgeState::new(config),
            Err(ConfigurationError::MissingAssetSource)
        ));
    }

    #[test]
    fn new_rejects_both_sources() {
        let mut config = BridgeConfig::development("http://localhost:5173");
        config.bundle_dir = Some(PathBuf::from("/tmp/dist"));
        assert!(matches!(
            BridgeState::new(config),
            Err(ConfigurationError::AmbiguousAssetSource)
        ));
    }

    #[tokio::test]
    async fn reload_swaps_snapshot() {
        let state = BridgeState::new(BridgeConfig::development("http://localhost:5173")).unwrap();
        let before = state.config().await;
        state
            .reload(BridgeConfig::production("/tmp/dist"))
            .await
            .unwrap();
        let after = state.config().await;
        assert_eq!(before.dev_server_url.as_deref(), Some("http://localhost:5173"));
        assert_eq!(after.bundle_dir, Some(PathBuf::from("/tmp/dist")));
    }

    #[tokio::test]
    async fn reload_keeps_old_config_on_error() {
        let state = BridgeState::new(BridgeConfig::development("http://localhost:5173")).unwrap();
        let mut bad = BridgeConfig::production("/tmp/dist");
        bad.dev_server_url = Some("http://localhost:5173".into());
        assert!(state.reload(bad).await.is_err());
        assert!(state.config().await.bundle_dir.is_none());
    }
}
