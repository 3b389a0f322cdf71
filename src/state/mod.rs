use std::sync::Arc;

use tokio::sync::{RwLock, watch};

use crate::{
    config::AppConfig,
    dao::catalog_store::CatalogStore,
    error::ServiceError,
    upstream::{HttpFetch, PsnClient, XboxClient},
};

pub type SharedState = Arc<AppState>;

/// Shared server state: upstream clients and the catalog store slot.
pub struct AppState {
    config: AppConfig,
    psn: PsnClient,
    xbox: XboxClient,
    catalog_store: RwLock<Option<Arc<dyn CatalogStore>>>,
    degraded: watch::Sender<bool>,
}

impl AppState {
    /// Build the state around an HTTP primitive.
    ///
    /// The application starts in degraded mode until a catalog store is installed.
    pub fn new(config: AppConfig, http: Arc<dyn HttpFetch>) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            psn: PsnClient::new(http.clone(), config.upstream.clone()),
            xbox: XboxClient::new(http, config.upstream.clone()),
            config,
            catalog_store: RwLock::new(None),
            degraded: degraded_tx,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Console network client.
    pub fn psn(&self) -> &PsnClient {
        &self.psn
    }

    /// Xbox Live client.
    pub fn xbox(&self) -> &XboxClient {
        &self.xbox
    }

    /// Current catalog store, if one is installed.
    pub async fn catalog_store(&self) -> Option<Arc<dyn CatalogStore>> {
        self.catalog_store.read().await.as_ref().cloned()
    }

    /// Current catalog store, or [`ServiceError::Degraded`].
    pub async fn require_catalog_store(&self) -> Result<Arc<dyn CatalogStore>, ServiceError> {
        self.catalog_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a catalog store and leave degraded mode.
    pub async fn set_catalog_store(&self, store: Arc<dyn CatalogStore>) {
        *self.catalog_store.write().await = Some(store);
        self.update_degraded(false).await;
    }

    /// Drop the catalog store and enter degraded mode.
    pub async fn clear_catalog_store(&self) {
        self.catalog_store.write().await.take();
        self.update_degraded(true).await;
    }

    /// Current degraded flag.
    pub async fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub async fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            let changed = *current != value;
            *current = value;
            changed
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{dao::catalog_store::MemoryCatalogStore, upstream::ReqwestFetch};
    use std::time::Duration;

    #[tokio::test]
    async fn installing_a_store_leaves_degraded_mode() {
        let http = Arc::new(ReqwestFetch::new(Duration::from_secs(1)).unwrap());
        let state = AppState::new(AppConfig::default(), http);
        let mut watcher = state.degraded_watcher();
        assert!(state.is_degraded().await);
        assert!(state.require_catalog_store().await.is_err());

        state
            .set_catalog_store(Arc::new(MemoryCatalogStore::default()))
            .await;
        assert!(!state.is_degraded().await);
        assert!(watcher.has_changed().unwrap());
        assert!(!*watcher.borrow_and_update());

        state.clear_catalog_store().await;
        assert!(state.is_degraded().await);
    }
}
