use serde_json::Value;
use tracing::warn;

use crate::state::SharedState;

/// Every catalog document, or nothing when the store is missing or failing.
///
/// Clients treat the catalog as advisory, so failures never surface.
pub async fn list_games(state: &SharedState) -> Vec<Value> {
    let Some(store) = state.catalog_store().await else {
        warn!("catalog requested in degraded mode");
        return Vec::new();
    };
    match store.list_entries().await {
        Ok(entries) => entries,
        Err(err) => {
            warn!(error = %err, "catalog listing failed");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use futures::future::BoxFuture;
    use serde_json::json;

    use crate::{
        dao::{
            catalog_store::{CatalogStore, MemoryCatalogStore},
            storage::{StorageError, StorageResult},
        },
        services::test_support::state_with,
        upstream::test_support::FakeFetch,
    };

    struct BrokenStore;

    impl CatalogStore for BrokenStore {
        fn list_entries(&self) -> BoxFuture<'static, StorageResult<Vec<Value>>> {
            Box::pin(async {
                Err(StorageError::unavailable(
                    "list failed".into(),
                    std::io::Error::other("connection reset"),
                ))
            })
        }

        fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
            Box::pin(async { Ok(()) })
        }

        fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
            Box::pin(async { Ok(()) })
        }
    }

    fn unreachable_upstream() -> Arc<FakeFetch> {
        FakeFetch::new(|_| panic!("catalog listing must not reach upstream"))
    }

    #[tokio::test]
    async fn degraded_mode_lists_nothing() {
        let state = state_with(&unreachable_upstream());
        assert!(list_games(&state).await.is_empty());
    }

    #[tokio::test]
    async fn installed_store_is_listed() {
        let state = state_with(&unreachable_upstream());
        state
            .set_catalog_store(Arc::new(MemoryCatalogStore::new(vec![
                json!({"canonicalId": "g1"}),
            ])))
            .await;
        assert_eq!(list_games(&state).await, vec![json!({"canonicalId": "g1"})]);
    }

    #[tokio::test]
    async fn failing_store_lists_nothing() {
        let state = state_with(&unreachable_upstream());
        state.set_catalog_store(Arc::new(BrokenStore)).await;
        assert!(list_games(&state).await.is_empty());
    }
}
