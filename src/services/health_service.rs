use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Report whether a catalog store is installed, pinging it on the way.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    match state.catalog_store().await {
        Some(store) => {
            if let Err(err) = store.health_check().await {
                warn!(error = %err, "catalog health check failed");
            }
        }
        None => warn!("catalog store unavailable (degraded mode)"),
    }

    HealthResponse::new(!state.is_degraded().await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::{
        dao::catalog_store::MemoryCatalogStore,
        dto::health::HealthStatus,
        services::test_support::state_with,
        upstream::test_support::FakeFetch,
    };

    #[tokio::test]
    async fn reports_degraded_until_a_store_is_installed() {
        let fake = FakeFetch::new(|_| panic!("health must not reach upstream"));
        let state = state_with(&fake);
        assert_eq!(health_status(&state).await.status, HealthStatus::Degraded);

        state
            .set_catalog_store(Arc::new(MemoryCatalogStore::default()))
            .await;
        let health = health_status(&state).await;
        assert_eq!(health.status, HealthStatus::Ok);
        assert!(health.catalog_store);
    }
}
