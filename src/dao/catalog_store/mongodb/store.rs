use std::sync::Arc;

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{Client, Collection, Database, bson::doc};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::info;

use super::{
    config::MongoConfig,
    error::{MongoDaoError, MongoResult},
};
use crate::dao::{catalog_store::CatalogStore, storage::StorageResult};

#[derive(Clone)]
pub struct MongoCatalogStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    // Held so the connection pool lives as long as the database handle.
    _client: Client,
    database: Database,
}

/// Build a client and ping the catalog database once.
///
/// Retries belong to the storage supervisor, which backs off between calls.
async fn open(config: &MongoConfig) -> MongoResult<MongoState> {
    let client = Client::with_options(config.options.clone())
        .map_err(|source| MongoDaoError::ClientConstruction { source })?;
    let database = client.database(&config.database_name);
    database
        .run_command(doc! { "ping": 1 })
        .await
        .map_err(|source| MongoDaoError::InitialPing {
            database: config.database_name.clone(),
            source,
        })?;
    Ok(MongoState {
        _client: client,
        database,
    })
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = self.state.read().await.database.clone();
        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let fresh = open(&self.config).await?;
        *self.state.write().await = fresh;
        Ok(())
    }
}

impl MongoCatalogStore {
    /// Connect and require one successful ping.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let state = open(&config).await?;
        info!(
            database = %config.database_name,
            collection = %config.collection_name,
            "connected to MongoDB catalog"
        );
        Ok(Self {
            inner: Arc::new(MongoInner {
                state: RwLock::new(state),
                config,
            }),
        })
    }

    async fn collection(&self) -> Collection<Value> {
        let guard = self.inner.state.read().await;
        guard
            .database
            .collection::<Value>(&self.inner.config.collection_name)
    }

    async fn list(&self) -> MongoResult<Vec<Value>> {
        let collection = self.collection().await;
        let to_error = |source| MongoDaoError::ListCatalog {
            collection: self.inner.config.collection_name.clone(),
            source,
        };
        collection
            .find(doc! {})
            .projection(doc! { "_id": 0 })
            .await
            .map_err(to_error)?
            .try_collect()
            .await
            .map_err(to_error)
    }
}

impl CatalogStore for MongoCatalogStore {
    fn list_entries(&self) -> BoxFuture<'static, StorageResult<Vec<Value>>> {
        let store = self.clone();
        Box::pin(async move { store.list().await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unreachable_server_fails_without_retrying() {
        let config = MongoConfig::from_uri(
            "mongodb://127.0.0.1:1/?serverSelectionTimeoutMS=50&connectTimeoutMS=50",
            Some("catalog"),
            None,
        )
        .await
        .unwrap();
        let started = std::time::Instant::now();
        let err = MongoCatalogStore::connect(config).await.err().unwrap();
        assert!(matches!(
            err,
            MongoDaoError::InitialPing { ref database, .. } if database == "catalog"
        ));
        assert!(started.elapsed() < std::time::Duration::from_secs(5));
    }
}
