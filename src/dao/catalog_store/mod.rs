#[cfg(feature = "couch-store")]
pub mod couchdb;
pub mod memory;
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use std::{str::FromStr, sync::Arc};

use futures::future::BoxFuture;
use serde_json::Value;
use tracing::warn;

use crate::dao::storage::{StorageError, StorageResult};

pub use memory::MemoryCatalogStore;

/// Read access to the canonical game catalog.
pub trait CatalogStore: Send + Sync {
    /// Every catalog document, without database bookkeeping fields.
    fn list_entries(&self) -> BoxFuture<'static, StorageResult<Vec<Value>>>;
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}

/// Backend chosen with `CATALOG_STORE`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CatalogBackend {
    #[default]
    Mongo,
    Couch,
    /// JSON array at `CATALOG_FILE`.
    File,
}

impl FromStr for CatalogBackend {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "" | "mongo" | "mongodb" => Ok(Self::Mongo),
            "couch" | "couchdb" => Ok(Self::Couch),
            "file" | "memory" => Ok(Self::File),
            other => Err(format!("unknown catalog store `{other}`")),
        }
    }
}

impl CatalogBackend {
    /// Backend named by `CATALOG_STORE`, falling back to MongoDB.
    pub fn from_env() -> Self {
        let Ok(raw) = std::env::var("CATALOG_STORE") else {
            return Self::default();
        };
        raw.parse().unwrap_or_else(|err: String| {
            warn!(error = %err, "falling back to the default catalog store");
            Self::default()
        })
    }

    /// Connect to this backend using its environment configuration.
    pub async fn connect(self) -> StorageResult<Arc<dyn CatalogStore>> {
        match self {
            #[cfg(feature = "mongo-store")]
            Self::Mongo => {
                let config = mongodb::MongoConfig::from_env().await?;
                let store = mongodb::MongoCatalogStore::connect(config).await?;
                Ok(Arc::new(store) as Arc<dyn CatalogStore>)
            }
            #[cfg(feature = "couch-store")]
            Self::Couch => {
                let config = couchdb::CouchConfig::from_env()?;
                let store = couchdb::CouchCatalogStore::connect(config).await?;
                Ok(Arc::new(store) as Arc<dyn CatalogStore>)
            }
            Self::File => {
                let path = std::env::var("CATALOG_FILE").unwrap_or_else(|_| "config/catalog.json".into());
                Ok(Arc::new(MemoryCatalogStore::from_file(path)?) as Arc<dyn CatalogStore>)
            }
            #[allow(unreachable_patterns)]
            other => Err(StorageError::Disabled {
                backend: format!("{other:?}"),
            }),
        }
    }
}
