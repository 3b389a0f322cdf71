//! Catalog held in memory, optionally seeded from a JSON file.

use std::{fs, io, path::Path, sync::Arc};

use futures::future::BoxFuture;
use serde_json::Value;
use thiserror::Error;

use crate::dao::storage::{StorageError, StorageResult};

use super::CatalogStore;

#[derive(Debug, Error)]
pub enum CatalogFileError {
    #[error("failed to read catalog file `{path}`")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("catalog file `{path}` is not a JSON array")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl From<CatalogFileError> for StorageError {
    fn from(err: CatalogFileError) -> Self {
        StorageError::unavailable(err.to_string(), err)
    }
}

/// Fixed catalog; always healthy.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalogStore {
    entries: Arc<Vec<Value>>,
}

impl MemoryCatalogStore {
    pub fn new(entries: Vec<Value>) -> Self {
        Self {
            entries: Arc::new(entries),
        }
    }

    /// Load a JSON array of catalog documents.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CatalogFileError> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let contents = fs::read_to_string(path).map_err(|source| CatalogFileError::Read {
            path: display.clone(),
            source,
        })?;
        let entries = serde_json::from_str(&contents).map_err(|source| CatalogFileError::Parse {
            path: display,
            source,
        })?;
        Ok(Self::new(entries))
    }
}

impl CatalogStore for MemoryCatalogStore {
    fn list_entries(&self) -> BoxFuture<'static, StorageResult<Vec<Value>>> {
        let entries = self.entries.clone();
        Box::pin(async move { Ok(entries.as_ref().clone()) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}
