use std::error::Error;
use thiserror::Error;

/// Result alias for catalog storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by catalog backends regardless of the underlying database.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage unavailable: {message}")]
    Unavailable {
        message: String,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// The selected backend was compiled out.
    #[error("catalog backend `{backend}` is not enabled in this build")]
    Disabled { backend: String },
}

impl StorageError {
    /// Wrap any backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message,
            source: Box::new(source),
        }
    }
}
