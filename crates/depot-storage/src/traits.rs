//! Storage errors and their mapping into the ingest taxonomy.

use depot_core::IngestError;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Entropy source unavailable: {0}")]
    EntropyUnavailable(String),

    #[error("Invalid storage name: {0}")]
    InvalidName(String),

    #[error("Storage directory unavailable: {0}")]
    DirectoryUnavailable(String),

    #[error("Create failed: {0}")]
    CreateFailed(String),

    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Content inspection failed: {0}")]
    InspectFailed(String),

    #[error("Content inspector unavailable: {0}")]
    InspectorUnavailable(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for IngestError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::EntropyUnavailable(msg) => IngestError::EntropySource(msg),
            other => IngestError::Storage(other.to_string()),
        }
    }
}
