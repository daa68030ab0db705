//! # Byte Storage Errors

use thiserror::Error;

use crate::errors::EngineError;

/// Result type for byte storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Byte storage errors
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("Object not found: {0}")]
    ObjectNotFound(String),

    #[error("Object already exists: {0}")]
    ObjectAlreadyExists(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("I/O error: {0}")]
    IoError(String),
}

impl From<StorageError> for EngineError {
    fn from(err: StorageError) -> Self {
        match err {
            // A second writer for the same token lost the race
            StorageError::ObjectAlreadyExists(_) => EngineError::InvalidUploadUrl,
            other => EngineError::Internal(other.to_string()),
        }
    }
}
