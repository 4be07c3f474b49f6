//! Storage layer error types
//!
//! All errors that can occur while reading or writing table files are defined here.

use std::path::PathBuf;

use thiserror::Error;

use crate::storage::types::InvalidNameError;

/// the main error type for storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    /// I/O error (filesystem level)
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization or deserialization failed
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// invalid table identifier
    #[error("invalid table id: {0}")]
    InvalidTableId(#[from] InvalidNameError),

    /// a file parsed as JSON but does not have the expected shape
    #[error("corrupted data at {path}: {reason}")]
    CorruptedData { path: PathBuf, reason: String },

    /// the storage root does not exist and was not allowed to be created
    #[error("storage root not found: {0}")]
    RootNotFound(PathBuf),
}

impl StorageError {
    /// check if this error means the data on disk cannot be trusted
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            StorageError::CorruptedData { .. } | StorageError::Serialization(_)
        )
    }
}

/// result type alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
