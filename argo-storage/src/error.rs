//! Error types for the storage layer.

use argo_types::RevisionId;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur in storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error (file system).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// No schema registered for a bundle.
    #[error("no schema for {entity_type}.{bundle}")]
    SchemaNotFound { entity_type: String, bundle: String },

    /// The entity changed in storage after it was loaded.
    #[error("stale write to {entity_type} {id}: loaded revision {loaded:?}, latest is {latest:?}")]
    StaleRevision {
        entity_type: String,
        id: u64,
        loaded: Option<RevisionId>,
        latest: Option<RevisionId>,
    },

    /// Invalid data.
    #[error("invalid data: {0}")]
    InvalidData(String),
}
