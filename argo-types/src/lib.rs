//! Core type definitions for Argo.
//!
//! This crate defines the small, storage-agnostic types shared by every
//! other Argo crate:
//! - Entity identifiers (stable UUIDs, revision ids) and user ids
//! - Language codes, including the language-neutral sentinels
//! - The `Clock` abstraction used for revision timestamps
//!
//! Content-model types (entities, fields, schemas) live in `argo-model`.

mod clock;
mod ids;
mod langcode;

pub use clock::{Clock, FixedClock, SystemClock, Timestamp};
pub use ids::{ActingUser, EntityUuid, RevisionId, UserId};
pub use langcode::Langcode;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, TypesError>;

/// Errors that can occur when parsing core types.
#[derive(Debug, thiserror::Error)]
pub enum TypesError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid UUID: {0}")]
    InvalidUuid(#[from] uuid::Error),

    #[error("invalid langcode: {0:?}")]
    InvalidLangcode(String),

    #[error("invalid revision id: {0:?}")]
    InvalidRevisionId(String),
}
