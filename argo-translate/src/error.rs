//! Error types for export and translation.

use argo_storage::StorageError;
use argo_types::{EntityUuid, Langcode};
use serde_json::Value;
use thiserror::Error;

/// Result type for Argo operations.
pub type ArgoResult<T> = Result<T, ArgoError>;

/// Errors that can occur while exporting or translating entities.
#[derive(Debug, Error)]
pub enum ArgoError {
    /// Root or referenced entity is absent.
    #[error("{entity_type} {id} not found")]
    NotFound { entity_type: String, id: String },

    /// A translation path does not resolve against the entity.
    #[error(transparent)]
    FieldNotFound(#[from] FieldNotFound),

    /// Language-neutral content, or a neutral target language.
    #[error("{entity_type} {uuid} cannot be translated to {target}: source language is {source_langcode}")]
    InvalidLanguage {
        entity_type: String,
        uuid: EntityUuid,
        source_langcode: Langcode,
        target: Langcode,
    },

    /// The payload map has no entry for the root entity.
    #[error("no translation payload for {0}")]
    MissingPayload(EntityUuid),

    /// No schema is registered for the entity's bundle.
    #[error("no schema for {entity_type}.{bundle}")]
    SchemaNotFound { entity_type: String, bundle: String },

    /// Error raised while processing one entity of a reference graph.
    #[error("{entity_type} {uuid}: {source}")]
    InEntity {
        entity_type: String,
        uuid: EntityUuid,
        source: Box<ArgoError>,
    },

    /// Error raised below a reference field item.
    #[error("via {field}[{delta}]: {source}")]
    InReference {
        field: String,
        delta: usize,
        source: Box<ArgoError>,
    },

    /// Storage error.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error (config files).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ArgoError {
    pub(crate) fn not_found(entity_type: &str, id: impl ToString) -> Self {
        Self::NotFound {
            entity_type: entity_type.to_string(),
            id: id.to_string(),
        }
    }

    /// The innermost error, with entity and reference context stripped.
    pub fn deepest(&self) -> &ArgoError {
        match self {
            Self::InEntity { source, .. } | Self::InReference { source, .. } => source.deepest(),
            other => other,
        }
    }

    /// Entities on the way to the failure, outermost first.
    pub fn entity_chain(&self) -> Vec<(&str, EntityUuid)> {
        let mut chain = Vec::new();
        let mut current = self;
        loop {
            match current {
                Self::InEntity { entity_type, uuid, source } => {
                    chain.push((entity_type.as_str(), *uuid));
                    current = source;
                }
                Self::InReference { source, .. } => current = source,
                _ => return chain,
            }
        }
    }
}

/// Which part of a translation path failed to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldNotFoundKind {
    /// The schema has no such field or property.
    UnknownField,
    /// The field exists but this entity has no such item or list entry.
    MissingItem,
}

impl std::fmt::Display for FieldNotFoundKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::UnknownField => "unknown field",
            Self::MissingItem => "missing item",
        })
    }
}

/// A translation path that does not resolve, with enough context for a
/// translator to find the offending entry.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("field not found ({kind}) {label:?} at {path:?} with value {value}: {detail}")]
pub struct FieldNotFound {
    pub kind: FieldNotFoundKind,
    /// Human label of the field, or its name when the field is unknown.
    pub label: String,
    pub path: String,
    pub value: Value,
    pub detail: String,
}
