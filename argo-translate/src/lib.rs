//! Translation export and import for content entities.
//!
//! - [`path`]: converts nested property trees to flat `(path, value)` pairs and back
//! - [`export`]: flattens an entity's translatable properties into an [`ExportBundle`]
//! - [`import`]: writes translated values back into a language variant
//! - [`walker`]: translates a whole reference graph and saves it atomically
//! - [`ArgoService`]: the caller-facing operations over an entity storage
//!
//! # Example
//!
//! ```ignore
//! let mut service = ArgoService::new(storage, ArgoConfig::default());
//! let bundle = service.export("node", &uuid, None)?;
//! let payload = TranslationPayload::new(
//!     Langcode::parse("de")?,
//!     uuid,
//!     vec![bundle.items[0].translated("Hallo")],
//! );
//! service.translate("node", &uuid, &TranslationsById::from([(uuid, payload)]))?;
//! ```

mod bundle;
mod config;
mod error;
pub mod export;
pub mod import;
pub mod metatag;
pub mod path;
mod service;
pub mod uri;
pub mod walker;

pub use bundle::{
    ExportBundle, ExportWarning, PayloadItem, ReferenceRecord, TranslatableProperty, TranslationPayload,
    TranslationsById,
};
pub use config::{ArgoConfig, DEFAULT_REVISION_LOG};
pub use error::{ArgoError, ArgoResult, FieldNotFound, FieldNotFoundKind};
pub use export::PropertyExporter;
pub use import::PropertyImporter;
pub use path::{PathError, PropertyPath};
pub use service::{ArgoService, FieldValue};
pub use walker::{ReferenceGraphWalker, SavedEntity, TranslationContext, TranslationReport};
