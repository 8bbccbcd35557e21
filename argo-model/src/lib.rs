//! Content entity model for Argo.
//!
//! Defines the types every other Argo crate works against:
//! - [`Entity`]: a content entity with per-language [`Translation`]s
//! - [`FieldItem`] / [`EntityRef`]: field value slots and references
//! - [`EntitySchema`]: a bundle's ordered field and property definitions
//! - [`DataType`] / [`PropertyKind`]: declared property types and how they export
//! - [`ModerationHandler`]: moderation workflow collaborator
//!
//! These types mirror the host content platform's entity/field API closely
//! enough that export paths (`field.delta.property`) resolve against them.

mod entity;
mod field;
mod handler;
mod schema;

pub use entity::{Entity, RevisionMeta, Translation};
pub use field::{EntityRef, FieldItem};
pub use handler::{ModerationHandler, SchemaModeration};
pub use schema::{DataType, EntitySchema, FieldDefinition, PropertyDefinition, PropertyKind, Workflow};
