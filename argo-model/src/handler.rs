use crate::{Entity, EntitySchema};

/// Moderation collaborator: decides whether an entity participates in a
/// workflow and which states it may be put in.
///
/// The default methods read the workflow declared on the bundle's
/// [`EntitySchema`]. Hosts with their own moderation rules override them.
pub trait ModerationHandler: Send + Sync {
    /// Whether the entity is under a moderation workflow.
    fn is_moderated(&self, schema: &EntitySchema, _entity: &Entity) -> bool {
        schema.workflow.is_some()
    }

    /// The workflow's initial state for this entity.
    fn initial_state(&self, schema: &EntitySchema, _entity: &Entity) -> Option<String> {
        schema.workflow.as_ref().map(|w| w.initial_state.clone())
    }

    /// Whether putting the entity in `state` publishes it.
    fn is_published_state(&self, schema: &EntitySchema, _entity: &Entity, state: &str) -> bool {
        schema
            .workflow
            .as_ref()
            .is_some_and(|w| w.published_states.iter().any(|s| s == state))
    }
}

/// Moderation driven purely by the workflows declared on schemas.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaModeration;

impl ModerationHandler for SchemaModeration {}
