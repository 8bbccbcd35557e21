//! Reference graph walker: translates an entity and, recursively, the
//! entities it references.
//!
//! # Per-entity steps
//!
//! 1. Discard any existing target-language variant.
//! 2. Clone the source-language fields into a fresh target variant.
//! 3. Apply the entity's payload (looked up by its duplicate source UUID
//!    when it has one) with the [`PropertyImporter`].
//! 4. Recurse into references of the translated variant that point at
//!    composite entities or at entities that have a payload.
//! 5. Unpublish, unless the payload asks to publish.
//! 6. Apply the requested or initial moderation state.
//! 7. Stamp timestamps and revision metadata; allocate a new revision.
//! 8. Mark the variant as affected by this revision.
//! 9. Stage the entity for saving.
//!
//! Nothing is written until the whole graph has been processed; the staged
//! entities are then committed with a single [`EntityStorage::save_all`].
//! Each UUID is processed at most once per walk, so shared and cyclic
//! references are safe.

use std::collections::{BTreeMap, BTreeSet};

use argo_model::{Entity, EntityRef, EntitySchema, ModerationHandler, Translation};
use argo_storage::EntityStorage;
use argo_types::{ActingUser, Clock, EntityUuid, Langcode, RevisionId};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::bundle::{TranslationPayload, TranslationsById};
use crate::config::ArgoConfig;
use crate::import::PropertyImporter;
use crate::{ArgoError, ArgoResult};

/// Collaborators of a translate operation, passed in explicitly.
#[derive(Clone, Copy)]
pub struct TranslationContext<'a> {
    pub clock: &'a dyn Clock,
    pub user: &'a ActingUser,
    pub config: &'a ArgoConfig,
    pub moderation: &'a dyn ModerationHandler,
}

impl std::fmt::Debug for TranslationContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranslationContext")
            .field("user", self.user)
            .field("config", self.config)
            .finish_non_exhaustive()
    }
}

/// An entity written by a translate operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedEntity {
    pub entity_type: String,
    pub uuid: EntityUuid,
    pub revision_id: Option<RevisionId>,
}

/// Outcome of a translate operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationReport {
    pub target_langcode: Langcode,
    /// Saved entities, children before their parents.
    pub saved: Vec<SavedEntity>,
}

impl TranslationReport {
    /// How many times an entity was saved.
    pub fn save_count(&self, uuid: &EntityUuid) -> usize {
        self.saved.iter().filter(|s| s.uuid == *uuid).count()
    }
}

/// Translates one reference graph into one target language.
pub struct ReferenceGraphWalker<'a, S: EntityStorage + ?Sized> {
    storage: &'a mut S,
    ctx: TranslationContext<'a>,
    target: Langcode,
    translations: &'a TranslationsById,
    visited: BTreeSet<EntityUuid>,
    /// Revision each processed entity will be saved under.
    staged_revisions: BTreeMap<EntityUuid, RevisionId>,
    staged: Vec<Entity>,
}

impl<'a, S: EntityStorage + ?Sized> ReferenceGraphWalker<'a, S> {
    pub fn new(
        storage: &'a mut S,
        ctx: TranslationContext<'a>,
        target: Langcode,
        translations: &'a TranslationsById,
    ) -> Self {
        Self {
            storage,
            ctx,
            target,
            translations,
            visited: BTreeSet::new(),
            staged_revisions: BTreeMap::new(),
            staged: Vec::new(),
        }
    }

    /// Translates `root` and everything it (transitively) references, then
    /// saves all of it at once. On error nothing is saved.
    pub fn translate(mut self, root: Entity) -> ArgoResult<TranslationReport> {
        if self.target.is_neutral() || self.target == root.langcode {
            return Err(ArgoError::InvalidLanguage {
                entity_type: root.entity_type.clone(),
                uuid: root.uuid,
                source_langcode: root.langcode.clone(),
                target: self.target.clone(),
            });
        }
        let payload = self.translations.get(&root.translation_key());

        info!(
            entity_type = %root.entity_type,
            uuid = %root.uuid,
            target = %self.target,
            payloads = self.translations.len(),
            "Translating entity graph"
        );

        self.visited.insert(root.uuid);
        self.visit(root, payload)?;

        let report = TranslationReport {
            target_langcode: self.target.clone(),
            saved: self
                .staged
                .iter()
                .map(|e| SavedEntity {
                    entity_type: e.entity_type.clone(),
                    uuid: e.uuid,
                    revision_id: e.revision_id,
                })
                .collect(),
        };
        self.storage.save_all(self.staged)?;

        info!(saved = report.saved.len(), "Translation saved");
        Ok(report)
    }

    /// Processes one entity. The caller has already marked it visited.
    /// Returns the revision the entity will be saved under.
    fn visit(&mut self, entity: Entity, payload: Option<&'a TranslationPayload>) -> ArgoResult<Option<RevisionId>> {
        let entity_type = entity.entity_type.clone();
        let uuid = entity.uuid;
        self.process(entity, payload).map_err(|e| ArgoError::InEntity {
            entity_type,
            uuid,
            source: Box::new(e),
        })
    }

    fn process(&mut self, mut entity: Entity, payload: Option<&'a TranslationPayload>) -> ArgoResult<Option<RevisionId>> {
        if entity.is_language_neutral() || entity.langcode == self.target {
            if payload.is_some() {
                return Err(ArgoError::InvalidLanguage {
                    entity_type: entity.entity_type.clone(),
                    uuid: entity.uuid,
                    source_langcode: entity.langcode.clone(),
                    target: self.target.clone(),
                });
            }
            debug!(
                entity_type = %entity.entity_type,
                uuid = %entity.uuid,
                langcode = %entity.langcode,
                "Skipping entity that cannot take the target language"
            );
            return Ok(None);
        }
        if let Some(p) = payload.filter(|p| p.target_langcode != self.target) {
            warn!(
                uuid = %entity.uuid,
                payload_target = %p.target_langcode,
                target = %self.target,
                "Ignoring payload target language"
            );
        }

        let schema = self
            .storage
            .schema(&entity.entity_type, &entity.bundle)
            .cloned()
            .ok_or_else(|| ArgoError::SchemaNotFound {
                entity_type: entity.entity_type.clone(),
                bundle: entity.bundle.clone(),
            })?;

        // Steps 1-3
        entity.remove_translation(&self.target);
        let fresh = entity.source().map(Translation::cloned_from).unwrap_or_default();
        entity.add_translation(self.target.clone(), fresh);
        if let Some(payload) = payload {
            PropertyImporter::new(&schema).translate(&mut entity, &self.target, &payload.items)?;
        }

        // Step 4
        self.translate_references(&mut entity, &schema)?;

        // Steps 5-8
        self.apply_state(&mut entity, &schema, payload);
        self.stamp_revision(&mut entity, &schema);

        debug!(
            entity_type = %entity.entity_type,
            uuid = %entity.uuid,
            revision = ?entity.revision_id,
            translated = payload.is_some(),
            "Staged translated entity"
        );

        // Step 9
        let revision_id = entity.revision_id;
        if let Some(rev) = revision_id {
            self.staged_revisions.insert(entity.uuid, rev);
        }
        self.staged.push(entity);
        Ok(revision_id)
    }

    fn translate_references(&mut self, entity: &mut Entity, schema: &EntitySchema) -> ArgoResult<()> {
        let references: Vec<(String, usize, EntityRef)> = entity
            .references_in(schema, &self.target)
            .into_iter()
            .map(|(field, delta, target)| (field.to_string(), delta, target.clone()))
            .collect();

        for (field, delta, reference) in references {
            if self.visited.contains(&reference.uuid) {
                if let Some(rev) = self.staged_revisions.get(&reference.uuid).copied() {
                    repin(entity, &field, delta, &reference, rev);
                }
                continue;
            }

            let staged = self.translate_child(&reference).map_err(|e| ArgoError::InReference {
                field: field.clone(),
                delta,
                source: Box::new(e),
            })?;
            if let Some(rev) = staged {
                repin(entity, &field, delta, &reference, rev);
            }
        }
        Ok(())
    }

    /// Loads and processes a referenced entity if it is composite or has a
    /// payload. Returns its new revision, if it was staged under one.
    fn translate_child(&mut self, reference: &EntityRef) -> ArgoResult<Option<RevisionId>> {
        let composite = self.ctx.config.is_composite(&reference.entity_type);
        let loaded = match reference.revision_id {
            Some(rev) => self.storage.load_revision(&reference.entity_type, rev)?,
            None => self.storage.load_by_uuid(&reference.entity_type, &reference.uuid)?,
        };
        let Some(child) = loaded else {
            if composite || self.translations.contains_key(&reference.uuid) {
                return Err(ArgoError::not_found(&reference.entity_type, reference.uuid));
            }
            return Ok(None);
        };

        let payload = self.translations.get(&child.translation_key());
        if !composite && payload.is_none() {
            return Ok(None);
        }
        if !self.visited.insert(child.uuid) {
            return Ok(self.staged_revisions.get(&child.uuid).copied());
        }
        self.visit(child, payload)
    }

    fn apply_state(&self, entity: &mut Entity, schema: &EntitySchema, payload: Option<&TranslationPayload>) {
        let moderation = self.ctx.moderation;
        let current: &Entity = entity;
        let state = if moderation.is_moderated(schema, current) {
            payload
                .and_then(|p| p.state_id.clone())
                .filter(|s| !s.trim().is_empty())
                .or_else(|| moderation.initial_state(schema, current))
        } else {
            None
        };
        let published_state = state
            .as_deref()
            .is_some_and(|s| moderation.is_published_state(schema, current, s));
        let publish = payload.is_some_and(|p| p.publish) || published_state;

        if let Some(translation) = entity.translation_mut(&self.target) {
            translation.status = publish;
            translation.moderation_state = state;
            translation.revision_translation_affected = Some(true);
            translation.revision_translation_affected_enforced = true;
        }
    }

    fn stamp_revision(&mut self, entity: &mut Entity, schema: &EntitySchema) {
        let now = self.ctx.clock.now();
        if let Some(translation) = entity.translation_mut(&self.target) {
            translation.created = Some(now);
            translation.changed = Some(now);
        }
        if schema.revision_metadata {
            entity.revision.created = Some(now);
            entity.revision.user = Some(self.ctx.user.uid);
            entity.revision.log_message = Some(self.ctx.config.revision_log_message.clone());
        }
        if schema.revisionable {
            entity.new_revision = true;
            entity.revision_id = Some(self.storage.allocate_revision_id());
        }
        if self.ctx.config.is_composite(&entity.entity_type) {
            entity.needs_save = true;
        }
    }
}

/// Points every language variant's reference item at `revision_id`.
fn repin(entity: &mut Entity, field: &str, delta: usize, reference: &EntityRef, revision_id: RevisionId) {
    if reference.revision_id.is_none() {
        return;
    }
    for translation in entity.translations.values_mut() {
        let target = translation
            .fields
            .get_mut(field)
            .and_then(|items| items.get_mut(delta))
            .and_then(|item| item.target.as_mut())
            .filter(|t| t.uuid == reference.uuid);
        if let Some(target) = target {
            target.revision_id = Some(revision_id);
        }
    }
}
