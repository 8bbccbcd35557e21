//! Service boundary: the operations callers invoke by entity type and id.

use argo_model::{Entity, ModerationHandler, SchemaModeration};
use argo_storage::EntityStorage;
use argo_types::{Clock, EntityUuid, Langcode, RevisionId, SystemClock};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::bundle::{ExportBundle, TranslationsById};
use crate::config::ArgoConfig;
use crate::error::{FieldNotFound, FieldNotFoundKind};
use crate::export::PropertyExporter;
use crate::walker::{ReferenceGraphWalker, TranslationContext, TranslationReport};
use crate::{ArgoError, ArgoResult};

/// One language's value of a field, as returned by [`ArgoService::get_field`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldValue {
    /// The field's item values.
    pub value: Value,
    pub language: Langcode,
}

/// Export and translate entities held by an [`EntityStorage`].
pub struct ArgoService<S: EntityStorage> {
    storage: S,
    config: ArgoConfig,
    clock: Box<dyn Clock>,
    moderation: Box<dyn ModerationHandler>,
}

impl<S: EntityStorage> ArgoService<S> {
    /// A service using the system clock and schema-declared workflows.
    pub fn new(storage: S, config: ArgoConfig) -> Self {
        Self {
            storage,
            config,
            clock: Box::new(SystemClock),
            moderation: Box::new(SchemaModeration),
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    #[must_use]
    pub fn with_moderation(mut self, moderation: impl ModerationHandler + 'static) -> Self {
        self.moderation = Box::new(moderation);
        self
    }

    pub fn config(&self) -> &ArgoConfig {
        &self.config
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Exports an entity, at a specific revision if one is given.
    pub fn export(&self, entity_type: &str, uuid: &EntityUuid, revision_id: Option<RevisionId>) -> ArgoResult<ExportBundle> {
        let entity = match revision_id {
            Some(rev) => self
                .storage
                .load_revision(entity_type, rev)?
                .filter(|e| e.uuid == *uuid)
                .ok_or_else(|| ArgoError::not_found(entity_type, format!("{uuid} at revision {rev}")))?,
            None => self.load_by_uuid(entity_type, uuid)?,
        };
        PropertyExporter::new(&self.config).export(&self.storage, &entity)
    }

    /// Translates the latest revision of an entity, and the entities it
    /// references, using the payloads in `translations`.
    ///
    /// The target language comes from the root entity's payload.
    pub fn translate(
        &mut self,
        entity_type: &str,
        uuid: &EntityUuid,
        translations: &TranslationsById,
    ) -> ArgoResult<TranslationReport> {
        let default = self.load_by_uuid(entity_type, uuid)?;
        let root = self
            .storage
            .load_latest_revision(entity_type, default.id)?
            .ok_or_else(|| ArgoError::not_found(entity_type, uuid))?;
        let payload = translations
            .get(uuid)
            .ok_or(ArgoError::MissingPayload(*uuid))?;

        let ctx = TranslationContext {
            clock: &*self.clock,
            user: &self.config.service_account,
            config: &self.config,
            moderation: &*self.moderation,
        };
        ReferenceGraphWalker::new(&mut self.storage, ctx, payload.target_langcode.clone(), translations).translate(root)
    }

    /// Values of one field in each of the given languages.
    ///
    /// Languages the entity has no translation for are left out, as are
    /// unpublished translations of bundles listed in `published_only_bundles`.
    pub fn get_field(
        &self,
        entity_type: &str,
        id: u64,
        field: &str,
        target_languages: &[Langcode],
        published_only_bundles: &[String],
    ) -> ArgoResult<Vec<FieldValue>> {
        let entity = self
            .storage
            .load(entity_type, id)?
            .ok_or_else(|| ArgoError::not_found(entity_type, id))?;
        let schema = self
            .storage
            .schema(&entity.entity_type, &entity.bundle)
            .ok_or_else(|| ArgoError::SchemaNotFound {
                entity_type: entity.entity_type.clone(),
                bundle: entity.bundle.clone(),
            })?;
        if schema.field(field).is_none() {
            return Err(FieldNotFound {
                kind: FieldNotFoundKind::UnknownField,
                label: field.to_string(),
                path: field.to_string(),
                value: Value::Null,
                detail: format!("{entity_type}.{} has no such field", entity.bundle),
            }
            .into());
        }
        let published_only = published_only_bundles.contains(&entity.bundle);

        let mut values = Vec::new();
        for language in target_languages {
            let Some(translation) = entity.translation(language) else {
                continue;
            };
            if published_only && !translation.status {
                debug!(id, language = %language, "Skipping unpublished translation");
                continue;
            }
            let items: Vec<Value> = translation
                .fields
                .get(field)
                .into_iter()
                .flatten()
                .map(|item| Value::Object(item.values.clone()))
                .collect();
            values.push(FieldValue {
                value: Value::Array(items),
                language: language.clone(),
            });
        }
        Ok(values)
    }

    /// UUID of the entity with the given numeric id.
    pub fn entity_uuid(&self, entity_type: &str, id: u64) -> ArgoResult<EntityUuid> {
        self.storage
            .load(entity_type, id)?
            .map(|e| e.uuid)
            .ok_or_else(|| ArgoError::not_found(entity_type, id))
    }

    fn load_by_uuid(&self, entity_type: &str, uuid: &EntityUuid) -> ArgoResult<Entity> {
        self.storage
            .load_by_uuid(entity_type, uuid)?
            .ok_or_else(|| ArgoError::not_found(entity_type, uuid))
    }
}
