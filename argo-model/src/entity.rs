use std::collections::BTreeMap;

use argo_types::{EntityUuid, Langcode, RevisionId, Timestamp, UserId};
use serde::{Deserialize, Serialize};

use crate::{EntityRef, EntitySchema, FieldItem};

/// A content entity with all of its language variants.
///
/// Field values are kept per language in [`Translation`]s; the source
/// language variant is keyed by `langcode`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    pub entity_type: String,
    pub bundle: String,
    pub id: u64,
    pub uuid: EntityUuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision_id: Option<RevisionId>,
    /// Source (authored) language.
    pub langcode: Langcode,
    pub translations: BTreeMap<Langcode, Translation>,
    /// UUID of the entity this one was cloned from, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duplicate_source: Option<EntityUuid>,
    #[serde(default)]
    pub revision: RevisionMeta,

    /// Save as a new revision.
    #[serde(skip)]
    pub new_revision: bool,
    /// Must be written even if its parent's save would not cascade to it.
    #[serde(skip)]
    pub needs_save: bool,
    /// Revision this copy was loaded from; used to detect stale writes.
    #[serde(skip)]
    pub loaded_revision_id: Option<RevisionId>,
}

impl Entity {
    /// Creates an entity with an empty source-language variant.
    pub fn new(entity_type: &str, bundle: &str, id: u64, langcode: Langcode) -> Self {
        let mut translations = BTreeMap::new();
        translations.insert(langcode.clone(), Translation::default());
        Self {
            entity_type: entity_type.into(),
            bundle: bundle.into(),
            id,
            uuid: EntityUuid::new(),
            revision_id: None,
            langcode,
            translations,
            duplicate_source: None,
            revision: RevisionMeta::default(),
            new_revision: false,
            needs_save: false,
            loaded_revision_id: None,
        }
    }

    pub fn is_language_neutral(&self) -> bool {
        self.langcode.is_neutral()
    }

    /// UUID used to look up this entity's translation payload: the
    /// duplicate source when one is recorded, otherwise its own.
    pub fn translation_key(&self) -> EntityUuid {
        self.duplicate_source.unwrap_or(self.uuid)
    }

    /// The source-language variant.
    pub fn source(&self) -> Option<&Translation> {
        self.translations.get(&self.langcode)
    }

    pub fn source_mut(&mut self) -> Option<&mut Translation> {
        self.translations.get_mut(&self.langcode)
    }

    pub fn has_translation(&self, langcode: &Langcode) -> bool {
        self.translations.contains_key(langcode)
    }

    pub fn translation(&self, langcode: &Langcode) -> Option<&Translation> {
        self.translations.get(langcode)
    }

    pub fn translation_mut(&mut self, langcode: &Langcode) -> Option<&mut Translation> {
        self.translations.get_mut(langcode)
    }

    /// Adds (or replaces) a language variant.
    pub fn add_translation(&mut self, langcode: Langcode, translation: Translation) -> &mut Translation {
        self.translations.insert(langcode.clone(), translation);
        self.translations.entry(langcode).or_default()
    }

    /// Removes a language variant. The source language cannot be removed.
    pub fn remove_translation(&mut self, langcode: &Langcode) -> Option<Translation> {
        if *langcode == self.langcode {
            return None;
        }
        self.translations.remove(langcode)
    }

    /// Items of a field in the source language (empty if unset).
    pub fn field(&self, name: &str) -> &[FieldItem] {
        self.source()
            .and_then(|t| t.fields.get(name))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Sets a field in the source language.
    pub fn set_field(&mut self, name: &str, items: Vec<FieldItem>) {
        let langcode = self.langcode.clone();
        self.translations
            .entry(langcode)
            .or_default()
            .fields
            .insert(name.to_string(), items);
    }

    /// References held by the given language variant, in field declaration
    /// order then item order. Returns `(field name, delta, reference)`.
    pub fn references_in<'a>(
        &'a self,
        schema: &'a EntitySchema,
        langcode: &Langcode,
    ) -> Vec<(&'a str, usize, &'a EntityRef)> {
        let Some(translation) = self.translations.get(langcode) else {
            return Vec::new();
        };
        schema
            .reference_fields()
            .flat_map(move |def| {
                translation
                    .fields
                    .get(&def.name)
                    .into_iter()
                    .flatten()
                    .enumerate()
                    .filter_map(move |(delta, item)| item.target.as_ref().map(|r| (def.name.as_str(), delta, r)))
            })
            .collect()
    }

    /// References held by the source-language variant.
    pub fn referenced_entities<'a>(&'a self, schema: &'a EntitySchema) -> Vec<&'a EntityRef> {
        self.references_in(schema, &self.langcode)
            .into_iter()
            .map(|(_, _, r)| r)
            .collect()
    }
}

/// The field values and publication state of one language variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Translation {
    #[serde(default)]
    pub fields: BTreeMap<String, Vec<FieldItem>>,
    /// Published.
    #[serde(default = "default_status")]
    pub status: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub moderation_state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changed: Option<Timestamp>,
    /// Whether this revision changed this language variant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision_translation_affected: Option<bool>,
    /// Keep `revision_translation_affected` as set instead of recomputing
    /// it on save.
    #[serde(skip)]
    pub revision_translation_affected_enforced: bool,
}

fn default_status() -> bool {
    true
}

impl Default for Translation {
    fn default() -> Self {
        Self {
            fields: BTreeMap::new(),
            status: true,
            moderation_state: None,
            created: None,
            changed: None,
            revision_translation_affected: None,
            revision_translation_affected_enforced: false,
        }
    }
}

impl Translation {
    /// A fresh variant holding a copy of another variant's field values.
    /// Publication and revision metadata are not copied.
    pub fn cloned_from(source: &Translation) -> Self {
        Self {
            fields: source.fields.clone(),
            ..Self::default()
        }
    }
}

/// Revision log metadata of an entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevisionMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_message: Option<String>,
}
