//! Property importer: writes translated values back into a language variant
//! of an entity, addressed by export paths.

use std::collections::BTreeMap;

use argo_model::{Entity, EntitySchema, FieldDefinition, PropertyDefinition, PropertyKind, Translation};
use argo_types::Langcode;
use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::bundle::PayloadItem;
use crate::error::{FieldNotFound, FieldNotFoundKind};
use crate::path::{self, PropertyPath};
use crate::{ArgoResult, metatag, uri};

/// Payload property type whose items are tags of a serialized metatag value.
const METATAG_TYPE: &str = "metatag";

/// Applies payload items to entities of one bundle.
#[derive(Debug, Clone, Copy)]
pub struct PropertyImporter<'a> {
    schema: &'a EntitySchema,
}

impl<'a> PropertyImporter<'a> {
    pub fn new(schema: &'a EntitySchema) -> Self {
        Self { schema }
    }

    /// Writes `items` into the `langcode` variant of `entity`.
    ///
    /// The variant is created from the source language if it does not exist.
    /// Metatag items are collected per metatag value and written once, merged
    /// into the tags already stored there. Fails on the first path that does
    /// not resolve; earlier items stay applied to the in-memory entity.
    pub fn translate(&self, entity: &mut Entity, langcode: &Langcode, items: &[PayloadItem]) -> ArgoResult<()> {
        if !entity.has_translation(langcode) {
            let cloned = entity.source().map(Translation::cloned_from).unwrap_or_default();
            entity.add_translation(langcode.clone(), cloned);
        }
        let Some(translation) = entity.translation_mut(langcode) else {
            return Ok(());
        };

        let mut metatags: BTreeMap<String, Map<String, Value>> = BTreeMap::new();
        for item in items {
            if item.property_type == METATAG_TYPE {
                let Some((base, tag)) = path::split_last_key(&item.path) else {
                    return Err(unknown_field(&item.path, &item.path, &item.value, "metatag path has no tag key").into());
                };
                metatags
                    .entry(base.to_string())
                    .or_default()
                    .insert(tag, item.value.clone());
                continue;
            }
            self.apply(translation, item)?;
        }

        for (base, tags) in metatags {
            let group_value = Value::Object(tags.clone());
            let parsed = self.parse(&base, &group_value)?;
            let (slot, _, _) = self.resolve(translation, &parsed, &base, &group_value)?;
            let mut merged = match slot.as_str().map(metatag::decode) {
                Some(Ok(existing)) => existing,
                Some(Err(e)) => {
                    debug!(path = %base, error = %e, "Existing metatag value is malformed, replacing it");
                    Map::new()
                }
                None => Map::new(),
            };
            merged.extend(tags);
            *slot = Value::String(metatag::encode(&merged));
            trace!(path = %base, "Wrote metatag value");
        }
        Ok(())
    }

    fn apply(&self, translation: &mut Translation, item: &PayloadItem) -> ArgoResult<()> {
        let parsed = self.parse(&item.path, &item.value)?;
        let (slot, field, def) = self.resolve(translation, &parsed, &item.path, &item.value)?;

        match &parsed.map_key {
            Some(key_path) => {
                let patch = path::build([(key_path.as_str(), item.value.clone())]);
                if slot.is_null() {
                    *slot = patch;
                } else {
                    path::merge(slot, patch).map_err(|e| FieldNotFound {
                        kind: FieldNotFoundKind::MissingItem,
                        label: field.label.clone(),
                        path: item.path.clone(),
                        value: item.value.clone(),
                        detail: e.to_string(),
                    })?;
                }
            }
            None => {
                *slot = match (&item.value, def.data_type.kind()) {
                    (Value::String(display), PropertyKind::Uri) => Value::String(uri::from_display(display)),
                    (value, _) => value.clone(),
                };
            }
        }
        trace!(path = %item.path, "Applied translated value");
        Ok(())
    }

    fn parse(&self, raw: &str, value: &Value) -> ArgoResult<PropertyPath> {
        PropertyPath::parse(raw).map_err(|e| unknown_field(raw, raw, value, &e.to_string()).into())
    }

    /// Finds the property slot a path addresses, with its field and
    /// property definitions. Intermediate dictionaries for declared
    /// sub-properties are created on the way.
    fn resolve<'t>(
        &self,
        translation: &'t mut Translation,
        parsed: &PropertyPath,
        raw: &str,
        value: &Value,
    ) -> ArgoResult<(&'t mut Value, &'a FieldDefinition, &'a PropertyDefinition)> {
        let field = self.field(parsed, raw, value)?;
        let def = property_definition(field, &parsed.properties)
            .ok_or_else(|| unknown_field(&field.label, raw, value, "no such property"))?;

        let items = translation.fields.entry(field.name.clone()).or_default();
        let len = items.len();
        let item = items.get_mut(parsed.delta).ok_or_else(|| FieldNotFound {
            kind: FieldNotFoundKind::MissingItem,
            label: field.label.clone(),
            path: raw.to_string(),
            value: value.clone(),
            detail: format!("item {} does not exist, field has {len}", parsed.delta),
        })?;

        let Some((first, rest)) = parsed.properties.split_first() else {
            return Err(unknown_field(&field.label, raw, value, "no property").into());
        };
        let mut slot = item.values.entry(first.clone()).or_insert(Value::Null);
        for sub in rest {
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
            }
            slot = match slot {
                Value::Object(map) => map.entry(sub.clone()).or_insert(Value::Null),
                other => other,
            };
        }
        Ok((slot, field, def))
    }

    fn field(&self, parsed: &PropertyPath, raw: &str, value: &Value) -> ArgoResult<&'a FieldDefinition> {
        let field = self
            .schema
            .field(&parsed.field)
            .ok_or_else(|| unknown_field(&parsed.field, raw, value, "no such field"))?;
        if !field.translatable {
            return Err(unknown_field(&field.label, raw, value, "field is not translatable").into());
        }
        Ok(field)
    }
}

/// Walks a property name chain through declared sub-properties.
fn property_definition<'d>(field: &'d FieldDefinition, chain: &[String]) -> Option<&'d PropertyDefinition> {
    let (first, rest) = chain.split_first()?;
    rest.iter()
        .try_fold(field.property(first)?, |def, name| def.property(name))
}

fn unknown_field(label: &str, path: &str, value: &Value, detail: &str) -> FieldNotFound {
    FieldNotFound {
        kind: FieldNotFoundKind::UnknownField,
        label: label.to_string(),
        path: path.to_string(),
        value: value.clone(),
        detail: detail.to_string(),
    }
}
