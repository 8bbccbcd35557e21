//! Property exporter: flattens an entity's translatable properties into an
//! [`ExportBundle`].
//!
//! Export never fails on content shape. Anything the exporter does not fully
//! understand is reported as an [`ExportWarning`] and, where possible, still
//! exported raw. Only missing schemas and storage failures are errors.

use std::collections::BTreeSet;

use argo_model::{Entity, EntitySchema, FieldDefinition, FieldItem, PropertyDefinition, PropertyKind};
use argo_storage::EntityStorage;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::bundle::{ExportBundle, ExportWarning, ReferenceRecord, TranslatableProperty};
use crate::config::ArgoConfig;
use crate::path::{self, KEY_SEPARATOR, MAP_KEY_MARKER};
use crate::{ArgoError, ArgoResult, metatag, uri};

/// Field type of the language marker field, never exported.
const LANGUAGE_FIELD_TYPE: &str = "language";

/// Link targets an `attributes` map may hold without being worth a warning.
const BENIGN_LINK_TARGETS: [&str; 2] = ["_blank", "0"];

/// Exports entities against a site configuration.
#[derive(Debug, Clone, Copy)]
pub struct PropertyExporter<'a> {
    config: &'a ArgoConfig,
}

impl<'a> PropertyExporter<'a> {
    pub fn new(config: &'a ArgoConfig) -> Self {
        Self { config }
    }

    /// Exports one entity: its translatable properties, the traversable
    /// entities it references, and its revision id.
    pub fn export<S: EntityStorage + ?Sized>(&self, storage: &S, entity: &Entity) -> ArgoResult<ExportBundle> {
        let schema = storage
            .schema(&entity.entity_type, &entity.bundle)
            .ok_or_else(|| ArgoError::SchemaNotFound {
                entity_type: entity.entity_type.clone(),
                bundle: entity.bundle.clone(),
            })?;

        let (items, warnings) = export_properties(entity, schema);
        let references = self.references(storage, entity, schema)?;

        debug!(
            entity_type = %entity.entity_type,
            uuid = %entity.uuid,
            items = items.len(),
            references = references.len(),
            warnings = warnings.len(),
            "Exported entity"
        );

        Ok(ExportBundle {
            items,
            references,
            warnings,
            revision_id: entity.revision_id.filter(|_| schema.revisionable),
        })
    }

    /// Directly referenced entities whose type (or node bundle) is
    /// traversable. References that do not resolve are skipped.
    fn references<S: EntityStorage + ?Sized>(
        &self,
        storage: &S,
        entity: &Entity,
        schema: &EntitySchema,
    ) -> ArgoResult<Vec<ReferenceRecord>> {
        let mut seen = BTreeSet::new();
        let mut records = Vec::new();
        for target in entity.referenced_entities(schema) {
            let loaded = match target.revision_id {
                Some(revision_id) => storage.load_revision(&target.entity_type, revision_id)?,
                None => storage.load_by_uuid(&target.entity_type, &target.uuid)?,
            };
            let Some(referenced) = loaded else {
                warn!(
                    entity_type = %target.entity_type,
                    uuid = %target.uuid,
                    "Referenced entity not found, skipping"
                );
                continue;
            };
            if !self.config.is_traversable(&referenced.entity_type, &referenced.bundle) {
                continue;
            }
            if !seen.insert(referenced.uuid) {
                continue;
            }
            let revisionable = storage
                .schema(&referenced.entity_type, &referenced.bundle)
                .is_some_and(|s| s.revisionable);
            records.push(ReferenceRecord {
                entity_type: referenced.entity_type.clone(),
                uuid: referenced.uuid,
                revision_id: referenced.revision_id.filter(|_| revisionable),
            });
        }
        Ok(records)
    }
}

/// Flattens the source-language translatable properties of an entity.
///
/// Returns the export items in field, item, property order, and the
/// warnings raised on the way.
pub fn export_properties(entity: &Entity, schema: &EntitySchema) -> (Vec<TranslatableProperty>, Vec<ExportWarning>) {
    let mut collector = Collector {
        entity,
        items: Vec::new(),
        warnings: Vec::new(),
    };
    for field in exportable_fields(schema) {
        for (delta, item) in entity.field(&field.name).iter().enumerate() {
            collector.item(field, delta, item);
        }
    }
    (collector.items, collector.warnings)
}

/// Translatable, stored fields minus the language marker and fields
/// excluded by configuration.
pub fn exportable_fields(schema: &EntitySchema) -> impl Iterator<Item = &FieldDefinition> {
    schema
        .translatable_fields(false)
        .filter(|f| f.field_type != LANGUAGE_FIELD_TYPE && !f.excluded)
}

struct Collector<'e> {
    entity: &'e Entity,
    items: Vec<TranslatableProperty>,
    warnings: Vec<ExportWarning>,
}

/// Records produced for one field item, kept only if some property held text.
#[derive(Default)]
struct ItemOut {
    records: Vec<TranslatableProperty>,
    has_text: bool,
}

impl Collector<'_> {
    fn item(&mut self, field: &FieldDefinition, delta: usize, item: &FieldItem) {
        let mut out = ItemOut::default();
        for def in &field.properties {
            let path = format!("{}{KEY_SEPARATOR}{delta}{KEY_SEPARATOR}{}", field.name, def.name);
            self.property(field, def, &def.name, path, item.get(&def.name), &mut out);
        }
        if out.has_text {
            self.items.extend(out.records);
        }
    }

    fn property(
        &mut self,
        field: &FieldDefinition,
        def: &PropertyDefinition,
        name: &str,
        path: String,
        value: Option<&Value>,
        out: &mut ItemOut,
    ) {
        if def.computed {
            return;
        }
        let kind = def.data_type.kind();
        if kind == PropertyKind::Ignored {
            return;
        }
        let Some(value) = value.filter(|v| !v.is_null()) else {
            return;
        };

        match kind {
            PropertyKind::Ignored => {}
            PropertyKind::Text => {
                out.has_text |= has_text(value);
                out.records.push(record(field, def, path, value.clone()));
            }
            PropertyKind::Uri => {
                let display = match value {
                    Value::String(stored) => Value::String(uri::to_display(stored)),
                    other => other.clone(),
                };
                out.has_text |= has_text(&display);
                out.records.push(record(field, def, path, display));
            }
            PropertyKind::Metatag => {
                out.has_text |= has_text(value);
                self.metatag(field, def, name, path, value, out);
            }
            PropertyKind::Map => self.map(field, def, name, path, value, out),
            PropertyKind::Unknown => {
                self.warn(def, name, value, "unknown data type");
                out.has_text |= has_text(value);
                out.records.push(record(field, def, path, value.clone()));
            }
        }
    }

    /// One record per string-valued tag, at `path.tag`. A value that does
    /// not decode only warns.
    fn metatag(
        &mut self,
        field: &FieldDefinition,
        def: &PropertyDefinition,
        name: &str,
        path: String,
        value: &Value,
        out: &mut ItemOut,
    ) {
        let decoded = match value {
            Value::String(serialized) => metatag::decode(serialized).map_err(|e| e.to_string()),
            _ => Err("not a serialized string".to_string()),
        };
        match decoded {
            Ok(tags) => {
                for (tag, tag_value) in tags {
                    if tag_value.is_string() {
                        let tag_path = format!("{path}{KEY_SEPARATOR}{}", path::escape_key(&tag));
                        out.records.push(record(field, def, tag_path, tag_value));
                    }
                }
            }
            Err(reason) => {
                debug!(path = %path, error = %reason, "Cannot decode metatag value");
                self.warn(def, name, value, "malformed metatag value");
            }
        }
    }

    fn map(
        &mut self,
        field: &FieldDefinition,
        def: &PropertyDefinition,
        name: &str,
        path: String,
        value: &Value,
        out: &mut ItemOut,
    ) {
        let Value::Object(map) = value else {
            if has_text(value) {
                self.warn(def, name, value, "unknown map type");
                out.has_text = true;
                out.records.push(record(field, def, path, value.clone()));
            }
            return;
        };

        if !def.properties.is_empty() {
            for sub in &def.properties {
                let sub_name = format!("{name}{KEY_SEPARATOR}{}", sub.name);
                let sub_path = format!("{path}{KEY_SEPARATOR}{}", sub.name);
                self.property(field, sub, &sub_name, sub_path, map.get(&sub.name), out);
            }
            return;
        }

        if !has_text(value) || is_benign_attributes(map) {
            return;
        }
        let description = if map.contains_key("attributes") {
            "strange attributes map"
        } else {
            "map has no prop defs for values"
        };
        self.warn(def, name, value, description);

        for (key_path, leaf) in path::flatten(value) {
            out.has_text |= has_text(&leaf);
            out.records.push(record(field, def, format!("{path}{MAP_KEY_MARKER}{key_path}"), leaf));
        }
    }

    fn warn(&mut self, def: &PropertyDefinition, name: &str, value: &Value, description: &str) {
        debug!(
            uuid = %self.entity.uuid,
            property = name,
            data_type = %def.data_type,
            description,
            "Export warning"
        );
        self.warnings.push(ExportWarning {
            uuid: self.entity.uuid,
            entity_type: self.entity.entity_type.clone(),
            bundle: self.entity.bundle.clone(),
            property_name: name.to_string(),
            property_value: value.clone(),
            data_type: def.data_type.to_string(),
            description: description.to_string(),
        });
    }
}

fn record(field: &FieldDefinition, def: &PropertyDefinition, path: String, value: Value) -> TranslatableProperty {
    TranslatableProperty {
        field_label: field.label.clone(),
        property_label: def.label.clone(),
        property_type: def.data_type.to_string(),
        path,
        value,
    }
}

/// Whether a value counts as translatable output. Whitespace-only strings
/// and empty containers do not.
fn has_text(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        Value::Bool(_) | Value::Number(_) => true,
    }
}

/// A link options map whose only populated key is `attributes`, holding at
/// most a standard link target.
fn is_benign_attributes(map: &Map<String, Value>) -> bool {
    let mut populated = map.iter().filter(|(_, v)| has_text(v));
    let Some((key, attributes)) = populated.next() else {
        return true;
    };
    if key != "attributes" || populated.next().is_some() {
        return false;
    }
    let Value::Object(attributes) = attributes else {
        return false;
    };
    attributes.iter().all(|(name, target)| {
        name == "target"
            && match target {
                Value::String(s) => BENIGN_LINK_TARGETS.contains(&s.as_str()),
                Value::Number(n) => n.as_u64() == Some(0),
                _ => false,
            }
    })
}
