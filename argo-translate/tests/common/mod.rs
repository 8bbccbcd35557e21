//! Shared fixtures for argo-translate tests.

#![allow(dead_code)]

use argo_model::{
    DataType, Entity, EntityRef, EntitySchema, FieldDefinition, FieldItem, PropertyDefinition, Workflow,
};
use argo_storage::{EntityStorage, MemoryStorage};
use argo_translate::{ArgoConfig, ArgoService, ExportBundle, PayloadItem, TranslationPayload};
use argo_types::{EntityUuid, FixedClock, Langcode};
use serde_json::{Value, json};

pub const NOW: i64 = 1_700_000_000;

pub fn en() -> Langcode {
    Langcode::parse("en").unwrap()
}

pub fn de() -> Langcode {
    Langcode::parse("de").unwrap()
}

/// node.article: every property kind the exporter handles.
pub fn article_schema() -> EntitySchema {
    EntitySchema::new(
        "node",
        "article",
        vec![
            FieldDefinition::string("title", "Title"),
            FieldDefinition::language("langcode", "Language"),
            FieldDefinition::text("body", "Body"),
            FieldDefinition::link("field_link", "Link"),
            FieldDefinition::metatag("field_meta", "Meta tags"),
            FieldDefinition::integer("field_count", "Count"),
            FieldDefinition::string("field_internal", "Internal note").excluded(),
            FieldDefinition::string("field_code", "Code").translatable(false),
            FieldDefinition::entity_reference_revisions("field_blocks", "Blocks", "paragraph"),
            FieldDefinition::entity_reference("field_related", "Related", "node"),
            FieldDefinition::entity_reference("field_tags", "Tags", "taxonomy_term"),
        ],
    )
    .revisionable(true)
}

/// node.page: moderated by the editorial workflow.
pub fn page_schema() -> EntitySchema {
    EntitySchema::new(
        "node",
        "page",
        vec![
            FieldDefinition::string("title", "Title"),
            FieldDefinition::entity_reference("field_related", "Related", "node"),
        ],
    )
    .revisionable(true)
    .with_workflow(Workflow::editorial())
}

/// paragraph.text: a composite block that can nest further blocks.
pub fn paragraph_schema() -> EntitySchema {
    EntitySchema::new(
        "paragraph",
        "text",
        vec![
            FieldDefinition::string("field_text", "Text"),
            FieldDefinition::custom(
                "field_style",
                "Style",
                "style",
                vec![
                    PropertyDefinition::map_with(
                        "value",
                        "Style",
                        vec![
                            PropertyDefinition::new("caption", "Caption", DataType::String),
                            PropertyDefinition::new("width", "Width", DataType::Integer),
                        ],
                    ),
                ],
            ),
            FieldDefinition::entity_reference_revisions("field_children", "Children", "paragraph"),
        ],
    )
    .revisionable(false)
}

pub fn term_schema() -> EntitySchema {
    EntitySchema::new("taxonomy_term", "tags", vec![FieldDefinition::string("name", "Name")])
}

pub fn make_storage() -> MemoryStorage {
    let mut storage = MemoryStorage::new();
    storage.register_schema(article_schema());
    storage.register_schema(page_schema());
    storage.register_schema(paragraph_schema());
    storage.register_schema(term_schema());
    storage
}

pub fn make_article(id: u64, title: &str) -> Entity {
    let mut entity = Entity::new("node", "article", id, en());
    entity.set_field("title", vec![FieldItem::text(title)]);
    entity
}

pub fn make_page(id: u64, title: &str) -> Entity {
    let mut entity = Entity::new("node", "page", id, en());
    entity.set_field("title", vec![FieldItem::text(title)]);
    entity
}

pub fn make_paragraph(id: u64, text: &str) -> Entity {
    let mut entity = Entity::new("paragraph", "text", id, en());
    entity.set_field("field_text", vec![FieldItem::text(text)]);
    entity
}

/// Inserts an entity and returns a reference to it, pinned to its revision
/// when it has one.
pub fn insert(storage: &mut MemoryStorage, entity: Entity) -> EntityRef {
    let entity_type = entity.entity_type.clone();
    let uuid = entity.uuid;
    let reference = EntityRef::new(&entity_type, uuid);
    match storage.insert(entity).unwrap() {
        Some(rev) => reference.at_revision(rev),
        None => reference,
    }
}

pub fn refs(targets: &[&EntityRef]) -> Vec<FieldItem> {
    targets.iter().map(|r| FieldItem::reference((*r).clone())).collect()
}

pub fn link_item(uri: &str, title: &str, options: Value) -> FieldItem {
    FieldItem::from_values([("uri", json!(uri)), ("title", json!(title)), ("options", options)])
}

pub fn make_service(storage: MemoryStorage) -> ArgoService<MemoryStorage> {
    ArgoService::new(storage, ArgoConfig::default()).with_clock(FixedClock::from_unix(NOW))
}

/// A German payload translating every exported string item with `f`.
pub fn payload_from(bundle: &ExportBundle, uuid: EntityUuid, f: impl Fn(&str) -> String) -> TranslationPayload {
    let items = bundle
        .items
        .iter()
        .filter_map(|item| item.value.as_str().map(|s| item.translated(f(s))))
        .collect();
    TranslationPayload::new(de(), uuid, items)
}

pub fn item(path: &str, value: &str, property_type: &str) -> PayloadItem {
    PayloadItem::new(path, value, property_type)
}

/// Source-language value of a property of the first item of a field.
pub fn source_value(storage: &MemoryStorage, entity_type: &str, uuid: &EntityUuid, field: &str, property: &str) -> Value {
    let entity = storage.load_by_uuid(entity_type, uuid).unwrap().unwrap();
    entity.field(field)[0].get(property).cloned().unwrap_or(Value::Null)
}

/// German value of a property of an item of a field.
pub fn german_value(
    storage: &MemoryStorage,
    entity_type: &str,
    uuid: &EntityUuid,
    field: &str,
    delta: usize,
    property: &str,
) -> Value {
    let entity = storage.load_by_uuid(entity_type, uuid).unwrap().unwrap();
    let translation = entity.translation(&de()).expect("german translation");
    translation.fields[field][delta].get(property).cloned().unwrap_or(Value::Null)
}
