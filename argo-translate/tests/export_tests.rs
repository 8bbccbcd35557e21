mod common;

use argo_model::{DataType, Entity, EntitySchema, FieldDefinition, FieldItem, PropertyDefinition};
use argo_storage::{EntityStorage, MemoryStorage};
use argo_translate::{ArgoConfig, ArgoError, ExportBundle, PropertyExporter, ReferenceRecord, TranslatableProperty};
use argo_types::{EntityUuid, RevisionId};
use common::*;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

fn export_entity(storage: MemoryStorage, entity: Entity) -> ExportBundle {
    let mut storage = storage;
    let uuid = entity.uuid;
    let entity_type = entity.entity_type.clone();
    storage.insert(entity).unwrap();
    make_service(storage).export(&entity_type, &uuid, None).unwrap()
}

fn paths(bundle: &ExportBundle) -> Vec<&str> {
    bundle.paths().collect()
}

// ── Field selection ─────────────────────────────────────────────

#[test]
fn exports_translatable_text_in_field_order() {
    let mut article = make_article(1, "Hello");
    article.set_field("langcode", vec![FieldItem::text("en")]);
    article.set_field(
        "body",
        vec![FieldItem::from_values([
            ("value", json!("Body text")),
            ("format", json!("basic_html")),
            ("processed", json!("<p>Body text</p>")),
        ])],
    );
    article.set_field("field_count", vec![FieldItem::from_values([("value", json!(3))])]);
    article.set_field("field_internal", vec![FieldItem::text("Do not translate")]);
    article.set_field("field_code", vec![FieldItem::text("ABC")]);

    let bundle = export_entity(make_storage(), article);

    assert_eq!(
        bundle.items,
        vec![
            TranslatableProperty {
                field_label: "Title".into(),
                property_label: "Text value".into(),
                property_type: "string".into(),
                path: "title.0.value".into(),
                value: json!("Hello"),
            },
            TranslatableProperty {
                field_label: "Body".into(),
                property_label: "Text".into(),
                property_type: "string".into(),
                path: "body.0.value".into(),
                value: json!("Body text"),
            },
        ]
    );
    assert!(bundle.warnings.is_empty());
}

#[test]
fn exports_every_item_of_a_repeated_field() {
    let mut article = make_article(1, "Hello");
    article.set_field(
        "body",
        vec![FieldItem::text("First"), FieldItem::text("Second"), FieldItem::text("Third")],
    );

    let bundle = export_entity(make_storage(), article);

    assert_eq!(
        paths(&bundle),
        vec!["title.0.value", "body.0.value", "body.1.value", "body.2.value"]
    );
}

// ── Empty values ────────────────────────────────────────────────

#[test]
fn whitespace_only_values_are_not_exported() {
    let mut article = make_article(1, " ");
    article.set_field("body", vec![FieldItem::text("   "), FieldItem::text("test value")]);

    let bundle = export_entity(make_storage(), article);

    assert_eq!(paths(&bundle), vec!["body.1.value"]);
    assert_eq!(bundle.items[0].value, json!("test value"));
}

#[test]
fn blank_properties_are_kept_when_the_item_has_text() {
    let mut article = make_article(1, "Hello");
    article.set_field("field_link", vec![link_item(" ", "Read more", json!({}))]);

    let bundle = export_entity(make_storage(), article);

    assert_eq!(
        paths(&bundle),
        vec!["title.0.value", "field_link.0.uri", "field_link.0.title"]
    );
}

// ── Property kinds ──────────────────────────────────────────────

#[test]
fn link_options_are_exported_with_map_keys() {
    let mut article = make_article(1, "Hello");
    article.set_field(
        "field_link",
        vec![link_item("testUri", "testTitle", json!({"nestedKey": "nestedValue"}))],
    );

    let bundle = export_entity(make_storage(), article);

    assert_eq!(
        paths(&bundle),
        vec![
            "title.0.value",
            "field_link.0.uri",
            "field_link.0.title",
            "field_link.0.options!nestedKey",
        ]
    );
    let options = bundle.item("field_link.0.options!nestedKey").unwrap();
    assert_eq!(options.value, json!("nestedValue"));
    assert_eq!(options.property_type, "map");
    assert_eq!(bundle.warnings.len(), 1);
    assert_eq!(bundle.warnings[0].description, "map has no prop defs for values");
    assert_eq!(bundle.warnings[0].property_name, "options");
}

#[test]
fn uris_are_exported_in_display_form() {
    let mut article = make_article(1, "Hello");
    article.set_field(
        "field_link",
        vec![
            link_item("internal:/about", "About", json!({})),
            link_item("route:<nolink>", "Nothing", json!({})),
        ],
    );

    let bundle = export_entity(make_storage(), article);

    assert_eq!(bundle.item("field_link.0.uri").unwrap().value, json!("/about"));
    assert_eq!(bundle.item("field_link.1.uri").unwrap().value, json!("<nolink>"));
}

#[test]
fn standard_link_target_attributes_are_not_exported() {
    let mut article = make_article(1, "Hello");
    article.set_field(
        "field_link",
        vec![
            link_item("/a", "A", json!({"attributes": {"target": "_blank"}})),
            link_item("/b", "B", json!({"attributes": {"target": 0}})),
            link_item("/c", "C", json!({"attributes": {}})),
        ],
    );

    let bundle = export_entity(make_storage(), article);

    assert!(bundle.paths().all(|p| !p.contains("options")));
    assert!(bundle.warnings.is_empty());
}

#[test]
fn other_attributes_warn_and_are_flattened() {
    let mut article = make_article(1, "Hello");
    article.set_field(
        "field_link",
        vec![link_item("/a", "A", json!({"attributes": {"class": ["button"], "title": "Tip"}}))],
    );

    let bundle = export_entity(make_storage(), article);

    assert_eq!(bundle.warnings.len(), 1);
    assert_eq!(bundle.warnings[0].description, "strange attributes map");
    assert_eq!(
        bundle.item("field_link.0.options!attributes.class.0").unwrap().value,
        json!("button")
    );
    assert_eq!(bundle.item("field_link.0.options!attributes.title").unwrap().value, json!("Tip"));
}

#[test]
fn metatags_are_exported_one_tag_at_a_time() {
    let mut article = make_article(1, "Hello");
    article.set_field(
        "field_meta",
        vec![FieldItem::text(
            r#"a:3:{s:4:"key1";s:12:"Source value";s:4:"key2";s:12:"Source value";s:6:"robots";a:1:{i:0;s:7:"noindex";}}"#,
        )],
    );

    let bundle = export_entity(make_storage(), article);

    let metatags: Vec<&TranslatableProperty> =
        bundle.items.iter().filter(|i| i.property_type == "metatag").collect();
    assert_eq!(metatags.len(), 2);
    assert_eq!(metatags[0].path, "field_meta.0.value.key1");
    assert_eq!(metatags[1].path, "field_meta.0.value.key2");
    assert!(metatags.iter().all(|i| i.value == json!("Source value")));
    assert!(bundle.warnings.is_empty());
}

#[test]
fn malformed_metatag_warns_and_exports_nothing() {
    let mut article = make_article(1, "Hello");
    article.set_field("field_meta", vec![FieldItem::text("a:1:{broken")]);

    let bundle = export_entity(make_storage(), article);

    assert_eq!(bundle.warnings.len(), 1);
    assert_eq!(bundle.warnings[0].description, "malformed metatag value");
    assert!(bundle.paths().all(|p| !p.starts_with("field_meta")));
}

#[test]
fn declared_map_properties_are_exported_by_name() {
    let mut paragraph = make_paragraph(10, "Block");
    paragraph.set_field(
        "field_style",
        vec![FieldItem::from_values([("value", json!({"caption": "Caption", "width": 300}))])],
    );

    let bundle = export_entity(make_storage(), paragraph);

    assert_eq!(paths(&bundle), vec!["field_text.0.value", "field_style.0.value.caption"]);
    assert_eq!(bundle.items[1].property_label, "Caption");
    assert!(bundle.warnings.is_empty());
}

#[test]
fn unknown_data_type_is_a_warning_not_an_error() {
    let mut storage = make_storage();
    storage.register_schema(EntitySchema::new(
        "node",
        "widget",
        vec![FieldDefinition::custom(
            "field_color",
            "Color",
            "color_field",
            vec![PropertyDefinition::new("color", "Color", DataType::from("color"))],
        )],
    ));
    let mut widget = Entity::new("node", "widget", 5, en());
    widget.set_field("field_color", vec![FieldItem::from_values([("color", json!("#ff0000"))])]);
    let uuid = widget.uuid;

    let bundle = export_entity(storage, widget);

    assert_eq!(bundle.item("field_color.0.color").unwrap().value, json!("#ff0000"));
    assert_eq!(bundle.warnings.len(), 1);
    let warning = &bundle.warnings[0];
    assert_eq!(warning.uuid, uuid);
    assert_eq!(warning.entity_type, "node");
    assert_eq!(warning.bundle, "widget");
    assert_eq!(warning.data_type, "color");
    assert_eq!(warning.property_value, json!("#ff0000"));
    assert_eq!(warning.description, "unknown data type");
}

// ── References and revisions ────────────────────────────────────

#[test]
fn lists_composite_and_configured_references() {
    let mut storage = make_storage();
    let block = insert(&mut storage, make_paragraph(10, "Block"));
    let page = insert(&mut storage, make_page(2, "Page"));
    let mut term = Entity::new("taxonomy_term", "tags", 3, en());
    term.set_field("name", vec![FieldItem::text("Tag")]);
    let term = insert(&mut storage, term);

    let mut article = make_article(1, "Hello");
    article.set_field("field_blocks", refs(&[&block]));
    article.set_field("field_related", refs(&[&page]));
    article.set_field("field_tags", refs(&[&term]));
    let uuid = article.uuid;
    storage.insert(article).unwrap();
    let entity = storage.load_by_uuid("node", &uuid).unwrap().unwrap();

    let default_config = ArgoConfig::default();
    let bundle = PropertyExporter::new(&default_config).export(&storage, &entity).unwrap();
    assert_eq!(
        bundle.references,
        vec![ReferenceRecord {
            entity_type: "paragraph".into(),
            uuid: block.uuid,
            revision_id: block.revision_id,
        }]
    );

    let config = ArgoConfig {
        traversable_entity_types: vec!["taxonomy_term".into()],
        traversable_content_types: vec!["page".into()],
        ..ArgoConfig::default()
    };
    let bundle = PropertyExporter::new(&config).export(&storage, &entity).unwrap();
    let referenced: Vec<EntityUuid> = bundle.references.iter().map(|r| r.uuid).collect();
    assert_eq!(referenced, vec![block.uuid, page.uuid, term.uuid]);
    assert_eq!(bundle.references[2].revision_id, None);
}

#[test]
fn unresolvable_references_are_skipped() {
    let missing = argo_model::EntityRef::new("paragraph", EntityUuid::new()).at_revision(RevisionId::new(999));
    let mut article = make_article(1, "Hello");
    article.set_field("field_blocks", refs(&[&missing]));

    let bundle = export_entity(make_storage(), article);

    assert!(bundle.references.is_empty());
    assert_eq!(paths(&bundle), vec!["title.0.value"]);
}

#[test]
fn revision_id_is_attached_for_revisionable_entities() {
    let mut storage = make_storage();
    let rev = storage.insert(make_article(1, "Hello")).unwrap();
    let uuid = storage.load("node", 1).unwrap().unwrap().uuid;
    let mut term = Entity::new("taxonomy_term", "tags", 3, en());
    term.set_field("name", vec![FieldItem::text("Tag")]);
    let term_uuid = term.uuid;
    storage.insert(term).unwrap();

    let service = make_service(storage);

    assert!(rev.is_some());
    assert_eq!(service.export("node", &uuid, None).unwrap().revision_id, rev);
    assert_eq!(service.export("taxonomy_term", &term_uuid, None).unwrap().revision_id, None);
}

#[test]
fn export_of_an_older_revision() {
    let mut storage = make_storage();
    let article = make_article(1, "Version one");
    let uuid = article.uuid;
    let first = storage.insert(article).unwrap().unwrap();
    let mut second = storage.load("node", 1).unwrap().unwrap();
    second.revision_id = None;
    second.set_field("title", vec![FieldItem::text("Version two")]);
    storage.insert(second).unwrap();

    let service = make_service(storage);

    let old = service.export("node", &uuid, Some(first)).unwrap();
    assert_eq!(old.items[0].value, json!("Version one"));
    assert_eq!(old.revision_id, Some(first));
    let current = service.export("node", &uuid, None).unwrap();
    assert_eq!(current.items[0].value, json!("Version two"));
}

#[test]
fn export_is_stable_across_calls() {
    let mut storage = make_storage();
    let mut article = make_article(1, "Hello");
    article.set_field("body", vec![FieldItem::text("One"), FieldItem::text("Two")]);
    article.set_field("field_link", vec![link_item("/x", "X", json!({"b": "2", "a": {"c": "1"}}))]);
    let uuid = article.uuid;
    storage.insert(article).unwrap();
    let service = make_service(storage);

    let first = service.export("node", &uuid, None).unwrap();
    let second = service.export("node", &uuid, None).unwrap();

    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_value(&first).unwrap()["items"][5]["path"],
        Value::from("field_link.0.options!a.c")
    );
}

#[test]
fn missing_root_is_not_found() {
    let service = make_service(make_storage());
    let err = service.export("node", &EntityUuid::new(), None).unwrap_err();
    assert!(matches!(err, ArgoError::NotFound { .. }));
}
