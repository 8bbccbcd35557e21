use argo_model::{Entity, EntitySchema, FieldDefinition, FieldItem};
use argo_storage::{EntityStorage, MemoryStorage, StorageError, StorageSnapshot};
use argo_types::{Langcode, RevisionId};
use pretty_assertions::assert_eq;

fn article_schema() -> EntitySchema {
    EntitySchema::new("node", "article", vec![FieldDefinition::string("title", "Title")]).revisionable(true)
}

fn tag_schema() -> EntitySchema {
    EntitySchema::new("taxonomy_term", "tags", vec![FieldDefinition::string("name", "Name")])
}

fn make_article(id: u64, title: &str) -> Entity {
    let mut entity = Entity::new("node", "article", id, Langcode::parse("en").unwrap());
    entity.set_field("title", vec![FieldItem::text(title)]);
    entity
}

fn make_store() -> MemoryStorage {
    let mut store = MemoryStorage::new();
    store.register_schema(article_schema());
    store.register_schema(tag_schema());
    store
}

// ── Loading ──────────────────────────────────────────────────────

#[test]
fn insert_assigns_revision_to_revisionable_entities() {
    let mut store = make_store();
    let rev = store.insert(make_article(1, "A")).unwrap();
    assert_eq!(rev, Some(RevisionId::new(1)));

    let mut term = Entity::new("taxonomy_term", "tags", 1, Langcode::parse("en").unwrap());
    term.set_field("name", vec![FieldItem::text("Rust")]);
    assert_eq!(store.insert(term).unwrap(), None);
}

#[test]
fn insert_without_schema_fails() {
    let mut store = MemoryStorage::new();
    let err = store.insert(make_article(1, "A")).unwrap_err();
    assert!(matches!(err, StorageError::SchemaNotFound { .. }));
}

#[test]
fn load_by_id_and_uuid() {
    let mut store = make_store();
    let article = make_article(7, "Seven");
    let uuid = article.uuid;
    store.insert(article).unwrap();

    let by_id = store.load("node", 7).unwrap().unwrap();
    let by_uuid = store.load_by_uuid("node", &uuid).unwrap().unwrap();
    assert_eq!(by_id.uuid, uuid);
    assert_eq!(by_uuid.id, 7);
    assert_eq!(by_uuid.loaded_revision_id, by_uuid.revision_id);
}

#[test]
fn load_missing_returns_none() {
    let store = make_store();
    assert!(store.load("node", 99).unwrap().is_none());
    assert!(store.load_by_uuid("node", &argo_types::EntityUuid::new()).unwrap().is_none());
    assert!(store.load_revision("node", RevisionId::new(99)).unwrap().is_none());
}

#[test]
fn load_revision_checks_entity_type() {
    let mut store = make_store();
    let rev = store.insert(make_article(1, "A")).unwrap().unwrap();
    assert!(store.load_revision("node", rev).unwrap().is_some());
    assert!(store.load_revision("taxonomy_term", rev).unwrap().is_none());
}

// ── Saving ───────────────────────────────────────────────────────

#[test]
fn save_new_revision_keeps_history() {
    let mut store = make_store();
    let first = store.insert(make_article(1, "A")).unwrap().unwrap();

    let mut entity = store.load("node", 1).unwrap().unwrap();
    entity.set_field("title", vec![FieldItem::text("B")]);
    entity.new_revision = true;
    entity.revision_id = Some(store.allocate_revision_id());
    let second = entity.revision_id.unwrap();
    store.save_all(vec![entity]).unwrap();

    assert_eq!(store.revision_count("node", 1), 2);
    let old = store.load_revision("node", first).unwrap().unwrap();
    assert_eq!(old.field("title")[0].get_str("value"), Some("A"));
    let latest = store.load_latest_revision("node", 1).unwrap().unwrap();
    assert_eq!(latest.revision_id, Some(second));
    assert_eq!(latest.field("title")[0].get_str("value"), Some("B"));
}

#[test]
fn save_without_new_revision_overwrites() {
    let mut store = make_store();
    store.insert(make_article(1, "A")).unwrap();
    let mut entity = store.load("node", 1).unwrap().unwrap();
    entity.set_field("title", vec![FieldItem::text("B")]);
    store.save_all(vec![entity]).unwrap();
    assert_eq!(store.revision_count("node", 1), 1);
    assert_eq!(store.load("node", 1).unwrap().unwrap().field("title")[0].get_str("value"), Some("B"));
}

#[test]
fn stale_write_is_rejected_and_nothing_is_written() {
    let mut store = make_store();
    store.insert(make_article(1, "A")).unwrap();
    store.insert(make_article(2, "B")).unwrap();

    let mut stale = store.load("node", 1).unwrap().unwrap();
    let fresh = store.load("node", 2).unwrap().unwrap();

    // Someone else writes a new revision of entity 1 in between.
    let mut other = store.load("node", 1).unwrap().unwrap();
    other.revision_id = None;
    other.set_field("title", vec![FieldItem::text("A2")]);
    store.insert(other).unwrap();
    let concurrent = store.load("node", 1).unwrap().unwrap();
    assert_eq!(concurrent.field("title")[0].get_str("value"), Some("A2"));

    let mut fresh_edit = fresh.clone();
    fresh_edit.set_field("title", vec![FieldItem::text("B-edited")]);
    stale.set_field("title", vec![FieldItem::text("A-edited")]);

    let err = store.save_all(vec![fresh_edit, stale]).unwrap_err();
    assert!(matches!(err, StorageError::StaleRevision { id: 1, .. }));
    assert_eq!(store.load("node", 2).unwrap().unwrap().field("title")[0].get_str("value"), Some("B"));
}

#[test]
fn new_revision_without_id_is_invalid() {
    let mut store = make_store();
    store.insert(make_article(1, "A")).unwrap();
    let mut entity = store.load("node", 1).unwrap().unwrap();
    entity.new_revision = true;
    entity.revision_id = None;
    assert!(matches!(store.save_all(vec![entity]), Err(StorageError::InvalidData(_))));
}

#[test]
fn allocated_revision_ids_are_unique() {
    let mut store = make_store();
    store.insert(make_article(1, "A")).unwrap();
    let a = store.allocate_revision_id();
    let b = store.allocate_revision_id();
    assert_ne!(a, b);
    assert!(a > RevisionId::new(1));
}

// ── Snapshots ────────────────────────────────────────────────────

#[test]
fn snapshot_roundtrip_preserves_revisions() {
    let mut store = make_store();
    store.insert(make_article(1, "A")).unwrap();
    let mut second = store.load("node", 1).unwrap().unwrap();
    second.revision_id = None;
    second.set_field("title", vec![FieldItem::text("A2")]);
    store.insert(second).unwrap();

    let snapshot = store.to_snapshot();
    assert_eq!(snapshot.entities.len(), 2);

    let restored = MemoryStorage::from_snapshot(snapshot).unwrap();
    assert_eq!(restored.revision_count("node", 1), 2);
    assert_eq!(restored.load("node", 1).unwrap().unwrap().field("title")[0].get_str("value"), Some("A2"));
}

#[test]
fn snapshot_file_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");

    let mut store = make_store();
    store.insert(make_article(3, "Three")).unwrap();
    store.write_to(&path).unwrap();

    let reopened = MemoryStorage::open(&path).unwrap();
    assert!(reopened.schema("node", "article").is_some());
    assert_eq!(reopened.load("node", 3).unwrap().unwrap().field("title")[0].get_str("value"), Some("Three"));
}

#[test]
fn empty_snapshot_json_is_accepted() {
    let snapshot: StorageSnapshot = serde_json::from_str("{}").unwrap();
    let store = MemoryStorage::from_snapshot(snapshot).unwrap();
    assert!(store.schema("node", "article").is_none());
}
