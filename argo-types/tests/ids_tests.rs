use argo_types::{ActingUser, EntityUuid, RevisionId, UserId};
use std::collections::HashSet;
use std::str::FromStr;

// ── EntityUuid ────────────────────────────────────────────────────

#[test]
fn entity_uuid_new_is_unique() {
    let a = EntityUuid::new();
    let b = EntityUuid::new();
    assert_ne!(a, b);
}

#[test]
fn entity_uuid_from_uuid_roundtrip() {
    let uuid = uuid::Uuid::new_v4();
    let id = EntityUuid::from_uuid(uuid);
    assert_eq!(id.as_uuid(), uuid);
}

#[test]
fn entity_uuid_display_and_parse() {
    let id = EntityUuid::new();
    let parsed = EntityUuid::parse(&id.to_string()).unwrap();
    assert_eq!(id, parsed);
}

#[test]
fn entity_uuid_parse_invalid() {
    assert!(EntityUuid::parse("not-a-uuid").is_err());
    assert!(EntityUuid::from_str("garbage").is_err());
}

#[test]
fn entity_uuid_serializes_as_plain_string() {
    let id = EntityUuid::parse("5b0e2c39-8f5e-4a55-9d43-6a2b1e0c9f11").unwrap();
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, "\"5b0e2c39-8f5e-4a55-9d43-6a2b1e0c9f11\"");
    let back: EntityUuid = serde_json::from_str(&json).unwrap();
    assert_eq!(back, id);
}

#[test]
fn entity_uuid_works_as_map_key() {
    let id = EntityUuid::new();
    let mut map = std::collections::BTreeMap::new();
    map.insert(id, 7);
    let json = serde_json::to_string(&map).unwrap();
    let back: std::collections::BTreeMap<EntityUuid, i32> = serde_json::from_str(&json).unwrap();
    assert_eq!(back.get(&id), Some(&7));
}

#[test]
fn entity_uuid_hash_and_eq() {
    let id = EntityUuid::new();
    let mut set = HashSet::new();
    set.insert(id);
    set.insert(id);
    assert_eq!(set.len(), 1);
}

// ── RevisionId ────────────────────────────────────────────────────

#[test]
fn revision_id_next_increments() {
    assert_eq!(RevisionId::new(4).next(), RevisionId::new(5));
}

#[test]
fn revision_id_ordering() {
    assert!(RevisionId::new(1) < RevisionId::new(2));
}

#[test]
fn revision_id_parse() {
    assert_eq!(RevisionId::from_str("42").unwrap().get(), 42);
    assert!(RevisionId::from_str("x42").is_err());
    assert!(RevisionId::from_str("-1").is_err());
}

#[test]
fn revision_id_serializes_as_number() {
    assert_eq!(serde_json::to_string(&RevisionId::new(9)).unwrap(), "9");
}

// ── ActingUser ────────────────────────────────────────────────────

#[test]
fn acting_user_default_is_service_account() {
    let user = ActingUser::default();
    assert_eq!(user.uid, UserId::new(1));
    assert_eq!(user.name, "argo");
}
