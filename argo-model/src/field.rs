use argo_types::{EntityUuid, RevisionId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One value slot of a field.
///
/// `values` holds the item's properties by name. Reference fields also carry
/// a typed [`EntityRef`] to the entity they point at.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldItem {
    #[serde(default)]
    pub values: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<EntityRef>,
}

impl FieldItem {
    /// An item whose `value` property is the given string.
    pub fn text(value: &str) -> Self {
        Self::from_values([("value", Value::String(value.into()))])
    }

    pub fn from_values<'a>(values: impl IntoIterator<Item = (&'a str, Value)>) -> Self {
        Self {
            values: values.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
            target: None,
        }
    }

    /// An item referencing another entity.
    pub fn reference(target: EntityRef) -> Self {
        Self {
            values: Map::new(),
            target: Some(target),
        }
    }

    pub fn get(&self, property: &str) -> Option<&Value> {
        self.values.get(property)
    }

    pub fn get_str(&self, property: &str) -> Option<&str> {
        self.values.get(property).and_then(Value::as_str)
    }

    pub fn set(&mut self, property: &str, value: Value) {
        self.values.insert(property.to_string(), value);
    }
}

/// A reference from one entity to another. The referencing entity does not
/// own the target.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityRef {
    pub entity_type: String,
    pub uuid: EntityUuid,
    /// Pinned revision, for revision-aware references.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision_id: Option<RevisionId>,
}

impl EntityRef {
    pub fn new(entity_type: &str, uuid: EntityUuid) -> Self {
        Self {
            entity_type: entity_type.into(),
            uuid,
            revision_id: None,
        }
    }

    #[must_use]
    pub fn at_revision(mut self, revision_id: RevisionId) -> Self {
        self.revision_id = Some(revision_id);
        self
    }
}
