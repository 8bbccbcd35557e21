//! Wire types exchanged with the translation workflow.

use std::collections::BTreeMap;

use argo_types::{EntityUuid, Langcode, RevisionId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Everything exported for one entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportBundle {
    pub items: Vec<TranslatableProperty>,
    pub references: Vec<ReferenceRecord>,
    pub warnings: Vec<ExportWarning>,
    pub revision_id: Option<RevisionId>,
}

impl ExportBundle {
    /// Export paths in order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|item| item.path.as_str())
    }

    /// The exported item at `path`.
    pub fn item(&self, path: &str) -> Option<&TranslatableProperty> {
        self.items.iter().find(|item| item.path == path)
    }
}

/// One exported leaf value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslatableProperty {
    pub field_label: String,
    pub property_label: String,
    pub property_type: String,
    pub path: String,
    pub value: Value,
}

impl TranslatableProperty {
    /// A payload item carrying `value` for this property.
    pub fn translated(&self, value: impl Into<Value>) -> PayloadItem {
        PayloadItem {
            path: self.path.clone(),
            value: value.into(),
            property_type: self.property_type.clone(),
        }
    }
}

/// A referenced entity the caller may want to export as well.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceRecord {
    pub entity_type: String,
    pub uuid: EntityUuid,
    pub revision_id: Option<RevisionId>,
}

/// A property shape the exporter did not fully understand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportWarning {
    pub uuid: EntityUuid,
    pub entity_type: String,
    pub bundle: String,
    pub property_name: String,
    pub property_value: Value,
    #[serde(rename = "type")]
    pub data_type: String,
    pub description: String,
}

/// Translated values for one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationPayload {
    pub target_langcode: Langcode,
    pub entity_id: EntityUuid,
    /// Requested moderation state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_id: Option<String>,
    /// Publish the translation.
    #[serde(default)]
    pub publish: bool,
    pub items: Vec<PayloadItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision_id: Option<RevisionId>,
}

impl TranslationPayload {
    pub fn new(target_langcode: Langcode, entity_id: EntityUuid, items: Vec<PayloadItem>) -> Self {
        Self {
            target_langcode,
            entity_id,
            state_id: None,
            publish: false,
            items,
            revision_id: None,
        }
    }

    #[must_use]
    pub fn with_state(mut self, state_id: &str) -> Self {
        self.state_id = Some(state_id.to_string());
        self
    }

    #[must_use]
    pub fn published(mut self) -> Self {
        self.publish = true;
        self
    }
}

/// One translated value, addressed by its export path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayloadItem {
    pub path: String,
    pub value: Value,
    pub property_type: String,
}

impl PayloadItem {
    pub fn new(path: &str, value: impl Into<Value>, property_type: &str) -> Self {
        Self {
            path: path.to_string(),
            value: value.into(),
            property_type: property_type.to_string(),
        }
    }
}

/// Payloads of every entity in one translated reference graph, keyed by
/// entity UUID.
pub type TranslationsById = BTreeMap<EntityUuid, TranslationPayload>;
