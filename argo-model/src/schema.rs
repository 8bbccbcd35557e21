use serde::{Deserialize, Serialize};

/// Describes one bundle of an entity type: its fields in declaration order
/// and how it is revisioned and moderated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitySchema {
    pub entity_type: String,
    pub bundle: String,
    pub fields: Vec<FieldDefinition>,
    /// Saving may create a new revision.
    #[serde(default)]
    pub revisionable: bool,
    /// The entity type records revision log, author and creation time.
    #[serde(default)]
    pub revision_metadata: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow: Option<Workflow>,
}

impl EntitySchema {
    pub fn new(entity_type: &str, bundle: &str, fields: Vec<FieldDefinition>) -> Self {
        Self {
            entity_type: entity_type.into(),
            bundle: bundle.into(),
            fields,
            revisionable: false,
            revision_metadata: false,
            workflow: None,
        }
    }

    /// Marks the bundle revisionable, with or without revision metadata.
    #[must_use]
    pub fn revisionable(mut self, with_metadata: bool) -> Self {
        self.revisionable = true;
        self.revision_metadata = with_metadata;
        self
    }

    #[must_use]
    pub fn with_workflow(mut self, workflow: Workflow) -> Self {
        self.workflow = Some(workflow);
        self
    }

    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Translatable fields in declaration order.
    pub fn translatable_fields(&self, include_computed: bool) -> impl Iterator<Item = &FieldDefinition> {
        self.fields
            .iter()
            .filter(move |f| f.translatable && (include_computed || !f.computed))
    }

    /// Fields that hold references to other entities, in declaration order.
    pub fn reference_fields(&self) -> impl Iterator<Item = &FieldDefinition> {
        self.fields.iter().filter(|f| f.target_type.is_some())
    }
}

/// A named field on a bundle. Fields are ordered, repeatable containers of
/// items; every item carries the same set of properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinition {
    pub name: String,
    pub label: String,
    #[serde(default)]
    pub description: String,
    /// Field type name (e.g. `string`, `link`, `entity_reference_revisions`).
    pub field_type: String,
    #[serde(default)]
    pub translatable: bool,
    #[serde(default)]
    pub computed: bool,
    /// Excluded from translation export by site configuration.
    #[serde(default)]
    pub excluded: bool,
    /// Entity type referenced by this field, for reference fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_type: Option<String>,
    pub properties: Vec<PropertyDefinition>,
}

impl FieldDefinition {
    fn simple(name: &str, label: &str, field_type: &str, properties: Vec<PropertyDefinition>) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            description: String::new(),
            field_type: field_type.into(),
            translatable: true,
            computed: false,
            excluded: false,
            target_type: None,
            properties,
        }
    }

    /// Single-line string field.
    pub fn string(name: &str, label: &str) -> Self {
        Self::simple(name, label, "string", vec![PropertyDefinition::new("value", "Text value", DataType::String)])
    }

    /// Formatted text field (value + text format).
    pub fn text(name: &str, label: &str) -> Self {
        Self::simple(
            name,
            label,
            "text_long",
            vec![
                PropertyDefinition::new("value", "Text", DataType::String),
                PropertyDefinition::new("format", "Text format", DataType::FilterFormat),
                PropertyDefinition::new("processed", "Processed text", DataType::String).computed(),
            ],
        )
    }

    /// Link field: URI, link text and an untyped options map.
    pub fn link(name: &str, label: &str) -> Self {
        Self::simple(
            name,
            label,
            "link",
            vec![
                PropertyDefinition::new("uri", "URI", DataType::Uri),
                PropertyDefinition::new("title", "Link text", DataType::String),
                PropertyDefinition::new("options", "Options", DataType::Map),
            ],
        )
    }

    /// Serialized metatag field.
    pub fn metatag(name: &str, label: &str) -> Self {
        Self::simple(name, label, "metatag", vec![PropertyDefinition::new("value", "Metatag", DataType::Metatag)])
    }

    /// The language marker field.
    pub fn language(name: &str, label: &str) -> Self {
        Self::simple(name, label, "language", vec![PropertyDefinition::new("value", "Language code", DataType::Language)])
    }

    pub fn boolean(name: &str, label: &str) -> Self {
        Self::simple(name, label, "boolean", vec![PropertyDefinition::new("value", "Boolean value", DataType::Boolean)])
    }

    pub fn integer(name: &str, label: &str) -> Self {
        Self::simple(name, label, "integer", vec![PropertyDefinition::new("value", "Integer value", DataType::Integer)])
    }

    /// Plain entity reference (targets an entity's default revision).
    pub fn entity_reference(name: &str, label: &str, target_type: &str) -> Self {
        let mut field = Self::simple(
            name,
            label,
            "entity_reference",
            vec![
                PropertyDefinition::new("target_id", "Entity ID", DataType::Integer),
                PropertyDefinition::new("entity", "Entity", DataType::EntityReference).computed(),
            ],
        );
        field.target_type = Some(target_type.into());
        field
    }

    /// Revision-pinned entity reference, used for composite children.
    pub fn entity_reference_revisions(name: &str, label: &str, target_type: &str) -> Self {
        let mut field = Self::simple(
            name,
            label,
            "entity_reference_revisions",
            vec![
                PropertyDefinition::new("target_id", "Entity ID", DataType::Integer),
                PropertyDefinition::new("target_revision_id", "Revision ID", DataType::Integer),
                PropertyDefinition::new("entity", "Entity", DataType::EntityReference).computed(),
            ],
        );
        field.target_type = Some(target_type.into());
        field
    }

    /// A field with an arbitrary type name and property set.
    pub fn custom(name: &str, label: &str, field_type: &str, properties: Vec<PropertyDefinition>) -> Self {
        Self::simple(name, label, field_type, properties)
    }

    #[must_use]
    pub fn translatable(mut self, translatable: bool) -> Self {
        self.translatable = translatable;
        self
    }

    #[must_use]
    pub fn excluded(mut self) -> Self {
        self.excluded = true;
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.into();
        self
    }

    pub fn property(&self, name: &str) -> Option<&PropertyDefinition> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn is_reference(&self) -> bool {
        self.target_type.is_some()
    }
}

/// A property of a field item, or of a map property with a declared
/// sub-schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDefinition {
    pub name: String,
    pub label: String,
    pub data_type: DataType,
    #[serde(default)]
    pub computed: bool,
    /// Declared sub-properties; only meaningful for `map` properties.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<PropertyDefinition>,
}

impl PropertyDefinition {
    pub fn new(name: &str, label: &str, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            data_type,
            computed: false,
            properties: Vec::new(),
        }
    }

    /// A map property with a declared sub-schema.
    pub fn map_with(name: &str, label: &str, properties: Vec<PropertyDefinition>) -> Self {
        Self {
            properties,
            ..Self::new(name, label, DataType::Map)
        }
    }

    #[must_use]
    pub fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    pub fn property(&self, name: &str) -> Option<&PropertyDefinition> {
        self.properties.iter().find(|p| p.name == name)
    }
}

/// Declared data type of a property.
///
/// Serialized as the host system's type name (`"string"`, `"uri"`, ...).
/// Names this crate does not know are kept verbatim in [`DataType::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DataType {
    Integer,
    Boolean,
    Timestamp,
    FilterFormat,
    DatetimeIso8601,
    Email,
    Language,
    String,
    Uri,
    Metatag,
    Map,
    EntityReference,
    Other(String),
}

impl DataType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Timestamp => "timestamp",
            Self::FilterFormat => "filter_format",
            Self::DatetimeIso8601 => "datetime_iso8601",
            Self::Email => "email",
            Self::Language => "language",
            Self::String => "string",
            Self::Uri => "uri",
            Self::Metatag => "metatag",
            Self::Map => "map",
            Self::EntityReference => "entity_reference",
            Self::Other(name) => name,
        }
    }

    /// How the exporter treats values of this type.
    pub fn kind(&self) -> PropertyKind {
        match self {
            Self::Integer
            | Self::Boolean
            | Self::Timestamp
            | Self::FilterFormat
            | Self::DatetimeIso8601
            | Self::Email => PropertyKind::Ignored,
            Self::String => PropertyKind::Text,
            Self::Uri => PropertyKind::Uri,
            Self::Metatag => PropertyKind::Metatag,
            Self::Map => PropertyKind::Map,
            Self::Language | Self::EntityReference | Self::Other(_) => PropertyKind::Unknown,
        }
    }
}

impl From<String> for DataType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "integer" => Self::Integer,
            "boolean" => Self::Boolean,
            "timestamp" => Self::Timestamp,
            "filter_format" => Self::FilterFormat,
            "datetime_iso8601" => Self::DatetimeIso8601,
            "email" => Self::Email,
            "language" => Self::Language,
            "string" => Self::String,
            "uri" => Self::Uri,
            "metatag" => Self::Metatag,
            "map" => Self::Map,
            "entity_reference" => Self::EntityReference,
            _ => Self::Other(value),
        }
    }
}

impl From<&str> for DataType {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<DataType> for String {
    fn from(value: DataType) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Export handling bucket for a [`DataType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    /// Not human-translatable text (numbers, flags, timestamps, ...).
    Ignored,
    /// Plain string.
    Text,
    /// URI, exported in display form.
    Uri,
    /// Serialized tag map, exported one tag at a time.
    Metatag,
    /// Dictionary, with or without a declared sub-schema.
    Map,
    /// Anything else; exported raw with a warning.
    Unknown,
}

/// A moderation workflow attached to a bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workflow {
    pub id: String,
    pub initial_state: String,
    /// States whose entities are published.
    #[serde(default)]
    pub published_states: Vec<String>,
}

impl Workflow {
    pub fn editorial() -> Self {
        Self {
            id: "editorial".into(),
            initial_state: "draft".into(),
            published_states: vec!["published".into()],
        }
    }
}
