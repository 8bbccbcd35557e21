//! Argo configuration.

use std::path::Path;

use argo_types::ActingUser;
use serde::{Deserialize, Serialize};

use crate::{ArgoError, ArgoResult};

/// Default revision log message for imported translations.
pub const DEFAULT_REVISION_LOG: &str = "Translated by Argo";

/// Site-level settings for export and translation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ArgoConfig {
    /// Entity types whose references are listed in exports.
    pub traversable_entity_types: Vec<String>,
    /// Node bundles whose references are listed in exports.
    pub traversable_content_types: Vec<String>,
    /// Entity types embedded in their host (e.g. paragraphs). Always
    /// traversed, and saved as part of their host.
    pub composite_entity_types: Vec<String>,
    pub revision_log_message: String,
    /// Account that imported revisions are attributed to.
    pub service_account: ActingUser,
}

impl Default for ArgoConfig {
    fn default() -> Self {
        Self {
            traversable_entity_types: Vec::new(),
            traversable_content_types: Vec::new(),
            composite_entity_types: vec!["paragraph".to_string()],
            revision_log_message: DEFAULT_REVISION_LOG.to_string(),
            service_account: ActingUser::default(),
        }
    }
}

impl ArgoConfig {
    pub fn from_json(json: &str) -> ArgoResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> ArgoResult<Self> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    fn validate(&self) -> ArgoResult<()> {
        if self.revision_log_message.trim().is_empty() {
            return Err(ArgoError::Config("revisionLogMessage must not be empty".into()));
        }
        Ok(())
    }

    pub fn is_composite(&self, entity_type: &str) -> bool {
        self.composite_entity_types.iter().any(|t| t == entity_type)
    }

    /// Whether references to an entity of this type/bundle are exported.
    pub fn is_traversable(&self, entity_type: &str, bundle: &str) -> bool {
        self.is_composite(entity_type)
            || self.traversable_entity_types.iter().any(|t| t == entity_type)
            || (entity_type == "node" && self.traversable_content_types.iter().any(|b| b == bundle))
    }
}
