//! Entity storage collaborator for Argo.
//!
//! The translation layer never talks to a database directly. It loads and
//! saves entities through the [`EntityStorage`] trait, which the host content
//! platform implements. [`MemoryStorage`] is a complete in-process
//! implementation backed by a JSON snapshot, used by the CLI and the tests.

mod error;
mod memory;

pub use error::{StorageError, StorageResult};
pub use memory::{MemoryStorage, StorageSnapshot};

use argo_model::{Entity, EntitySchema};
use argo_types::{EntityUuid, RevisionId};

/// Load/save capability of the host entity storage.
///
/// Loaded entities have `loaded_revision_id` set to the latest revision that
/// existed at load time so [`EntityStorage::save_all`] can reject stale writes.
pub trait EntityStorage {
    /// Schema of a bundle.
    fn schema(&self, entity_type: &str, bundle: &str) -> Option<&EntitySchema>;

    /// Loads the default revision of an entity by numeric id.
    fn load(&self, entity_type: &str, id: u64) -> StorageResult<Option<Entity>>;

    /// Loads the default revision of an entity by UUID.
    fn load_by_uuid(&self, entity_type: &str, uuid: &EntityUuid) -> StorageResult<Option<Entity>>;

    /// Loads a specific revision.
    fn load_revision(&self, entity_type: &str, revision_id: RevisionId) -> StorageResult<Option<Entity>>;

    /// Loads the most recent revision, which may be newer than the default one.
    fn load_latest_revision(&self, entity_type: &str, id: u64) -> StorageResult<Option<Entity>>;

    /// Reserves the id for a revision that will be written by a later
    /// [`EntityStorage::save_all`].
    fn allocate_revision_id(&mut self) -> RevisionId;

    /// Writes all entities or none of them.
    ///
    /// Entities flagged `new_revision` are stored as a new revision under
    /// their (pre-allocated) `revision_id`; others overwrite their current
    /// revision.
    fn save_all(&mut self, entities: Vec<Entity>) -> StorageResult<()>;
}
