//! In-memory entity storage with revision history.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use argo_model::{Entity, EntitySchema};
use argo_types::{EntityUuid, RevisionId};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{EntityStorage, StorageError, StorageResult};

/// Serializable contents of a [`MemoryStorage`]: bundle schemas and every
/// stored revision, oldest first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageSnapshot {
    #[serde(default)]
    pub schemas: Vec<EntitySchema>,
    #[serde(default)]
    pub entities: Vec<Entity>,
}

/// Revision history of one entity. The last revision is the default one.
#[derive(Debug, Clone)]
struct Record {
    revisions: Vec<Entity>,
}

impl Record {
    fn latest(&self) -> Option<&Entity> {
        self.revisions.last()
    }
}

/// Entity storage kept entirely in memory.
///
/// Every save becomes the default revision, so [`EntityStorage::load`] and
/// [`EntityStorage::load_latest_revision`] return the same revision here.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    schemas: Vec<EntitySchema>,
    records: BTreeMap<(String, u64), Record>,
    uuid_index: BTreeMap<(String, EntityUuid), u64>,
    revision_index: BTreeMap<RevisionId, (String, u64)>,
    next_revision: u64,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            next_revision: 1,
            ..Self::default()
        }
    }

    /// Registers (or replaces) a bundle schema.
    pub fn register_schema(&mut self, schema: EntitySchema) {
        self.schemas
            .retain(|s| !(s.entity_type == schema.entity_type && s.bundle == schema.bundle));
        self.schemas.push(schema);
    }

    /// Stores an entity as its newest revision without stale-write checks.
    ///
    /// Revisionable entities without a revision id get a fresh one. Returns
    /// the stored revision id.
    pub fn insert(&mut self, mut entity: Entity) -> StorageResult<Option<RevisionId>> {
        let revisionable = self
            .schema(&entity.entity_type, &entity.bundle)
            .ok_or_else(|| StorageError::SchemaNotFound {
                entity_type: entity.entity_type.clone(),
                bundle: entity.bundle.clone(),
            })?
            .revisionable;
        if revisionable && entity.revision_id.is_none() {
            entity.revision_id = Some(self.allocate_revision_id());
        }
        if let Some(rev) = entity.revision_id {
            self.next_revision = self.next_revision.max(rev.get() + 1);
        }
        let revision_id = entity.revision_id;
        self.push_revision(entity, true);
        Ok(revision_id)
    }

    /// Builds a store from a snapshot, replaying revisions in order.
    pub fn from_snapshot(snapshot: StorageSnapshot) -> StorageResult<Self> {
        let mut storage = Self::new();
        for schema in snapshot.schemas {
            storage.register_schema(schema);
        }
        for entity in snapshot.entities {
            storage.insert(entity)?;
        }
        Ok(storage)
    }

    /// Every schema and every stored revision.
    pub fn to_snapshot(&self) -> StorageSnapshot {
        StorageSnapshot {
            schemas: self.schemas.clone(),
            entities: self
                .records
                .values()
                .flat_map(|r| r.revisions.iter().cloned())
                .collect(),
        }
    }

    /// Reads a snapshot file.
    pub fn open(path: &Path) -> StorageResult<Self> {
        let reader = BufReader::new(File::open(path)?);
        let snapshot: StorageSnapshot = serde_json::from_reader(reader)?;
        Self::from_snapshot(snapshot)
    }

    /// Writes the current contents to a snapshot file.
    pub fn write_to(&self, path: &Path) -> StorageResult<()> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, &self.to_snapshot())?;
        Ok(())
    }

    /// Number of stored revisions of an entity.
    pub fn revision_count(&self, entity_type: &str, id: u64) -> usize {
        self.records
            .get(&(entity_type.to_string(), id))
            .map_or(0, |r| r.revisions.len())
    }

    fn push_revision(&mut self, mut entity: Entity, as_new_revision: bool) {
        entity.new_revision = false;
        entity.needs_save = false;
        entity.loaded_revision_id = None;

        let key = (entity.entity_type.clone(), entity.id);
        self.uuid_index
            .insert((entity.entity_type.clone(), entity.uuid), entity.id);
        if let Some(rev) = entity.revision_id {
            self.revision_index.insert(rev, key.clone());
        }

        let record = self.records.entry(key).or_insert_with(|| Record { revisions: Vec::new() });
        match record.revisions.last_mut() {
            Some(current) if !as_new_revision => *current = entity,
            _ => record.revisions.push(entity),
        }
    }

    fn loaded(&self, entity: &Entity) -> Entity {
        let mut copy = entity.clone();
        copy.loaded_revision_id = self
            .records
            .get(&(entity.entity_type.clone(), entity.id))
            .and_then(Record::latest)
            .and_then(|e| e.revision_id);
        copy
    }

    fn check_fresh(&self, entity: &Entity) -> StorageResult<()> {
        let Some(record) = self.records.get(&(entity.entity_type.clone(), entity.id)) else {
            return Ok(());
        };
        let latest = record.latest().and_then(|e| e.revision_id);
        if latest != entity.loaded_revision_id {
            return Err(StorageError::StaleRevision {
                entity_type: entity.entity_type.clone(),
                id: entity.id,
                loaded: entity.loaded_revision_id,
                latest,
            });
        }
        Ok(())
    }
}

impl EntityStorage for MemoryStorage {
    fn schema(&self, entity_type: &str, bundle: &str) -> Option<&EntitySchema> {
        self.schemas
            .iter()
            .find(|s| s.entity_type == entity_type && s.bundle == bundle)
    }

    fn load(&self, entity_type: &str, id: u64) -> StorageResult<Option<Entity>> {
        Ok(self
            .records
            .get(&(entity_type.to_string(), id))
            .and_then(Record::latest)
            .map(|e| self.loaded(e)))
    }

    fn load_by_uuid(&self, entity_type: &str, uuid: &EntityUuid) -> StorageResult<Option<Entity>> {
        match self.uuid_index.get(&(entity_type.to_string(), *uuid)) {
            Some(id) => self.load(entity_type, *id),
            None => Ok(None),
        }
    }

    fn load_revision(&self, entity_type: &str, revision_id: RevisionId) -> StorageResult<Option<Entity>> {
        let Some((stored_type, id)) = self.revision_index.get(&revision_id) else {
            return Ok(None);
        };
        if stored_type != entity_type {
            return Ok(None);
        }
        Ok(self
            .records
            .get(&(stored_type.clone(), *id))
            .and_then(|r| r.revisions.iter().find(|e| e.revision_id == Some(revision_id)))
            .map(|e| self.loaded(e)))
    }

    fn load_latest_revision(&self, entity_type: &str, id: u64) -> StorageResult<Option<Entity>> {
        self.load(entity_type, id)
    }

    fn allocate_revision_id(&mut self) -> RevisionId {
        let next = self.next_revision.max(1);
        self.next_revision = next + 1;
        RevisionId::new(next)
    }

    fn save_all(&mut self, entities: Vec<Entity>) -> StorageResult<()> {
        for entity in &entities {
            if self.schema(&entity.entity_type, &entity.bundle).is_none() {
                return Err(StorageError::SchemaNotFound {
                    entity_type: entity.entity_type.clone(),
                    bundle: entity.bundle.clone(),
                });
            }
            self.check_fresh(entity)?;
            if entity.new_revision && entity.revision_id.is_none() {
                return Err(StorageError::InvalidData(format!(
                    "{} {} flagged as new revision without a revision id",
                    entity.entity_type, entity.id
                )));
            }
        }

        for entity in entities {
            debug!(
                entity_type = %entity.entity_type,
                id = entity.id,
                revision = ?entity.revision_id,
                new_revision = entity.new_revision,
                "Saving entity"
            );
            let as_new_revision = entity.new_revision;
            self.push_revision(entity, as_new_revision);
        }
        Ok(())
    }
}
