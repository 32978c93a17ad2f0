//! In-memory entity store with atomic whole-entity visibility.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use serde_json::{Map, Value};
use uuid::Uuid;

use super::entity::{Entity, EntityId, FieldChanges};
use super::errors::{StoreError, StoreResult};

/// The committed entity set of one collection.
///
/// Entities are stored behind `Arc` and replaced whole on mutation, so
/// concurrent readers either see the old version or the new one, never a
/// mix of fields from both.
#[derive(Debug)]
pub struct EntityStore {
    entities: RwLock<HashMap<EntityId, Arc<Entity>>>,
    next_seq: AtomicU64,
}

impl Default for EntityStore {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityStore {
    pub fn new() -> Self {
        Self {
            entities: RwLock::new(HashMap::new()),
            next_seq: AtomicU64::new(1),
        }
    }

    /// Creates a new entity, assigning its id and creation sequence.
    pub fn create(&self, fields: Map<String, Value>) -> Arc<Entity> {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        let entity = Arc::new(Entity::new(Uuid::new_v4(), seq, fields));
        self.entities
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(entity.id, Arc::clone(&entity));
        entity
    }

    /// Returns the current committed version of an entity, if it is live.
    pub fn get(&self, id: &EntityId) -> Option<Arc<Entity>> {
        self.entities
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    /// Merges `changes` onto the current body, committing a new version.
    ///
    /// Returns the previous and the new committed version so the caller
    /// can derive per-field index updates.
    pub fn apply_mutation(
        &self,
        id: &EntityId,
        changes: &FieldChanges,
    ) -> StoreResult<(Arc<Entity>, Arc<Entity>)> {
        let mut entities = self
            .entities
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let old = entities
            .get(id)
            .cloned()
            .ok_or(StoreError::UnknownEntity { id: *id })?;
        let new = Arc::new(old.with_changes(changes));
        entities.insert(*id, Arc::clone(&new));
        Ok((old, new))
    }

    /// Removes an entity, returning its last committed version so the
    /// caller can unindex every field it carried.
    pub fn remove(&self, id: &EntityId) -> StoreResult<Arc<Entity>> {
        self.entities
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
            .ok_or(StoreError::UnknownEntity { id: *id })
    }

    /// A point-in-time snapshot of every live entity, in no particular
    /// order. Used for full scans and index backfills.
    pub fn snapshot(&self) -> Vec<Arc<Entity>> {
        self.entities
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }

    /// Number of live entities.
    pub fn len(&self) -> usize {
        self.entities
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
