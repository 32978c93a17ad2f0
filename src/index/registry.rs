//! Per-collection field index registry.
//!
//! Owns every field index of one collection and enforces the locking
//! protocol that keeps lazy index creation linearized against the write
//! path:
//!
//! - writers hold the registry's shared guard across (store commit +
//!   enqueue), so the set of field indexes cannot change mid-write;
//! - index creation holds the exclusive lock across (store snapshot +
//!   backfill enqueue + insert), so no commit can fall between the
//!   snapshot and the first queued task.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};

use tokio::sync::Semaphore;

use crate::observability::{Event, Logger};
use crate::store::EntityStore;

use super::btree::{IndexKey, Posting};
use super::worker::{FieldIndex, RetryPolicy};

/// Registry of field indexes for one collection.
#[derive(Debug)]
pub struct IndexRegistry {
    collection: String,
    fields: RwLock<HashMap<String, Arc<FieldIndex>>>,
    pool: Arc<Semaphore>,
    retry: RetryPolicy,
}

/// Shared view of the registry held for the duration of one write-path
/// critical section.
pub struct WriteGuard<'a> {
    inner: RwLockReadGuard<'a, HashMap<String, Arc<FieldIndex>>>,
}

impl WriteGuard<'_> {
    /// The index for a field, if one is registered.
    pub fn get(&self, field: &str) -> Option<&Arc<FieldIndex>> {
        self.inner.get(field)
    }
}

impl IndexRegistry {
    pub fn new(collection: impl Into<String>, pool: Arc<Semaphore>, retry: RetryPolicy) -> Self {
        Self {
            collection: collection.into(),
            fields: RwLock::new(HashMap::new()),
            pool,
            retry,
        }
    }

    /// Begins a write-path critical section; commit to the store and
    /// enqueue all apply units before dropping the guard.
    pub fn begin_write(&self) -> WriteGuard<'_> {
        WriteGuard {
            inner: self.fields.read().unwrap_or_else(PoisonError::into_inner),
        }
    }

    /// The index for a field, if one is registered.
    pub fn get(&self, field: &str) -> Option<Arc<FieldIndex>> {
        self.fields
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(field)
            .cloned()
    }

    /// The index for a field, only if its backfill has applied. The
    /// planner uses this; a not-yet-ready index plans as a full scan.
    pub fn ready(&self, field: &str) -> Option<Arc<FieldIndex>> {
        self.get(field).filter(|index| index.is_ready())
    }

    /// Registers an index for `field` if none exists, seeding it from a
    /// snapshot of `store` taken under the exclusive registry lock.
    pub fn ensure(&self, field: &str, store: &EntityStore) -> Arc<FieldIndex> {
        let mut fields = self.fields.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = fields.get(field) {
            return Arc::clone(existing);
        }

        let backfill: Vec<(IndexKey, Posting)> = store
            .snapshot()
            .iter()
            .filter_map(|entity| {
                entity
                    .field(field)
                    .and_then(IndexKey::from_value)
                    .map(|key| (key, Posting::new(entity.created_seq, entity.id)))
            })
            .collect();

        let index = FieldIndex::spawn(
            &self.collection,
            field,
            backfill,
            Arc::clone(&self.pool),
            self.retry,
        );
        fields.insert(field.to_string(), Arc::clone(&index));

        Logger::info(
            Event::IndexRegistered,
            &[("collection", &self.collection), ("field", field)],
        );

        index
    }

    /// Every registered index, for refresh barriers.
    pub fn handles(&self) -> Vec<Arc<FieldIndex>> {
        self.fields
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }

    /// Number of registered field indexes.
    pub fn len(&self) -> usize {
        self.fields
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
