//! Engine and per-collection engine.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use serde_json::{Map, Value};
use tokio::sync::Semaphore;

use crate::executor::{QueryExecutor, QueryPage, QueryParams};
use crate::index::{ApplyUnit, IndexKey, IndexRegistry, Posting};
use crate::observability::{Event, Logger};
use crate::query;
use crate::store::{Entity, EntityId, EntityStore, FieldChanges, Version};

use super::config::EngineConfig;
use super::errors::{EngineError, EngineResult};

/// Top-level engine: a registry of per-collection engines sharing one
/// configuration and one bounded index-worker pool.
pub struct Engine {
    config: EngineConfig,
    pool: Arc<Semaphore>,
    collections: RwLock<HashMap<String, Arc<CollectionEngine>>>,
}

impl Engine {
    /// Creates an engine. Must be called from within a tokio runtime;
    /// collection engines spawn index workers on it.
    pub fn new(config: EngineConfig) -> Self {
        let pool = Arc::new(Semaphore::new(config.index_workers));
        Self {
            config,
            pool,
            collections: RwLock::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The engine for a named collection, created on first use.
    pub fn collection(&self, name: &str) -> Arc<CollectionEngine> {
        if let Some(existing) = self
            .collections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
        {
            return Arc::clone(existing);
        }

        let mut collections = self
            .collections
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(collections.entry(name.to_string()).or_insert_with(|| {
            Logger::info(Event::CollectionCreated, &[("collection", name)]);
            Arc::new(CollectionEngine::new(
                name,
                self.config.clone(),
                Arc::clone(&self.pool),
            ))
        }))
    }

    /// Refreshes every collection in turn.
    pub async fn refresh_all(&self) -> EngineResult<()> {
        let collections: Vec<Arc<CollectionEngine>> = self
            .collections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        for collection in collections {
            collection.refresh().await?;
        }
        Ok(())
    }
}

/// One collection's engine: its committed entity store, its field
/// indexes, and the public query/refresh contract.
pub struct CollectionEngine {
    name: String,
    config: EngineConfig,
    store: EntityStore,
    indexes: IndexRegistry,
}

impl CollectionEngine {
    fn new(name: &str, config: EngineConfig, pool: Arc<Semaphore>) -> Self {
        let indexes = IndexRegistry::new(name, pool, config.apply_retry);
        Self {
            name: name.to_string(),
            config,
            store: EntityStore::new(),
            indexes,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Creates an entity, assigning its id and creation sequence, and
    /// enqueues index updates for every indexed field it carries.
    pub fn create(&self, fields: Map<String, Value>) -> Arc<Entity> {
        // hold the registry guard across commit + enqueue so index
        // creation cannot interleave (see IndexRegistry)
        let guard = self.indexes.begin_write();
        let entity = self.store.create(fields);
        for (field, value) in &entity.fields {
            if let Some(index) = guard.get(field) {
                if let Some(key) = IndexKey::from_value(value) {
                    // queues close only at shutdown; nothing to index then
                    let _ = index.enqueue(ApplyUnit {
                        posting: Posting::new(entity.created_seq, entity.id),
                        old_key: None,
                        new_key: Some(key),
                    });
                }
            }
        }
        entity
    }

    /// Merges field changes onto the entity's current body, committing a
    /// new observable version with the same id.
    pub fn apply_mutation(&self, id: &EntityId, changes: &FieldChanges) -> EngineResult<Version> {
        let guard = self.indexes.begin_write();
        let (old, new) = self.store.apply_mutation(id, changes)?;
        for field in changes.keys() {
            if let Some(index) = guard.get(field) {
                let old_key = old.field(field).and_then(IndexKey::from_value);
                let new_key = new.field(field).and_then(IndexKey::from_value);
                if old_key != new_key {
                    let _ = index.enqueue(ApplyUnit {
                        posting: Posting::new(new.created_seq, new.id),
                        old_key,
                        new_key,
                    });
                }
            }
        }
        Ok(new.version)
    }

    /// Deletes an entity and enqueues removal of its postings from every
    /// field index it participated in.
    pub fn delete(&self, id: &EntityId) -> EngineResult<()> {
        let guard = self.indexes.begin_write();
        let removed = self.store.remove(id)?;
        for (field, value) in &removed.fields {
            if let Some(index) = guard.get(field) {
                if let Some(key) = IndexKey::from_value(value) {
                    let _ = index.enqueue(ApplyUnit {
                        posting: Posting::new(removed.created_seq, removed.id),
                        old_key: Some(key),
                        new_key: None,
                    });
                }
            }
        }
        Ok(())
    }

    /// The current committed version of an entity.
    pub fn entity(&self, id: &EntityId) -> Option<Arc<Entity>> {
        self.store.get(id)
    }

    /// Number of live entities in the collection.
    pub fn entity_count(&self) -> usize {
        self.store.len()
    }

    /// Declares a field indexable without waiting for a query to touch it.
    pub fn ensure_index(&self, field: &str) {
        self.indexes.ensure(field, &self.store);
    }

    /// Parses and executes a query, returning one page.
    ///
    /// Fields referenced by comparisons get an index registered on first
    /// sight; until its backfill applies the planner scans instead, so
    /// results are correct from the first call. Never blocks on the
    /// index queues.
    pub fn query(&self, text: &str, params: &QueryParams) -> EngineResult<QueryPage> {
        let parsed = query::parse(text)?;
        if let Some(filter) = &parsed.filter {
            for field in filter.comparison_fields() {
                self.indexes.ensure(field, &self.store);
            }
        }

        let executor = QueryExecutor::new(&self.store, &self.indexes, &self.config);
        let page = executor.execute(&parsed, params)?;

        Logger::debug(
            Event::QueryExecuted,
            &[
                ("collection", self.name.as_str()),
                ("returned", &page.len().to_string()),
                ("scanned", &page.scanned.to_string()),
            ],
        );
        Ok(page)
    }

    /// Blocks until every index-update task enqueued before this call
    /// has applied, or fails with `RefreshTimeout` leaving the backlog
    /// intact.
    pub async fn refresh(&self) -> EngineResult<()> {
        let handles = self.indexes.handles();
        let mut receivers = Vec::with_capacity(handles.len());
        for handle in &handles {
            receivers.push(handle.barrier()?);
        }

        let total = receivers.len();
        let deadline = tokio::time::Instant::now() + self.config.refresh_timeout;
        let mut drained = 0usize;
        for receiver in receivers {
            match tokio::time::timeout_at(deadline, receiver).await {
                // a dropped ack means the queue itself is gone; nothing
                // left to wait for there
                Ok(_) => drained += 1,
                Err(_) => {
                    let pending = total - drained;
                    Logger::warn(
                        Event::RefreshTimeout,
                        &[
                            ("collection", self.name.as_str()),
                            ("pending", &pending.to_string()),
                        ],
                    );
                    return Err(EngineError::RefreshTimeout {
                        timeout: self.config.refresh_timeout,
                        pending,
                    });
                }
            }
        }

        Logger::debug(
            Event::RefreshComplete,
            &[
                ("collection", self.name.as_str()),
                ("queues", &total.to_string()),
            ],
        );
        Ok(())
    }
}
