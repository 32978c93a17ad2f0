//! Asynchronous index maintenance.
//!
//! Every field index owns one task queue. The write path enqueues one
//! [`ApplyUnit`] per affected field; a background worker drains the queue
//! in enqueue order, so updates to a single field are never reordered.
//! Apply work is gated by an engine-wide semaphore, which bounds how many
//! workers make progress at once without serializing unrelated fields.
//!
//! A freshly created index starts not-ready and is seeded by a `Backfill`
//! task that is always first in its queue; the planner ignores indexes
//! that are not ready, so a backfilling index can never produce
//! false-empty candidates.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, Semaphore};

use crate::observability::{Event, Logger};

use super::btree::{FieldTree, IndexKey, Posting};
use super::errors::{IndexError, IndexResult};

/// Retry policy for failed index-update applications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts after the first failure before the index degrades
    pub max_retries: u32,
    /// Delay before the first retry; doubles per attempt
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(10),
        }
    }
}

/// One entity's index delta for a single field.
///
/// `old_key` and `new_key` are both `None`-able: create has no old key,
/// delete has no new key, and a value changing to something unindexable
/// (object, null) drops the entry.
#[derive(Debug, Clone, PartialEq)]
pub struct ApplyUnit {
    pub posting: Posting,
    pub old_key: Option<IndexKey>,
    pub new_key: Option<IndexKey>,
}

/// A task on a field index queue.
#[derive(Debug)]
pub enum IndexTask {
    /// Seed a fresh index from a store snapshot; always first in queue
    Backfill(Vec<(IndexKey, Posting)>),
    /// Apply one entity's delta
    Apply(ApplyUnit),
    /// Refresh barrier token; acked once everything before it applied
    Barrier(oneshot::Sender<()>),
}

/// A single field's index plus its update queue.
#[derive(Debug)]
pub struct FieldIndex {
    field: String,
    tree: Arc<RwLock<FieldTree>>,
    ready: Arc<AtomicBool>,
    sender: mpsc::UnboundedSender<IndexTask>,
}

impl FieldIndex {
    /// Creates the index, queues its backfill and spawns the worker.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(
        collection: &str,
        field: &str,
        backfill: Vec<(IndexKey, Posting)>,
        pool: Arc<Semaphore>,
        retry: RetryPolicy,
    ) -> Arc<Self> {
        let (sender, receiver) = mpsc::unbounded_channel();
        let tree = Arc::new(RwLock::new(FieldTree::new()));
        let ready = Arc::new(AtomicBool::new(false));

        let index = Arc::new(Self {
            field: field.to_string(),
            tree: Arc::clone(&tree),
            ready: Arc::clone(&ready),
            sender,
        });

        // Seed before the worker starts so the backfill is task number one
        let _ = index.sender.send(IndexTask::Backfill(backfill));

        tokio::spawn(run_worker(
            collection.to_string(),
            field.to_string(),
            tree,
            ready,
            receiver,
            pool,
            retry,
        ));

        index
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    /// True once the backfill has applied and the index has not degraded.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    /// Enqueues an apply unit; fails only when the engine is shutting down.
    pub fn enqueue(&self, unit: ApplyUnit) -> IndexResult<()> {
        self.sender
            .send(IndexTask::Apply(unit))
            .map_err(|_| IndexError::QueueClosed {
                field: self.field.clone(),
            })
    }

    /// Pushes a barrier token; the returned receiver resolves once every
    /// task enqueued before it has applied.
    pub fn barrier(&self) -> IndexResult<oneshot::Receiver<()>> {
        let (ack, rx) = oneshot::channel();
        self.sender
            .send(IndexTask::Barrier(ack))
            .map_err(|_| IndexError::QueueClosed {
                field: self.field.clone(),
            })?;
        Ok(rx)
    }

    /// Candidate postings for an exact key.
    pub fn lookup_eq(&self, key: &IndexKey) -> Vec<Posting> {
        self.tree
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .lookup_eq(key)
    }

    /// Candidate postings for a key range.
    pub fn lookup_range(
        &self,
        lower: std::ops::Bound<&IndexKey>,
        upper: std::ops::Bound<&IndexKey>,
    ) -> Vec<Posting> {
        self.tree
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .lookup_range(lower, upper)
    }

    /// Total postings currently in the index.
    pub fn posting_count(&self) -> usize {
        self.tree
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .posting_count()
    }
}

async fn run_worker(
    collection: String,
    field: String,
    tree: Arc<RwLock<FieldTree>>,
    ready: Arc<AtomicBool>,
    mut receiver: mpsc::UnboundedReceiver<IndexTask>,
    pool: Arc<Semaphore>,
    retry: RetryPolicy,
) {
    while let Some(task) = receiver.recv().await {
        match task {
            IndexTask::Backfill(entries) => {
                let Ok(_permit) = pool.acquire().await else {
                    break;
                };
                let count = entries.len();
                {
                    let mut tree = tree.write().unwrap_or_else(PoisonError::into_inner);
                    for (key, posting) in entries {
                        tree.insert(key, posting);
                    }
                }
                ready.store(true, Ordering::SeqCst);
                Logger::info(
                    Event::IndexBackfilled,
                    &[
                        ("collection", &collection),
                        ("entries", &count.to_string()),
                        ("field", &field),
                    ],
                );
            }
            IndexTask::Apply(unit) => {
                let Ok(_permit) = pool.acquire().await else {
                    break;
                };
                if apply_with_retry(&field, &tree, &unit, retry).await.is_err() {
                    // Degrade: the planner stops trusting this index and
                    // falls back to scans, so results stay correct while
                    // the queue backlog shows up as refresh pressure.
                    ready.store(false, Ordering::SeqCst);
                    Logger::error(
                        Event::IndexApplyFailed,
                        &[("collection", &collection), ("field", &field)],
                    );
                }
            }
            IndexTask::Barrier(ack) => {
                let _ = ack.send(());
            }
        }
    }
}

async fn apply_with_retry(
    field: &str,
    tree: &RwLock<FieldTree>,
    unit: &ApplyUnit,
    retry: RetryPolicy,
) -> IndexResult<()> {
    let mut attempt = 0u32;
    loop {
        match apply_unit(tree, unit) {
            Ok(()) => return Ok(()),
            Err(_) if attempt < retry.max_retries => {
                attempt += 1;
                Logger::warn(
                    Event::IndexApplyRetry,
                    &[("attempt", &attempt.to_string()), ("field", field)],
                );
                tokio::time::sleep(retry.base_delay * 2u32.saturating_pow(attempt - 1)).await;
            }
            Err(err) => return Err(err),
        }
    }
}

fn apply_unit(tree: &RwLock<FieldTree>, unit: &ApplyUnit) -> IndexResult<()> {
    let mut tree = tree.write().unwrap_or_else(PoisonError::into_inner);
    if let Some(old_key) = &unit.old_key {
        tree.remove(old_key, &unit.posting.id);
    }
    if let Some(new_key) = &unit.new_key {
        tree.insert(new_key.clone(), unit.posting);
    }
    Ok(())
}
