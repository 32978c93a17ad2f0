//! Query execution pipeline.
//!
//! Execution order is fixed:
//! 1. resolve the candidate plan to live entities
//! 2. re-apply the full evaluator to every candidate
//! 3. sort into page order
//! 4. skip past the pagination cursor, if any
//! 5. truncate to the page limit and emit a continuation cursor
//!
//! Candidates are read from the committed entity store, so a stale index
//! entry (value moved, entity deleted) is filtered out here rather than
//! surfacing as a wrong result.

use std::collections::HashSet;
use std::ops::Bound;
use std::sync::Arc;

use crate::engine::EngineConfig;
use crate::index::IndexRegistry;
use crate::planner::{Planner, ScanPlan};
use crate::query::ParsedQuery;
use crate::store::{Entity, EntityId, EntityStore};

use super::cursor::Cursor;
use super::errors::ExecutorResult;
use super::filters::PredicateFilter;
use super::result::QueryPage;
use super::sorter::ResultSorter;

/// Caller-supplied pagination parameters.
#[derive(Debug, Clone, Default)]
pub struct QueryParams {
    /// Page size; defaults to the engine's `default_limit`
    pub limit: Option<usize>,
    /// Continuation token from a previous page
    pub cursor: Option<String>,
}

impl QueryParams {
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            cursor: None,
        }
    }
}

/// Executes parsed queries against one collection's store and indexes.
pub struct QueryExecutor<'a> {
    store: &'a EntityStore,
    indexes: &'a IndexRegistry,
    config: &'a EngineConfig,
}

impl<'a> QueryExecutor<'a> {
    pub fn new(store: &'a EntityStore, indexes: &'a IndexRegistry, config: &'a EngineConfig) -> Self {
        Self {
            store,
            indexes,
            config,
        }
    }

    /// Runs the full pipeline, returning one page.
    pub fn execute(&self, query: &ParsedQuery, params: &QueryParams) -> ExecutorResult<QueryPage> {
        let plan = Planner::new(self.indexes, self.config.scan_policy).plan(query.filter.as_ref())?;

        let candidates = self.resolve(&plan.scan);
        let scanned = candidates.len();

        let mut matches: Vec<Arc<Entity>> = match &query.filter {
            Some(filter) => candidates
                .into_iter()
                .filter(|entity| PredicateFilter::matches(&entity.fields, filter))
                .collect(),
            None => candidates,
        };

        ResultSorter::sort(&mut matches, query.sort.as_ref());

        if let Some(token) = &params.cursor {
            let cursor = Cursor::decode(token)?;
            let start = matches
                .iter()
                .position(|entity| cursor.is_before(entity, query.sort.as_ref()))
                .unwrap_or(matches.len());
            matches.drain(..start);
        }

        let limit = params
            .limit
            .unwrap_or(self.config.default_limit)
            .min(self.config.max_limit);

        let cursor = if matches.len() > limit && limit > 0 {
            Some(Cursor::for_entity(&matches[limit - 1], query.sort.as_ref()).encode())
        } else {
            None
        };
        matches.truncate(limit);

        Ok(QueryPage {
            entities: matches,
            cursor,
            scanned,
        })
    }

    /// Resolves a scan plan to distinct live entities.
    fn resolve(&self, scan: &ScanPlan) -> Vec<Arc<Entity>> {
        if scan.is_full_scan() {
            return self.store.snapshot();
        }
        self.resolve_ids(scan)
            .into_iter()
            .filter_map(|id| self.store.get(&id))
            .collect()
    }

    fn resolve_ids(&self, scan: &ScanPlan) -> HashSet<EntityId> {
        match scan {
            ScanPlan::IndexEq { field, key } => match self.indexes.get(field) {
                Some(index) => index.lookup_eq(key).into_iter().map(|p| p.id).collect(),
                None => HashSet::new(),
            },
            ScanPlan::IndexRange {
                field,
                lower,
                upper,
            } => match self.indexes.get(field) {
                Some(index) => index
                    .lookup_range(borrow_bound(lower), borrow_bound(upper))
                    .into_iter()
                    .map(|p| p.id)
                    .collect(),
                None => HashSet::new(),
            },
            ScanPlan::Intersect(left, right) => {
                let l = self.resolve_ids(left);
                let r = self.resolve_ids(right);
                // drive the smaller side
                let (small, large) = if l.len() <= r.len() { (l, r) } else { (r, l) };
                small.into_iter().filter(|id| large.contains(id)).collect()
            }
            ScanPlan::Union(left, right) => {
                let mut ids = self.resolve_ids(left);
                ids.extend(self.resolve_ids(right));
                ids
            }
            // composite plans never contain FullScan; the planner
            // collapses those to a top-level scan
            ScanPlan::FullScan => self.store.snapshot().iter().map(|e| e.id).collect(),
        }
    }
}

fn borrow_bound<T>(bound: &Bound<T>) -> Bound<&T> {
    match bound {
        Bound::Included(value) => Bound::Included(value),
        Bound::Excluded(value) => Bound::Excluded(value),
        Bound::Unbounded => Bound::Unbounded,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineConfig;
    use crate::index::RetryPolicy;
    use crate::query::parse;
    use serde_json::{json, Map, Value};
    use tokio::sync::Semaphore;

    struct Fixture {
        store: EntityStore,
        indexes: IndexRegistry,
        config: EngineConfig,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                store: EntityStore::new(),
                indexes: IndexRegistry::new(
                    "activities",
                    Arc::new(Semaphore::new(4)),
                    RetryPolicy::default(),
                ),
                config: EngineConfig::default(),
            }
        }

        fn seed(&self, count: usize) {
            for i in 0..count {
                let mut fields = Map::new();
                fields.insert("ordinal".to_string(), json!(i));
                fields.insert("madeup".to_string(), json!(i >= count / 2));
                fields.insert(
                    "verb".to_string(),
                    json!(if i % 2 == 0 { "go" } else { "stop" }),
                );
                self.store.create(fields);
            }
        }

        async fn index(&self, field: &str) {
            let index = self.indexes.ensure(field, &self.store);
            index.barrier().unwrap().await.unwrap();
        }

        fn run(&self, text: &str, params: &QueryParams) -> QueryPage {
            let parsed = parse(text).unwrap();
            QueryExecutor::new(&self.store, &self.indexes, &self.config)
                .execute(&parsed, params)
                .unwrap()
        }
    }

    fn ordinals(page: &QueryPage) -> Vec<i64> {
        page.iter()
            .map(|e| e.field("ordinal").and_then(Value::as_i64).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_index_and_scan_paths_agree() {
        let fixture = Fixture::new();
        fixture.seed(20);

        let query = "select * where madeup = true and ordinal >= 15";
        let scanned = fixture.run(query, &QueryParams::default());

        fixture.index("madeup").await;
        fixture.index("ordinal").await;
        let indexed = fixture.run(query, &QueryParams::default());

        assert_eq!(ordinals(&scanned), ordinals(&indexed));
        assert_eq!(ordinals(&indexed), vec![19, 18, 17, 16, 15]);
        // the indexed plan examines fewer candidates than the scan
        assert!(indexed.scanned < scanned.scanned);
    }

    #[tokio::test]
    async fn test_stale_index_entries_filtered_by_store() {
        let fixture = Fixture::new();
        fixture.seed(4);
        fixture.index("ordinal").await;

        // delete an entity after its posting landed in the index
        let victim = fixture
            .store
            .snapshot()
            .into_iter()
            .find(|e| e.field("ordinal") == Some(&json!(2)))
            .unwrap();
        fixture.store.remove(&victim.id).unwrap();

        let page = fixture.run("select * where ordinal >= 0", &QueryParams::default());
        assert_eq!(ordinals(&page), vec![3, 1, 0]);
    }

    #[tokio::test]
    async fn test_union_deduplicates() {
        let fixture = Fixture::new();
        fixture.seed(20);
        fixture.index("madeup").await;
        fixture.index("ordinal").await;

        // both branches match the top quarter; they must appear once
        let page = fixture.run(
            "select * where madeup = true or ordinal >= 15",
            &QueryParams::with_limit(20),
        );
        assert_eq!(page.len(), 10);
    }

    #[tokio::test]
    async fn test_limit_and_cursor_chain() {
        let fixture = Fixture::new();
        fixture.seed(12);

        let first = fixture.run("select *", &QueryParams::with_limit(5));
        assert_eq!(ordinals(&first), vec![11, 10, 9, 8, 7]);
        let token = first.cursor.clone().unwrap();

        let second = fixture.run(
            "select *",
            &QueryParams {
                limit: Some(5),
                cursor: Some(token),
            },
        );
        assert_eq!(ordinals(&second), vec![6, 5, 4, 3, 2]);

        let third = fixture.run(
            "select *",
            &QueryParams {
                limit: Some(5),
                cursor: second.cursor.clone(),
            },
        );
        assert_eq!(ordinals(&third), vec![1, 0]);
        assert!(third.cursor.is_none());
    }

    #[tokio::test]
    async fn test_invalid_cursor_rejected() {
        let fixture = Fixture::new();
        fixture.seed(2);
        let parsed = parse("select *").unwrap();
        let executor = QueryExecutor::new(&fixture.store, &fixture.indexes, &fixture.config);
        let err = executor
            .execute(
                &parsed,
                &QueryParams {
                    limit: None,
                    cursor: Some("///not-base64///".to_string()),
                },
            )
            .unwrap_err();
        assert_eq!(err, crate::executor::ExecutorError::InvalidCursor);
    }

    #[tokio::test]
    async fn test_default_limit_applies() {
        let fixture = Fixture::new();
        fixture.seed(15);
        let page = fixture.run("select *", &QueryParams::default());
        assert_eq!(page.len(), 10);
        assert!(page.cursor.is_some());
    }

    #[tokio::test]
    async fn test_max_limit_caps_requested_limit() {
        let fixture = Fixture::new();
        fixture.seed(5);
        let mut config = EngineConfig::default();
        config.max_limit = 3;
        let parsed = parse("select *").unwrap();
        let page = QueryExecutor::new(&fixture.store, &fixture.indexes, &config)
            .execute(&parsed, &QueryParams::with_limit(100))
            .unwrap();
        assert_eq!(page.len(), 3);
    }
}
