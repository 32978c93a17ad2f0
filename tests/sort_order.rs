//! Sort order contract
//!
//! Explicit sorts honor direction with ties broken by creation sequence
//! descending; entities missing the sort field go last ascending and
//! first descending; the default order is creation sequence descending.

use gustdb::engine::{CollectionEngine, Engine, EngineConfig};
use gustdb::executor::{QueryPage, QueryParams};
use serde_json::{json, Map, Value};
use std::sync::Arc;

async fn collection() -> (Engine, Arc<CollectionEngine>) {
    let engine = Engine::new(EngineConfig::default());
    let c = engine.collection("mixed");
    (engine, c)
}

fn create(c: &CollectionEngine, pairs: &[(&str, Value)]) {
    let fields: Map<String, Value> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect();
    c.create(fields);
}

fn names(page: &QueryPage) -> Vec<String> {
    page.iter()
        .map(|e| {
            e.field("name")
                .and_then(Value::as_str)
                .unwrap_or("<none>")
                .to_string()
        })
        .collect()
}

#[tokio::test]
async fn test_ascending_and_descending_directions() {
    let (_engine, c) = collection().await;
    create(&c, &[("name", json!("b")), ("rank", json!(2))]);
    create(&c, &[("name", json!("c")), ("rank", json!(3))]);
    create(&c, &[("name", json!("a")), ("rank", json!(1))]);
    c.refresh().await.unwrap();

    let asc = c
        .query("select * order by rank asc", &QueryParams::default())
        .unwrap();
    assert_eq!(names(&asc), vec!["a", "b", "c"]);

    let desc = c
        .query("select * order by rank desc", &QueryParams::default())
        .unwrap();
    assert_eq!(names(&desc), vec!["c", "b", "a"]);
}

#[tokio::test]
async fn test_missing_sort_field_placement() {
    let (_engine, c) = collection().await;
    create(&c, &[("name", json!("ranked-low")), ("rank", json!(1))]);
    create(&c, &[("name", json!("unranked"))]);
    create(&c, &[("name", json!("ranked-high")), ("rank", json!(9))]);
    c.refresh().await.unwrap();

    let asc = c
        .query("select * order by rank asc", &QueryParams::default())
        .unwrap();
    assert_eq!(names(&asc), vec!["ranked-low", "ranked-high", "unranked"]);

    let desc = c
        .query("select * order by rank desc", &QueryParams::default())
        .unwrap();
    assert_eq!(names(&desc), vec!["unranked", "ranked-high", "ranked-low"]);
}

#[tokio::test]
async fn test_ties_break_newest_first() {
    let (_engine, c) = collection().await;
    create(&c, &[("name", json!("first")), ("rank", json!(5))]);
    create(&c, &[("name", json!("second")), ("rank", json!(5))]);
    create(&c, &[("name", json!("third")), ("rank", json!(5))]);
    c.refresh().await.unwrap();

    for query in ["select * order by rank asc", "select * order by rank desc"] {
        let page = c.query(query, &QueryParams::default()).unwrap();
        assert_eq!(
            names(&page),
            vec!["third", "second", "first"],
            "tie-break failed for {query}"
        );
    }
}

#[tokio::test]
async fn test_default_order_is_newest_first() {
    let (_engine, c) = collection().await;
    for i in 0..5 {
        create(&c, &[("name", json!(format!("e{i}")))]);
    }
    c.refresh().await.unwrap();

    let page = c.query("select *", &QueryParams::default()).unwrap();
    assert_eq!(names(&page), vec!["e4", "e3", "e2", "e1", "e0"]);
}

#[tokio::test]
async fn test_sort_does_not_disturb_filtering() {
    let (_engine, c) = collection().await;
    for i in 0..10 {
        create(&c, &[("name", json!(format!("e{i}"))), ("rank", json!(i))]);
    }
    c.refresh().await.unwrap();

    let page = c
        .query(
            "select * where rank >= 4 and rank < 8 order by rank desc",
            &QueryParams::default(),
        )
        .unwrap();
    assert_eq!(names(&page), vec!["e7", "e6", "e5", "e4"]);
}

#[tokio::test]
async fn test_sort_is_idempotent_across_queries() {
    let (_engine, c) = collection().await;
    for i in 0..20 {
        create(&c, &[("name", json!(format!("e{i}"))), ("rank", json!(i % 4))]);
    }
    c.refresh().await.unwrap();

    let first = c
        .query("select * order by rank asc", &QueryParams::with_limit(20))
        .unwrap();
    let second = c
        .query("select * order by rank asc", &QueryParams::with_limit(20))
        .unwrap();
    assert_eq!(names(&first), names(&second));
}
