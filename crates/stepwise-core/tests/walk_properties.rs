//! Walking generated scenarios end to end through the engine

use proptest::prelude::*;
use serde_json::json;
use std::collections::BTreeSet;
use std::sync::Arc;
use stepwise_core::{Engine, EngineConfig, MemoryConfigSource};
use stepwise_model::ConfigKind;
use stepwise_navigation::AdjacencyPolicy;
use stepwise_template::StaticLoader;

fn engine_for(orders: &BTreeSet<i64>, policy: AdjacencyPolicy) -> Engine {
    // Reverse file order so the engine has to sort
    let nodes: Vec<_> = orders
        .iter()
        .rev()
        .map(|order| json!({"slug": format!("s{order}"), "order": order, "tplFile": "x.json"}))
        .collect();
    let source = MemoryConfigSource::new()
        .with_document(ConfigKind::Workspace, &["ws"], json!({"slug": "ws"}))
        .with_document(ConfigKind::Scenario, &["ws", "flow"], json!({"slug": "flow", "nodes": nodes}));
    Engine::new(
        EngineConfig::default().with_adjacency(policy),
        Arc::new(source),
        Arc::new(StaticLoader::new()),
    )
}

fn walk(engine: &Engine) -> Vec<String> {
    let mut visited: Vec<String> = engine.current_triple().step.into_iter().collect();
    while let Some(event) = engine.next() {
        visited.extend(event.step().map(str::to_string));
    }
    visited
}

proptest! {
    #[test]
    fn prop_index_walk_visits_every_step_in_order(
        orders in prop::collection::btree_set(-50i64..50, 1..12)
    ) {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let engine = engine_for(&orders, AdjacencyPolicy::IndexAdjacent);
        runtime.block_on(engine.go_workspace("ws")).unwrap();
        engine.go_scenario("flow").unwrap();

        let expected: Vec<String> = orders.iter().map(|o| format!("s{o}")).collect();
        prop_assert_eq!(walk(&engine), expected);
    }

    #[test]
    fn prop_order_walk_stops_at_first_gap(
        orders in prop::collection::btree_set(-50i64..50, 1..12)
    ) {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let engine = engine_for(&orders, AdjacencyPolicy::OrderAdjacent);
        runtime.block_on(engine.go_workspace("ws")).unwrap();
        engine.go_scenario("flow").unwrap();

        let first = *orders.iter().next().unwrap();
        let expected: Vec<String> = (first..)
            .take_while(|o| orders.contains(o))
            .map(|o| format!("s{o}"))
            .collect();
        prop_assert_eq!(walk(&engine), expected);
    }
}
