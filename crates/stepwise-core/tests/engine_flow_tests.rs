//! End-to-end engine flows over the sample configuration

use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::Arc;
use stepwise_core::prelude::*;
use stepwise_core::MemoryConfigSource;
use stepwise_model::{Step, TemplateRef};
use stepwise_plugin::PluginError;
use stepwise_test_utils::{sample_documents, sample_loader, CountingLoader, FormPlugin};

fn memory_source() -> MemoryConfigSource {
    let source = MemoryConfigSource::new();
    for document in sample_documents() {
        source.insert(document.kind, &document.id_refs(), document.value.clone());
    }
    source
}

fn engine() -> Engine {
    let engine = Engine::new(
        EngineConfig::default(),
        Arc::new(memory_source()),
        Arc::new(sample_loader()),
    );
    engine.register_plugin(FormPlugin::shared());
    engine
}

#[tokio::test]
async fn start_lands_on_first_step_of_default_scenario() {
    let engine = engine();
    let triple = engine.start().await.unwrap();
    assert_eq!(
        triple,
        ActiveTriple::workspace("main")
            .with_scenario("onboarding")
            .with_step("intro")
    );
    assert_eq!(engine.workspace_slugs(), vec!["main"]);
    assert_eq!(engine.discover_workspaces().await.unwrap(), vec!["main"]);
}

#[tokio::test]
async fn render_view_interpolates_messages_and_templates() {
    let engine = engine();
    engine.start().await.unwrap();

    let view = engine.render_view().await.unwrap();
    assert_eq!(view.assistant_message.as_deref(), Some("Hi Ann!"));
    assert_eq!(view.system_message.as_deref(), Some("You are helping Ann."));
    assert_eq!(view.rendered, Some(json!({"title": "Welcome, Ann"})));
    assert!(view.layout.as_ref().unwrap().is_ready());
    assert_eq!(view.widgets.len(), 1);
    assert!(view.can_next);
    assert!(!view.can_prev);
    assert!(view.placeholders().is_empty());
}

#[tokio::test]
async fn missing_template_renders_placeholder() {
    let engine = engine();
    engine.start().await.unwrap();
    engine.go_to("onboarding", "done");

    let view = engine.render_view().await.unwrap();
    assert_eq!(
        view.placeholders(),
        vec!["Template not found: default/steps/missing.json".to_string()]
    );
    assert!(view.rendered.is_none());
    assert!(!view.can_next);
}

#[tokio::test]
async fn unknown_step_is_selected_but_missing() {
    let engine = engine();
    engine.start().await.unwrap();
    engine.go_to("onboarding", "ghost");

    let view = engine.render_view().await.unwrap();
    assert!(view.is_step_missing());
    assert!(view.content.is_none());
    assert!(engine.next().is_none());
}

#[tokio::test]
async fn submit_without_plugin_stores_and_advances() {
    let engine = engine();
    engine.start().await.unwrap();

    let outcome = engine.on_submit(json!({"seen": true})).await.unwrap();
    assert_eq!(outcome.step, "intro");
    assert!(outcome.result.is_none());
    assert_eq!(outcome.event.as_ref().and_then(|e| e.step()), Some("profile"));
    assert_eq!(engine.context().get("intro.seen"), Some(json!(true)));
}

#[tokio::test]
async fn submit_runs_plugin_and_applies_updates() {
    let engine = engine();
    engine.start().await.unwrap();
    engine.next();

    let outcome = engine
        .on_submit(json!({"email": "ann@example.com"}))
        .await
        .unwrap();
    assert_eq!(outcome.result, Some(json!({"email": "ann@example.com"})));
    assert_eq!(outcome.applied_updates, 1);
    assert_eq!(engine.context().get("profile.verified"), Some(json!(true)));
    assert_eq!(engine.current_triple().step_slug(), Some("done"));

    let view = engine.render_view().await.unwrap();
    assert_eq!(
        view.initial_user_message.as_deref(),
        Some("Thanks, ann@example.com")
    );
}

#[tokio::test]
async fn invalid_submission_does_not_advance() {
    let engine = engine();
    engine.start().await.unwrap();
    engine.next();

    let err = engine.on_submit(json!({"email": "nope"})).await.unwrap_err();
    assert!(err.is_user_visible());
    assert!(matches!(
        err,
        EngineError::Plugin(PluginError::StepValidationFailed { .. })
    ));
    assert_eq!(engine.current_triple().step_slug(), Some("profile"));
}

#[tokio::test]
async fn submit_without_step_fails() {
    let engine = engine();
    engine.load_app().await.unwrap();
    engine.go_workspace("main").await.unwrap();
    let err = engine.on_submit(Value::Null).await.unwrap_err();
    assert_eq!(err.code(), "no_step");
}

#[tokio::test]
async fn context_is_seeded_once_and_kept_per_workspace() {
    let engine = engine();
    engine.start().await.unwrap();
    engine.context().set_path("user", "name", json!("Bob"));

    engine.load_workspace("main").await.unwrap();
    assert_eq!(engine.context().get("user.name"), Some(json!("Bob")));
}

#[tokio::test]
async fn unknown_workspace_is_config_not_found() {
    let engine = engine();
    let err = engine.go_workspace("nope").await.unwrap_err();
    assert_eq!(err.code(), "config_not_found");
    assert!(engine.current_triple().workspace.is_none());
}

#[tokio::test]
async fn templates_load_once_per_session() {
    let loader = Arc::new(CountingLoader::new(Arc::new(sample_loader())));
    let engine = Engine::new(
        EngineConfig::default(),
        Arc::new(memory_source()),
        loader.clone(),
    );
    engine.start().await.unwrap();

    engine.render_view().await.unwrap();
    let after_first = loader.calls();
    engine.render_view().await.unwrap();
    engine.go_to("onboarding", "done");
    engine.render_view().await.unwrap();
    engine.render_view().await.unwrap();

    // layout + widget + intro, then missing.json once
    assert_eq!(after_first, 3);
    assert_eq!(loader.calls(), 4);
    assert!(engine
        .resolver()
        .is_cached(&TemplateRef::step("default", "missing.json")));
}

#[tokio::test]
async fn replace_step_keeps_order_invariants() {
    let engine = engine();
    engine.start().await.unwrap();

    let previous = engine
        .replace_step(
            "onboarding",
            Step::new("intro", 1, "intro.json").with_assistant_message("Hello again"),
        )
        .unwrap();
    assert_eq!(previous.assistant_message.as_deref(), Some("Hi {{user.name}}!"));
    let view = engine.render_view().await.unwrap();
    assert_eq!(view.assistant_message.as_deref(), Some("Hello again"));

    let err = engine
        .replace_step("onboarding", Step::new("intro", 2, "intro.json"))
        .unwrap_err();
    assert_eq!(err.code(), "duplicate_order");

    let err = engine
        .update_scenario("nope", |_| Ok(()))
        .unwrap_err();
    assert_eq!(err.code(), "unknown_scenario");
}

#[tokio::test]
async fn scenario_edit_may_read_the_engine() {
    let engine = engine();
    engine.start().await.unwrap();

    let scenario_count = engine
        .update_scenario("tour", |scenario| {
            let count = engine.workspace("main").map_or(0, |ws| ws.scenarios.len());
            scenario.insert_node(Step::new("extra", 2, "intro.json"))?;
            Ok(count)
        })
        .unwrap();
    assert_eq!(scenario_count, 2);
    assert_eq!(
        engine
            .workspace("main")
            .unwrap()
            .scenario("tour")
            .unwrap()
            .slugs()
            .collect::<Vec<_>>(),
        vec!["welcome", "extra"]
    );
}

#[tokio::test]
async fn context_round_trips_through_item_store() {
    let items = Arc::new(MemoryItemStore::new());
    let engine = Engine::new(
        EngineConfig::default(),
        Arc::new(memory_source()),
        Arc::new(sample_loader()),
    )
    .with_item_store(items.clone());
    engine.start().await.unwrap();
    engine.context().set("answer", json!(42));
    engine.persist_context("main").await.unwrap();

    engine.context().set("answer", json!(0));
    assert!(engine.restore_context("main").await.unwrap());
    assert_eq!(engine.context().get("answer"), Some(json!(42)));
    assert!(!engine.restore_context("other").await.unwrap());
}

#[tokio::test]
async fn restoring_unloaded_workspace_creates_no_bucket() {
    let items = Arc::new(MemoryItemStore::new());
    items
        .save_item(stepwise_core::CONTEXT_COLLECTION, "main", json!({"answer": 42}))
        .await
        .unwrap();
    let engine = Engine::new(
        EngineConfig::default(),
        Arc::new(memory_source()),
        Arc::new(sample_loader()),
    )
    .with_item_store(items);

    let err = engine.restore_context("main").await.unwrap_err();
    assert!(matches!(err, EngineError::NoWorkspace));
    assert!(!engine.context().has_bucket("main"));

    // The first load still seeds from initialContext
    engine.start().await.unwrap();
    assert_eq!(engine.context().get("user.name"), Some(json!("Ann")));
    assert!(engine.context().get("answer").is_none());
}

#[tokio::test]
async fn persistence_requires_item_store() {
    let engine = engine();
    engine.start().await.unwrap();
    let err = engine.persist_context("main").await.unwrap_err();
    assert_eq!(err.code(), "store");
}

#[tokio::test]
async fn delete_workspace_resets_navigation() {
    let engine = engine();
    engine.start().await.unwrap();
    assert!(engine.delete_workspace("main"));
    assert_eq!(engine.current_triple(), ActiveTriple::default());
    assert!(!engine.context().has_bucket("main"));
    assert!(matches!(engine.render_view().await, Err(EngineError::NoWorkspace)));
}

#[tokio::test]
async fn index_adjacency_is_configurable() {
    let source = memory_source();
    source.insert(
        stepwise_model::ConfigKind::Scenario,
        &["main", "gapped"],
        json!({"slug": "gapped", "nodes": [
            {"slug": "a", "order": 1, "tplFile": "intro.json"},
            {"slug": "c", "order": 5, "tplFile": "intro.json"}
        ]}),
    );
    let source = Arc::new(source);

    let by_order = Engine::new(EngineConfig::default(), source.clone(), Arc::new(sample_loader()));
    by_order.go_workspace("main").await.unwrap();
    by_order.go_scenario("gapped").unwrap();
    assert!(by_order.next().is_none());

    let by_index = Engine::new(
        EngineConfig::default().with_adjacency(AdjacencyPolicy::IndexAdjacent),
        source,
        Arc::new(sample_loader()),
    );
    by_index.go_workspace("main").await.unwrap();
    by_index.go_scenario("gapped").unwrap();
    assert_eq!(by_index.next().and_then(|e| e.step().map(str::to_string)), Some("c".to_string()));
}
