//! Testing utilities for the stepwise workspace
//!
//! Shared fixtures: a sample config tree, a template registry matching it,
//! a call-counting loader and a form plugin.

#![allow(missing_docs)]

use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use stepwise_model::{ConfigKind, Scenario, Step, TemplateRef, TemplateSettings, Workspace};
use stepwise_plugin::{Plugin, PluginError, PluginManifest, StepOutcome, Validation};
use stepwise_template::{LoadError, Loader, StaticLoader, Template};

pub const ROOT_NAMESPACE: &str = "default";

/// One config document of the sample tree
#[derive(Debug, Clone)]
pub struct ConfigDocument {
    pub kind: ConfigKind,
    pub ids: Vec<String>,
    pub value: Value,
}

impl ConfigDocument {
    fn new(kind: ConfigKind, ids: &[&str], value: Value) -> Self {
        Self {
            kind,
            ids: ids.iter().map(|id| (*id).to_string()).collect(),
            value,
        }
    }

    pub fn id_refs(&self) -> Vec<&str> {
        self.ids.iter().map(String::as_str).collect()
    }

    pub fn relative_path(&self) -> PathBuf {
        self.kind
            .relative_path(&self.id_refs())
            .unwrap()
    }
}

/// Sample application: workspace `main` with scenarios `onboarding` and `tour`
pub fn sample_documents() -> Vec<ConfigDocument> {
    vec![
        ConfigDocument::new(
            ConfigKind::App,
            &[],
            json!({
                "name": "Sample",
                "tplDir": ROOT_NAMESPACE,
                "defaultWorkspace": "main",
                "defaultScenario": "onboarding"
            }),
        ),
        ConfigDocument::new(
            ConfigKind::Workspace,
            &["main"],
            json!({
                "slug": "main",
                "name": "Main",
                "templateSettings": {"layoutFile": "main.json", "widgets": ["chat.json"]},
                "initialContext": {"user": {"name": "Ann"}}
            }),
        ),
        ConfigDocument::new(
            ConfigKind::Scenario,
            &["main", "onboarding"],
            json!({
                "slug": "onboarding",
                "name": "Onboarding",
                "systemMessage": "You are helping {{user.name}}.",
                "nodes": [
                    {"slug": "profile", "label": "Profile", "order": 2, "tplFile": "form.json",
                     "type": "form", "contextPath": "profile"},
                    {"slug": "intro", "label": "Intro", "order": 1, "tplFile": "intro.json",
                     "assistantMessage": "Hi {{user.name}}!"},
                    {"slug": "done", "label": "Done", "order": 3, "tplFile": "missing.json",
                     "initialUserMessage": "Thanks, {{profile.email}}"}
                ]
            }),
        ),
        ConfigDocument::new(
            ConfigKind::Scenario,
            &["main", "tour"],
            json!({
                "slug": "tour",
                "nodes": [{"slug": "welcome", "order": 1, "tplFile": "intro.json"}]
            }),
        ),
    ]
}

/// Write the sample tree under `root`
pub fn write_sample_config(root: &Path) -> std::io::Result<()> {
    for document in sample_documents() {
        let path = root.join(document.relative_path());
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_vec_pretty(&document.value)?)?;
    }
    Ok(())
}

/// Templates for the sample tree; `steps/missing.json` is deliberately absent
pub fn sample_loader() -> StaticLoader {
    StaticLoader::new()
        .with_template(
            TemplateRef::layout(ROOT_NAMESPACE, "main.json"),
            json!({"regions": ["header", "body", "footer"]}),
        )
        .with_template(
            TemplateRef::widget(ROOT_NAMESPACE, "chat.json"),
            json!({"kind": "chat"}),
        )
        .with_template(
            TemplateRef::step(ROOT_NAMESPACE, "intro.json"),
            json!({"title": "Welcome, {{user.name}}"}),
        )
        .with_template(
            TemplateRef::step(ROOT_NAMESPACE, "form.json"),
            json!({"fields": ["email"], "title": "Profile"}),
        )
}

/// Write the sample templates under `root` in the filesystem loader layout
pub fn write_sample_templates(root: &Path) -> std::io::Result<()> {
    let files = [
        ("layouts/main.json", json!({"regions": ["header", "body", "footer"]})),
        ("widgets/chat.json", json!({"kind": "chat"})),
        ("steps/intro.json", json!({"title": "Welcome, {{user.name}}"})),
        ("steps/form.json", json!({"fields": ["email"], "title": "Profile"})),
    ];
    for (relative, document) in files {
        let path = root.join(ROOT_NAMESPACE).join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_vec_pretty(&document)?)?;
    }
    Ok(())
}

/// Sample workspace built directly from model types
pub fn sample_workspace() -> Workspace {
    let onboarding = Scenario::from_nodes(
        "onboarding",
        vec![
            Step::new("intro", 1, "intro.json").with_assistant_message("Hi {{user.name}}!"),
            Step::new("profile", 2, "form.json")
                .with_type("form")
                .with_context_path("profile"),
            Step::new("done", 3, "missing.json"),
        ],
    )
    .unwrap();
    let mut initial = serde_json::Map::new();
    initial.insert("user".to_string(), json!({"name": "Ann"}));

    Workspace::new("main")
        .with_scenario(onboarding)
        .with_initial_context(initial)
        .with_template_settings(TemplateSettings {
            theme: None,
            layout_file: Some("main.json".to_string()),
            widgets: vec!["chat.json".to_string()],
        })
}

/// Loader wrapper counting calls per session
pub struct CountingLoader {
    inner: Arc<dyn Loader>,
    calls: AtomicUsize,
}

impl CountingLoader {
    pub fn new(inner: Arc<dyn Loader>) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Loader for CountingLoader {
    async fn load(&self, reference: &TemplateRef) -> Result<Template, LoadError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.load(reference).await
    }
}

/// Plugin for `type: "form"` steps
///
/// Valid once the submission stored an `email` under the step's context
/// path; execution marks the profile verified.
pub struct FormPlugin {
    manifest: PluginManifest,
}

impl FormPlugin {
    pub fn new() -> Self {
        Self {
            manifest: PluginManifest::new("form", "1.0.0")
                .with_name("Form")
                .with_category("input"),
        }
    }

    pub fn shared() -> Arc<dyn Plugin> {
        Arc::new(Self::new())
    }
}

impl Default for FormPlugin {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Plugin for FormPlugin {
    fn manifest(&self) -> &PluginManifest {
        &self.manifest
    }

    fn validate(&self, step: &Step, context: &Value) -> Validation {
        let email = context
            .get(step.submission_path())
            .and_then(|section| section.get("email"))
            .and_then(Value::as_str);
        match email {
            Some(email) if email.contains('@') => Validation::valid(),
            Some(_) => Validation::invalid("email is malformed"),
            None => Validation::invalid("email is required"),
        }
    }

    async fn execute_step(&self, step: &Step, context: &Value) -> Result<StepOutcome, PluginError> {
        let section = context
            .get(step.submission_path())
            .cloned()
            .unwrap_or(Value::Null);
        Ok(StepOutcome::with_data(section)
            .with_update(format!("{}.verified", step.submission_path()), json!(true)))
    }
}
