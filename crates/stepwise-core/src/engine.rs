//! The stepwise engine
//!
//! Owns every registry and cache of one session: loaded workspaces, the
//! context store, the template resolver, the navigator and the plugin
//! protocol. Several engines can live in one process.
//!
//! Control flow of a step:
//!
//! ```text
//! navigator -> active triple -> resolver (layout, step template)
//!           -> context (interpolation) -> render_view
//! on_submit -> context write -> plugin protocol -> context updates -> next
//! ```

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::source::ConfigSource;
use crate::store::{ItemStore, CONTEXT_COLLECTION};
use crate::view::{RenderView, SubmitOutcome};
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use std::sync::Arc;
use stepwise_context::{bucket_to_value, ContextStore};
use stepwise_model::{
    AppConfig, ConfigKind, ModelError, Scenario, ScenarioConfig, Step, TemplateRef, Workspace,
    WorkspaceConfig,
};
use stepwise_navigation::{ActiveTriple, NavigationEvent, Navigator};
use stepwise_plugin::{Plugin, StepExecutor, StepProtocol};
use stepwise_template::{Loader, Slot, TemplateResolver};

/// Workflow navigation and template resolution engine
pub struct Engine {
    config: EngineConfig,
    source: Arc<dyn ConfigSource>,
    items: Option<Arc<dyn ItemStore>>,
    app: RwLock<Option<AppConfig>>,
    workspaces: DashMap<String, Arc<Workspace>>,
    context: ContextStore,
    resolver: TemplateResolver,
    navigator: Mutex<Navigator>,
    protocol: StepProtocol,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("workspaces", &self.workspaces.len())
            .field("triple", &self.current_triple())
            .finish()
    }
}

impl Engine {
    /// Create engine over a config source and a template loader
    #[must_use]
    pub fn new(config: EngineConfig, source: Arc<dyn ConfigSource>, loader: Arc<dyn Loader>) -> Self {
        let resolver = match config.template_cache_capacity {
            Some(capacity) => TemplateResolver::with_capacity(loader, capacity),
            None => TemplateResolver::new(loader),
        };
        let navigator = Mutex::new(navigator_for(&config));
        Self {
            config,
            source,
            items: None,
            app: RwLock::new(None),
            workspaces: DashMap::new(),
            context: ContextStore::new(),
            resolver,
            navigator,
            protocol: StepProtocol::new(),
        }
    }

    /// With item store for context persistence
    #[inline]
    #[must_use]
    pub fn with_item_store(mut self, items: Arc<dyn ItemStore>) -> Self {
        self.items = Some(items);
        self
    }

    /// Engine configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Context store
    #[inline]
    #[must_use]
    pub fn context(&self) -> &ContextStore {
        &self.context
    }

    /// Template resolver
    #[inline]
    #[must_use]
    pub fn resolver(&self) -> &TemplateResolver {
        &self.resolver
    }

    /// Plugin protocol
    #[inline]
    #[must_use]
    pub fn protocol(&self) -> &StepProtocol {
        &self.protocol
    }

    /// Register an in-process plugin
    pub fn register_plugin(&self, plugin: Arc<dyn Plugin>) {
        self.protocol.register_plugin(plugin);
    }

    /// Register an executor for a step id
    pub fn register_step_executor(&self, step_id: &str, executor: Arc<dyn StepExecutor>) {
        self.protocol.register_step_executor(step_id, executor);
    }

    // ------------------------------------------------------------------
    // Configuration
    // ------------------------------------------------------------------

    /// Load `app.json`
    ///
    /// # Errors
    /// - `EngineError::ConfigNotFound` / `EngineError::ConfigParse`
    pub async fn load_app(&self) -> Result<AppConfig> {
        let app: AppConfig = self.load_document(ConfigKind::App, &[]).await?;
        tracing::info!(app = %app.name, tpl_dir = %app.tpl_dir, "application config loaded");
        *self.app.write() = Some(app.clone());
        Ok(app)
    }

    /// Loaded application config
    #[must_use]
    pub fn app(&self) -> Option<AppConfig> {
        self.app.read().clone()
    }

    /// Root template namespace: `tplDir` of the app, else the configured fallback
    #[must_use]
    pub fn root_namespace(&self) -> String {
        self.app
            .read()
            .as_ref()
            .map(|app| app.tpl_dir.clone())
            .unwrap_or_else(|| self.config.root_namespace.clone())
    }

    /// Load a workspace with all its scenarios
    ///
    /// Scenario slugs are discovered in sorted order and every scenario's
    /// nodes are sorted by `order`. The context bucket is seeded from
    /// `initialContext` on the first load only.
    ///
    /// # Errors
    /// - `EngineError::ConfigNotFound` if the workspace document is missing
    /// - `EngineError::ConfigParse` for malformed documents
    /// - `EngineError::Model` for duplicate orders or slugs
    pub async fn load_workspace(&self, slug: &str) -> Result<Arc<Workspace>> {
        let mut config: WorkspaceConfig = self.load_document(ConfigKind::Workspace, &[slug]).await?;
        if config.slug != slug {
            tracing::warn!(file = slug, declared = %config.slug, "workspace slug differs from file name; using file name");
            config.slug = slug.to_string();
        }

        let mut scenarios = Vec::new();
        for scenario_slug in self.source.discover_scenario_slugs(slug).await? {
            let ids = [slug, scenario_slug.as_str()];
            let Some(raw) = self.source.load_config(ConfigKind::Scenario, &ids).await? else {
                tracing::warn!(workspace = slug, scenario = %scenario_slug, "discovered scenario vanished");
                continue;
            };
            let scenario: ScenarioConfig = serde_json::from_value(raw)
                .map_err(|e| EngineError::config_parse(ConfigKind::Scenario, &ids, e))?;
            scenarios.push(scenario.into_scenario()?);
        }

        let workspace = Arc::new(config.into_workspace(scenarios));
        let seeded = self.context.seed(slug, &workspace.initial_context);
        self.workspaces.insert(slug.to_string(), Arc::clone(&workspace));
        tracing::info!(
            workspace = slug,
            scenarios = workspace.scenarios.len(),
            seeded,
            "workspace loaded"
        );
        Ok(workspace)
    }

    /// Loaded workspace by slug
    #[must_use]
    pub fn workspace(&self, slug: &str) -> Option<Arc<Workspace>> {
        self.workspaces.get(slug).map(|entry| Arc::clone(entry.value()))
    }

    /// Slugs of loaded workspaces, sorted
    #[must_use]
    pub fn workspace_slugs(&self) -> Vec<String> {
        let mut slugs: Vec<String> = self.workspaces.iter().map(|e| e.key().clone()).collect();
        slugs.sort();
        slugs
    }

    /// Slugs of every workspace the config source knows, loaded or not
    ///
    /// # Errors
    /// - `EngineError::Io` if the source cannot be listed
    pub async fn discover_workspaces(&self) -> Result<Vec<String>> {
        self.source.discover_workspace_slugs().await
    }

    /// Delete a loaded workspace with its context bucket and layout pin
    pub fn delete_workspace(&self, slug: &str) -> bool {
        let removed = self.workspaces.remove(slug).is_some();
        self.context.remove_bucket(slug);
        self.resolver.unpin_layout(&self.root_namespace(), slug);

        let mut navigator = self.navigator.lock();
        if navigator.current().workspace_id() == Some(slug) {
            *navigator = navigator_for(&self.config);
        }
        if removed {
            tracing::info!(workspace = slug, "workspace deleted");
        }
        removed
    }

    async fn ensure_workspace(&self, slug: &str) -> Result<Arc<Workspace>> {
        match self.workspace(slug) {
            Some(workspace) => Ok(workspace),
            None => self.load_workspace(slug).await,
        }
    }

    async fn load_document<T: serde::de::DeserializeOwned>(
        &self,
        kind: ConfigKind,
        ids: &[&str],
    ) -> Result<T> {
        let raw = self
            .source
            .load_config(kind, ids)
            .await?
            .ok_or_else(|| EngineError::config_not_found(kind, ids))?;
        serde_json::from_value(raw).map_err(|e| EngineError::config_parse(kind, ids, e))
    }

    // ------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------

    /// Load the app and open its default workspace and scenario
    ///
    /// # Errors
    /// - `EngineError::NoWorkspace` if the app names no default workspace
    /// - Everything [`Engine::load_app`] and [`Engine::load_workspace`] return
    pub async fn start(&self) -> Result<ActiveTriple> {
        let app = self.load_app().await?;
        let workspace = app.default_workspace.ok_or(EngineError::NoWorkspace)?;
        self.go_workspace(&workspace).await?;
        if let Some(scenario) = app.default_scenario {
            self.go_scenario(&scenario)?;
        }
        Ok(self.current_triple())
    }

    /// Current triple
    #[must_use]
    pub fn current_triple(&self) -> ActiveTriple {
        self.navigator.lock().current().clone()
    }

    /// Current workspace, if loaded
    #[must_use]
    pub fn current_workspace(&self) -> Option<Arc<Workspace>> {
        let slug = self.navigator.lock().current().workspace.clone()?;
        self.workspace(&slug)
    }

    /// Current scenario, if it exists
    #[must_use]
    pub fn current_scenario(&self) -> Option<Scenario> {
        let workspace = self.current_workspace()?;
        let triple = self.current_triple();
        workspace.scenario(triple.scenario_id()?).cloned()
    }

    /// Current step, if it exists
    #[must_use]
    pub fn current_step(&self) -> Option<Step> {
        let workspace = self.current_workspace()?;
        let triple = self.current_triple();
        workspace
            .scenario(triple.scenario_id()?)?
            .node(triple.step_slug()?)
            .cloned()
    }

    /// Open a workspace, loading it on first use, and select its context
    ///
    /// # Errors
    /// Everything [`Engine::load_workspace`] returns
    pub async fn go_workspace(&self, slug: &str) -> Result<Option<NavigationEvent>> {
        self.ensure_workspace(slug).await?;
        self.context.select(slug);
        Ok(self.navigator.lock().go_workspace(slug))
    }

    /// Open a scenario of the current workspace
    ///
    /// # Errors
    /// - `EngineError::NoWorkspace` if no workspace is open
    pub fn go_scenario(&self, slug: &str) -> Result<Option<NavigationEvent>> {
        let workspace = self.current_workspace().ok_or(EngineError::NoWorkspace)?;
        Ok(self.navigator.lock().go_scenario(&workspace, slug))
    }

    /// Jump to a step without checking that it exists
    pub fn go_to(&self, scenario: &str, step: &str) -> Option<NavigationEvent> {
        self.navigator.lock().go_step(scenario, step)
    }

    /// Advance to the following step; no-op at the end
    pub fn next(&self) -> Option<NavigationEvent> {
        let workspace = self.current_workspace()?;
        self.navigator.lock().next(&workspace)
    }

    /// Go back to the preceding step; no-op at the start
    pub fn prev(&self) -> Option<NavigationEvent> {
        let workspace = self.current_workspace()?;
        self.navigator.lock().prev(&workspace)
    }

    /// Check if [`Engine::next`] would move
    #[must_use]
    pub fn can_next(&self) -> bool {
        self.current_workspace()
            .is_some_and(|workspace| self.navigator.lock().can_next(&workspace))
    }

    /// Check if [`Engine::prev`] would move
    #[must_use]
    pub fn can_prev(&self) -> bool {
        self.current_workspace()
            .is_some_and(|workspace| self.navigator.lock().can_prev(&workspace))
    }

    // ------------------------------------------------------------------
    // Editing
    // ------------------------------------------------------------------

    /// Edit a scenario of the current workspace in place
    ///
    /// The closure runs on a private copy that replaces the stored workspace
    /// only when it succeeds.
    ///
    /// # Errors
    /// - `EngineError::NoWorkspace` if no workspace is open
    /// - `EngineError::Model` if the scenario is unknown or the edit fails
    pub fn update_scenario<T, F>(&self, scenario_slug: &str, edit: F) -> Result<T>
    where
        F: FnOnce(&mut Scenario) -> std::result::Result<T, ModelError>,
    {
        let workspace_slug = self
            .current_triple()
            .workspace
            .ok_or(EngineError::NoWorkspace)?;

        // Edit a copy without holding the map guard so `edit` may call back
        // into the engine
        let mut scenario = self
            .workspace(&workspace_slug)
            .ok_or(EngineError::NoWorkspace)?
            .scenario(scenario_slug)
            .cloned()
            .ok_or_else(|| ModelError::UnknownScenario {
                workspace: workspace_slug.clone(),
                scenario: scenario_slug.to_string(),
            })?;
        let output = edit(&mut scenario)?;
        scenario.validate()?;
        scenario.sort();

        let mut entry = self
            .workspaces
            .get_mut(&workspace_slug)
            .ok_or(EngineError::NoWorkspace)?;
        let workspace = Arc::make_mut(entry.value_mut());
        match workspace.scenario_mut(scenario_slug) {
            Some(slot) => *slot = scenario,
            None => {
                return Err(ModelError::UnknownScenario {
                    workspace: workspace_slug,
                    scenario: scenario_slug.to_string(),
                }
                .into())
            }
        }
        tracing::debug!(workspace = %workspace_slug, scenario = scenario_slug, "scenario edited");
        Ok(output)
    }

    /// Replace a step wholesale, keeping its slug
    ///
    /// # Errors
    /// See [`Engine::update_scenario`] and [`Scenario::replace_node`]
    pub fn replace_step(&self, scenario_slug: &str, step: Step) -> Result<Step> {
        let slug = step.slug.clone();
        self.update_scenario(scenario_slug, move |scenario| scenario.replace_node(&slug, step))
    }

    // ------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------

    /// Resolve the current workspace's layout (pinned per workspace)
    pub async fn resolve_layout(&self) -> Option<Slot> {
        let workspace = self.current_workspace()?;
        let root = self.root_namespace();
        let reference = workspace.template_settings.layout_ref(&root)?;
        let resolution = self
            .resolver
            .resolve_layout(&root, &workspace.slug, &workspace.template_settings)
            .await;
        Some(Slot::from_resolution(reference, resolution))
    }

    /// Resolve the current step's template
    pub async fn resolve_step(&self) -> Option<Slot> {
        let workspace = self.current_workspace()?;
        let step = self.current_step()?;
        let root = self.root_namespace();
        let namespace = workspace.template_settings.namespace(&root);
        let reference = TemplateRef::step(namespace, step.tpl_file.clone());
        let resolution = self.resolver.resolve(&reference).await;
        Some(Slot::from_resolution(reference, resolution))
    }

    /// Resolve the current workspace's widgets
    pub async fn resolve_widgets(&self) -> Vec<Slot> {
        let Some(workspace) = self.current_workspace() else {
            return Vec::new();
        };
        let root = self.root_namespace();
        let mut slots = Vec::new();
        for reference in workspace.template_settings.widget_refs(&root) {
            let resolution = self.resolver.resolve(&reference).await;
            slots.push(Slot::from_resolution(reference, resolution));
        }
        slots
    }

    /// Everything the renderer needs for the active triple
    ///
    /// # Errors
    /// - `EngineError::NoWorkspace` if no workspace is open
    pub async fn render_view(&self) -> Result<RenderView> {
        if self.current_workspace().is_none() {
            return Err(EngineError::NoWorkspace);
        }
        let triple = self.current_triple();
        let step = self.current_step();
        let scenario = self.current_scenario();

        let layout = self.resolve_layout().await;
        let widgets = self.resolve_widgets().await;
        let content = self.resolve_step().await;
        let rendered = content
            .as_ref()
            .filter(|slot| slot.is_ready())
            .map(|slot| slot.render_with(|text| self.context.interpolate(text)));

        let interpolate = |text: &Option<String>| {
            text.as_deref().map(|text| self.context.interpolate(text))
        };
        Ok(RenderView {
            system_message: scenario.as_ref().and_then(|s| interpolate(&s.system_message)),
            assistant_message: step.as_ref().and_then(|s| interpolate(&s.assistant_message)),
            initial_user_message: step
                .as_ref()
                .and_then(|s| interpolate(&s.initial_user_message)),
            can_next: self.can_next(),
            can_prev: self.can_prev(),
            triple,
            step,
            layout,
            widgets,
            content,
            rendered,
        })
    }

    // ------------------------------------------------------------------
    // Submission
    // ------------------------------------------------------------------

    /// Submit data for the current step
    ///
    /// Stores `data` at the step's context path (or under its slug), runs the
    /// step's plugin or executor when it has one, applies the returned
    /// context updates and advances. Nothing after the context write happens
    /// when execution fails.
    ///
    /// # Errors
    /// - `EngineError::NoStep` if no existing step is selected
    /// - `EngineError::Plugin` if validation or execution fails
    pub async fn on_submit(&self, data: Value) -> Result<SubmitOutcome> {
        let step = self.current_step().ok_or(EngineError::NoStep)?;
        self.context.set_at(step.submission_path(), data);

        let mut result = None;
        let mut applied_updates = 0;
        if step.step_type.is_some() || self.protocol.has_executor(&step.slug) {
            let context = self.context.to_value();
            let outcome = self.protocol.run_step(&step, &context).await?;
            applied_updates = self.context.apply_updates(&outcome.context_updates);
            result = Some(outcome.data);
        }

        let event = self.next();
        tracing::info!(
            step = %step.slug,
            executed = result.is_some(),
            applied_updates,
            advanced = event.is_some(),
            "step submitted"
        );
        Ok(SubmitOutcome {
            step: step.slug,
            result,
            applied_updates,
            event,
        })
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    fn item_store(&self) -> Result<&Arc<dyn ItemStore>> {
        self.items
            .as_ref()
            .ok_or_else(|| EngineError::Store("no item store configured".to_string()))
    }

    /// Save a workspace's context bucket through the item store
    ///
    /// # Errors
    /// - `EngineError::NoWorkspace` if the workspace was never loaded
    /// - `EngineError::Store` if no store is configured or the write fails
    pub async fn persist_context(&self, workspace: &str) -> Result<()> {
        let items = self.item_store()?;
        if !self.context.has_bucket(workspace) {
            return Err(EngineError::NoWorkspace);
        }
        let bucket = bucket_to_value(&self.context.snapshot_of(workspace));
        items.save_item(CONTEXT_COLLECTION, workspace, bucket).await?;
        tracing::debug!(workspace, "context persisted");
        Ok(())
    }

    /// Replace a workspace's context bucket with its stored copy
    ///
    /// Returns `false` when nothing was stored.
    ///
    /// # Errors
    /// - `EngineError::NoWorkspace` if the workspace was never loaded
    /// - `EngineError::Store` if no store is configured, the read fails or
    ///   the stored item is not an object
    pub async fn restore_context(&self, workspace: &str) -> Result<bool> {
        let items = self.item_store()?;
        if !self.context.has_bucket(workspace) {
            return Err(EngineError::NoWorkspace);
        }
        match items.get_item(CONTEXT_COLLECTION, workspace).await? {
            Some(Value::Object(values)) => {
                // deleted while the read was in flight
                if !self.context.replace_bucket(workspace, &values) {
                    return Err(EngineError::NoWorkspace);
                }
                tracing::debug!(workspace, keys = values.len(), "context restored");
                Ok(true)
            }
            Some(_) => Err(EngineError::Store(format!(
                "stored context of {workspace} is not an object"
            ))),
            None => Ok(false),
        }
    }
}

fn navigator_for(config: &EngineConfig) -> Navigator {
    Navigator::new()
        .with_policy(config.adjacency)
        .with_land_on_first(config.land_on_first_step)
}
