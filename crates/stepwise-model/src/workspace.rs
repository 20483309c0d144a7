//! Workspaces
//!
//! A [`Workspace`] owns its scenarios (no sharing between workspaces), the
//! seed data for its context bucket and its template settings.

use crate::scenario::Scenario;
use crate::template_ref::TemplateRef;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Template settings of a workspace
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateSettings {
    /// Namespace override; the application `tplDir` is used when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,

    /// Layout identifier in the `layouts` category
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout_file: Option<String>,

    /// Widget identifiers in the `widgets` category
    #[serde(default)]
    pub widgets: Vec<String>,
}

impl TemplateSettings {
    /// Namespace templates resolve in, given the application default
    #[inline]
    #[must_use]
    pub fn namespace<'a>(&'a self, root_namespace: &'a str) -> &'a str {
        self.theme.as_deref().unwrap_or(root_namespace)
    }

    /// Layout reference, if a layout is configured
    #[must_use]
    pub fn layout_ref(&self, root_namespace: &str) -> Option<TemplateRef> {
        self.layout_file
            .as_ref()
            .map(|file| TemplateRef::layout(self.namespace(root_namespace), file.clone()))
    }

    /// Widget references in configuration order
    #[must_use]
    pub fn widget_refs(&self, root_namespace: &str) -> Vec<TemplateRef> {
        self.widgets
            .iter()
            .map(|file| TemplateRef::widget(self.namespace(root_namespace), file.clone()))
            .collect()
    }
}

/// Top-level container owning scenarios and one context bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    /// Stable routing key
    #[serde(alias = "id")]
    pub slug: String,

    /// Display name
    #[serde(default)]
    pub name: String,

    /// Owned scenarios
    #[serde(default)]
    pub scenarios: Vec<Scenario>,

    /// Seed for the context bucket
    #[serde(default)]
    pub initial_context: Map<String, Value>,

    /// Template settings
    #[serde(default)]
    pub template_settings: TemplateSettings,
}

impl Workspace {
    /// Create empty workspace
    #[inline]
    #[must_use]
    pub fn new(slug: impl Into<String>) -> Self {
        let slug = slug.into();
        Self {
            name: slug.clone(),
            slug,
            scenarios: Vec::new(),
            initial_context: Map::new(),
            template_settings: TemplateSettings::default(),
        }
    }

    /// With scenario
    #[inline]
    #[must_use]
    pub fn with_scenario(mut self, scenario: Scenario) -> Self {
        self.scenarios.push(scenario);
        self
    }

    /// With initial context
    #[inline]
    #[must_use]
    pub fn with_initial_context(mut self, context: Map<String, Value>) -> Self {
        self.initial_context = context;
        self
    }

    /// With template settings
    #[inline]
    #[must_use]
    pub fn with_template_settings(mut self, settings: TemplateSettings) -> Self {
        self.template_settings = settings;
        self
    }

    /// Look up a scenario by slug
    #[inline]
    #[must_use]
    pub fn scenario(&self, slug: &str) -> Option<&Scenario> {
        self.scenarios.iter().find(|s| s.slug == slug)
    }

    /// Look up a scenario by slug, mutably
    #[inline]
    pub fn scenario_mut(&mut self, slug: &str) -> Option<&mut Scenario> {
        self.scenarios.iter_mut().find(|s| s.slug == slug)
    }

    /// Scenario slugs in declaration order
    pub fn scenario_slugs(&self) -> impl Iterator<Item = &str> {
        self.scenarios.iter().map(|s| s.slug.as_str())
    }
}
