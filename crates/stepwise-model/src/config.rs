//! Configuration file shapes
//!
//! The engine consumes three kinds of JSON documents:
//!
//! ```text
//! <root>/app.json                          AppConfig
//! <root>/workspaces/<slug>.json            WorkspaceConfig
//! <root>/scenarios/<workspace>/<slug>.json ScenarioConfig
//! ```

use crate::error::ModelError;
use crate::scenario::Scenario;
use crate::step::Step;
use crate::workspace::{TemplateSettings, Workspace};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt::{self, Display, Formatter};
use std::path::PathBuf;

/// Application configuration (`app.json`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    /// Application name
    #[serde(default)]
    pub name: String,

    /// Root template namespace
    #[serde(default = "default_tpl_dir")]
    pub tpl_dir: String,

    /// Workspace opened when none is routed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_workspace: Option<String>,

    /// Scenario opened when none is routed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_scenario: Option<String>,
}

fn default_tpl_dir() -> String {
    "default".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            tpl_dir: default_tpl_dir(),
            default_workspace: None,
            default_scenario: None,
        }
    }
}

/// Workspace configuration (`workspaces/<slug>.json`)
///
/// Scenarios are not embedded; they are discovered per workspace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceConfig {
    /// Workspace slug
    #[serde(alias = "id")]
    pub slug: String,

    /// Display name
    #[serde(default)]
    pub name: String,

    /// Template settings
    #[serde(default)]
    pub template_settings: TemplateSettings,

    /// Seed for the context bucket
    #[serde(default)]
    pub initial_context: Map<String, Value>,
}

impl WorkspaceConfig {
    /// Assemble a workspace from this config and its loaded scenarios
    #[must_use]
    pub fn into_workspace(self, scenarios: Vec<Scenario>) -> Workspace {
        let name = if self.name.is_empty() {
            self.slug.clone()
        } else {
            self.name
        };
        Workspace {
            slug: self.slug,
            name,
            scenarios,
            initial_context: self.initial_context,
            template_settings: self.template_settings,
        }
    }
}

/// Scenario configuration (`scenarios/<workspace>/<slug>.json`)
///
/// Nodes are taken as written; [`ScenarioConfig::into_scenario`] validates
/// and sorts them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioConfig {
    /// Scenario slug
    #[serde(alias = "id")]
    pub slug: String,

    /// Display name
    #[serde(default)]
    pub name: String,

    /// Optional description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// System message template
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_message: Option<String>,

    /// Raw nodes in file order
    #[serde(default)]
    pub nodes: Vec<Step>,
}

impl ScenarioConfig {
    /// Build the scenario, validating order and slug uniqueness
    ///
    /// # Errors
    /// - `ModelError::DuplicateOrder` / `ModelError::DuplicateSlug`
    pub fn into_scenario(self) -> Result<Scenario, ModelError> {
        let mut scenario = Scenario::from_nodes(self.slug, self.nodes)?;
        if !self.name.is_empty() {
            scenario.name = self.name;
        }
        scenario.description = self.description;
        scenario.system_message = self.system_message;
        Ok(scenario)
    }
}

/// Kind of configuration document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKind {
    /// `app.json`, no ids
    App,
    /// `workspaces/<ws>.json`, ids = `[ws]`
    Workspace,
    /// `scenarios/<ws>/<scenario>.json`, ids = `[ws, scenario]`
    Scenario,
}

impl ConfigKind {
    /// Number of ids the kind is addressed by
    #[inline]
    #[must_use]
    pub fn arity(self) -> usize {
        match self {
            Self::App => 0,
            Self::Workspace => 1,
            Self::Scenario => 2,
        }
    }

    /// Path of the document relative to the config root
    ///
    /// Returns `None` when the number of ids does not match the kind or an
    /// id would escape its directory.
    #[must_use]
    pub fn relative_path(self, ids: &[&str]) -> Option<PathBuf> {
        if ids.len() != self.arity() || ids.iter().any(|id| !is_safe_id(id)) {
            return None;
        }
        let path = match self {
            Self::App => PathBuf::from("app.json"),
            Self::Workspace => PathBuf::from("workspaces").join(format!("{}.json", ids[0])),
            Self::Scenario => PathBuf::from("scenarios")
                .join(ids[0])
                .join(format!("{}.json", ids[1])),
        };
        Some(path)
    }
}

impl Display for ConfigKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::App => "app",
            Self::Workspace => "workspace",
            Self::Scenario => "scenario",
        })
    }
}

fn is_safe_id(id: &str) -> bool {
    !id.is_empty() && !id.contains(['/', '\\']) && id != "." && id != ".."
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn app_config_defaults() {
        let app: AppConfig = serde_json::from_value(json!({"name": "demo"})).unwrap();
        assert_eq!(app.tpl_dir, "default");
        assert!(app.default_workspace.is_none());
    }

    #[test]
    fn app_config_camel_case() {
        let app: AppConfig = serde_json::from_value(json!({
            "name": "demo",
            "tplDir": "dark",
            "defaultWorkspace": "main",
            "defaultScenario": "intro"
        }))
        .unwrap();
        assert_eq!(app.tpl_dir, "dark");
        assert_eq!(app.default_scenario.as_deref(), Some("intro"));
    }

    #[test]
    fn relative_paths() {
        assert_eq!(
            ConfigKind::App.relative_path(&[]),
            Some(PathBuf::from("app.json"))
        );
        assert_eq!(
            ConfigKind::Workspace.relative_path(&["main"]),
            Some(PathBuf::from("workspaces/main.json"))
        );
        assert_eq!(
            ConfigKind::Scenario.relative_path(&["main", "intro"]),
            Some(PathBuf::from("scenarios/main/intro.json"))
        );
    }

    #[test]
    fn relative_path_rejects_bad_ids() {
        assert!(ConfigKind::Workspace.relative_path(&[]).is_none());
        assert!(ConfigKind::Workspace.relative_path(&[".."]).is_none());
        assert!(ConfigKind::Scenario.relative_path(&["main", "a/b"]).is_none());
    }

    #[test]
    fn scenario_config_sorts_nodes() {
        let config: ScenarioConfig = serde_json::from_value(json!({
            "id": "intro",
            "systemMessage": "be brief",
            "nodes": [
                {"slug": "b", "order": 2, "tplFile": "b.json"},
                {"slug": "a", "order": 1, "tplFile": "a.json"}
            ]
        }))
        .unwrap();
        let scenario = config.into_scenario().unwrap();
        assert_eq!(scenario.name, "intro");
        assert_eq!(scenario.system_message.as_deref(), Some("be brief"));
        assert_eq!(scenario.slugs().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn scenario_config_rejects_duplicate_orders() {
        let config: ScenarioConfig = serde_json::from_value(json!({
            "slug": "intro",
            "nodes": [
                {"slug": "a", "order": 1, "tplFile": "a.json"},
                {"slug": "b", "order": 1, "tplFile": "b.json"}
            ]
        }))
        .unwrap();
        assert!(matches!(
            config.into_scenario(),
            Err(ModelError::DuplicateOrder { order: 1, .. })
        ));
    }

    #[test]
    fn workspace_config_into_workspace() {
        let config: WorkspaceConfig = serde_json::from_value(json!({
            "slug": "main",
            "templateSettings": {"layoutFile": "main.json"}
        }))
        .unwrap();
        let ws = config.into_workspace(vec![Scenario::new("intro")]);
        assert_eq!(ws.name, "main");
        assert_eq!(ws.scenarios.len(), 1);
        assert_eq!(ws.template_settings.layout_file.as_deref(), Some("main.json"));
    }
}
