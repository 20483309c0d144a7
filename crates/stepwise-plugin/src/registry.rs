//! Plugin registry
//!
//! Two views over the installed plugins:
//! - install records, kept in install order, survive disable
//! - active plugins, keyed by step type, used for execution
//!
//! Disabling drops the active entry at once; enabling loads a fresh instance
//! from the stored install path through a [`PluginSource`].

use crate::error::PluginError;
use crate::plugin::{Plugin, PluginManifest};
use crate::source::PluginSource;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Persistent record of an installed plugin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallRecord {
    /// Plugin identity
    pub manifest: PluginManifest,
    /// Where the implementation lives; `None` for in-process registrations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install_path: Option<PathBuf>,
    /// Whether the plugin takes part in execution
    pub enabled: bool,
    /// Install time
    pub installed_at: DateTime<Utc>,
}

#[derive(Default)]
struct RegistryState {
    records: IndexMap<String, InstallRecord>,
    active: HashMap<String, Arc<dyn Plugin>>,
}

/// Registry of step-type handlers
#[derive(Default)]
pub struct PluginRegistry {
    state: RwLock<RegistryState>,
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("PluginRegistry")
            .field("installed", &state.records.keys().collect::<Vec<_>>())
            .field("active", &state.active.len())
            .finish()
    }
}

impl PluginRegistry {
    /// Create empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an in-process plugin, enabled, without an install path
    ///
    /// Replaces any plugin registered for the same step type.
    pub fn register(&self, plugin: Arc<dyn Plugin>) {
        self.insert(plugin, None);
    }

    /// Install a plugin loaded from `install_path`, enabled
    pub fn install(&self, plugin: Arc<dyn Plugin>, install_path: impl Into<PathBuf>) {
        self.insert(plugin, Some(install_path.into()));
    }

    fn insert(&self, plugin: Arc<dyn Plugin>, install_path: Option<PathBuf>) {
        let manifest = plugin.manifest().clone();
        let id = manifest.id.clone();
        let mut state = self.state.write();
        state.records.insert(
            id.clone(),
            InstallRecord {
                manifest,
                install_path,
                enabled: true,
                installed_at: Utc::now(),
            },
        );
        state.active.insert(id.clone(), plugin);
        tracing::info!(plugin = %id, "plugin registered");
    }

    /// Remove a plugin and its install record
    pub fn uninstall(&self, id: &str) -> Option<InstallRecord> {
        let mut state = self.state.write();
        state.active.remove(id);
        state.records.shift_remove(id)
    }

    /// Disable a plugin, keeping its install record
    ///
    /// # Errors
    /// - `PluginError::PluginNotInstalled` if no record exists
    pub fn disable(&self, id: &str) -> Result<(), PluginError> {
        let mut state = self.state.write();
        let record = state
            .records
            .get_mut(id)
            .ok_or_else(|| PluginError::PluginNotInstalled { id: id.to_string() })?;
        record.enabled = false;
        state.active.remove(id);
        tracing::info!(plugin = id, "plugin disabled");
        Ok(())
    }

    /// Enable a plugin by loading a fresh instance from its install path
    ///
    /// # Errors
    /// - `PluginError::PluginNotInstalled` if no record exists
    /// - `PluginError::PluginLoadFailed` if the record has no install path or
    ///   the source fails
    pub async fn enable(&self, id: &str, source: &dyn PluginSource) -> Result<(), PluginError> {
        let (manifest, install_path) = {
            let state = self.state.read();
            let record = state
                .records
                .get(id)
                .ok_or_else(|| PluginError::PluginNotInstalled { id: id.to_string() })?;
            (record.manifest.clone(), record.install_path.clone())
        };
        let install_path = install_path.ok_or_else(|| PluginError::PluginLoadFailed {
            id: id.to_string(),
            reason: "no install path recorded".to_string(),
        })?;

        let plugin = match source.load(&manifest, &install_path).await {
            Ok(plugin) => plugin,
            Err(err) => {
                tracing::warn!(plugin = id, error = %err, "plugin load failed");
                return Err(err);
            }
        };

        let mut state = self.state.write();
        let record = state
            .records
            .get_mut(id)
            .ok_or_else(|| PluginError::PluginNotInstalled { id: id.to_string() })?;
        record.enabled = true;
        state.active.insert(id.to_string(), plugin);
        tracing::info!(plugin = id, path = %install_path.display(), "plugin enabled");
        Ok(())
    }

    /// Enabled plugin for a step type
    ///
    /// # Errors
    /// - `PluginError::PluginDisabled` if installed but disabled
    /// - `PluginError::UnknownPluginType` if nothing is installed for it
    pub fn plugin_for(&self, step_type: &str) -> Result<Arc<dyn Plugin>, PluginError> {
        let state = self.state.read();
        if let Some(plugin) = state.active.get(step_type) {
            return Ok(Arc::clone(plugin));
        }
        if state.records.contains_key(step_type) {
            return Err(PluginError::PluginDisabled {
                id: step_type.to_string(),
            });
        }
        Err(PluginError::UnknownPluginType {
            step_type: step_type.to_string(),
        })
    }

    /// Install record of a plugin
    #[must_use]
    pub fn record(&self, id: &str) -> Option<InstallRecord> {
        self.state.read().records.get(id).cloned()
    }

    /// All install records in install order
    #[must_use]
    pub fn records(&self) -> Vec<InstallRecord> {
        self.state.read().records.values().cloned().collect()
    }

    /// Check if a plugin is installed and enabled
    #[must_use]
    pub fn is_enabled(&self, id: &str) -> bool {
        self.state.read().active.contains_key(id)
    }

    /// Number of installed plugins
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.read().records.len()
    }

    /// Check if nothing is installed
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.read().records.is_empty()
    }
}
