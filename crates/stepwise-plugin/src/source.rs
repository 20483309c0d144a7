//! Loading plugin implementations from install paths

use crate::error::PluginError;
use crate::plugin::{Plugin, PluginManifest};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Produces a fresh plugin instance from an install path
#[async_trait::async_trait]
pub trait PluginSource: Send + Sync {
    /// Load the plugin described by `manifest` from `install_path`
    async fn load(
        &self,
        manifest: &PluginManifest,
        install_path: &Path,
    ) -> Result<Arc<dyn Plugin>, PluginError>;
}

type Factory = Arc<dyn Fn() -> Arc<dyn Plugin> + Send + Sync>;

/// In-process source: install paths map to factories
#[derive(Clone, Default)]
pub struct StaticPluginSource {
    factories: HashMap<PathBuf, Factory>,
}

impl StaticPluginSource {
    /// Create empty source
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory for an install path
    #[must_use]
    pub fn with_factory<F>(mut self, install_path: impl Into<PathBuf>, factory: F) -> Self
    where
        F: Fn() -> Arc<dyn Plugin> + Send + Sync + 'static,
    {
        self.factories.insert(install_path.into(), Arc::new(factory));
        self
    }
}

impl std::fmt::Debug for StaticPluginSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticPluginSource")
            .field("paths", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[async_trait::async_trait]
impl PluginSource for StaticPluginSource {
    async fn load(
        &self,
        manifest: &PluginManifest,
        install_path: &Path,
    ) -> Result<Arc<dyn Plugin>, PluginError> {
        let factory = self
            .factories
            .get(install_path)
            .ok_or_else(|| PluginError::PluginLoadFailed {
                id: manifest.id.clone(),
                reason: format!("nothing installed at {}", install_path.display()),
            })?;
        let plugin = factory();
        if plugin.manifest().id != manifest.id {
            return Err(PluginError::PluginLoadFailed {
                id: manifest.id.clone(),
                reason: format!(
                    "{} provides plugin {}",
                    install_path.display(),
                    plugin.manifest().id
                ),
            });
        }
        Ok(plugin)
    }
}
