//! Config sources
//!
//! The engine needs three capabilities from wherever configuration lives:
//! load one document by kind and ids, list the workspaces and list a
//! workspace's scenarios.

use crate::error::{EngineError, Result};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use stepwise_model::ConfigKind;

/// Where config documents come from
#[async_trait::async_trait]
pub trait ConfigSource: Send + Sync {
    /// Load a document; `Ok(None)` when it does not exist
    async fn load_config(&self, kind: ConfigKind, ids: &[&str]) -> Result<Option<Value>>;

    /// Slugs of the configured workspaces, sorted
    async fn discover_workspace_slugs(&self) -> Result<Vec<String>>;

    /// Slugs of the scenarios of a workspace, sorted
    async fn discover_scenario_slugs(&self, workspace: &str) -> Result<Vec<String>>;
}

/// Directory holding the documents of `kind` for the given leading ids
fn document_dir(kind: ConfigKind, leading: &[&str]) -> Option<PathBuf> {
    let mut ids = leading.to_vec();
    ids.push("_");
    kind.relative_path(&ids)?.parent().map(Path::to_path_buf)
}

/// Reads config documents from a directory tree
#[derive(Debug, Clone)]
pub struct FsConfigSource {
    root: PathBuf,
}

impl FsConfigSource {
    /// Create source rooted at `root`
    #[inline]
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Config root
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait::async_trait]
impl ConfigSource for FsConfigSource {
    async fn load_config(&self, kind: ConfigKind, ids: &[&str]) -> Result<Option<Value>> {
        let Some(relative) = kind.relative_path(ids) else {
            tracing::warn!(%kind, ?ids, "config ids do not address a document");
            return Ok(None);
        };
        let path = self.root.join(relative);
        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(EngineError::io_error(path, err)),
        };
        serde_json::from_str(&text)
            .map(Some)
            .map_err(|source| EngineError::config_parse(kind, ids, source))
    }

    async fn discover_workspace_slugs(&self) -> Result<Vec<String>> {
        match document_dir(ConfigKind::Workspace, &[]) {
            Some(dir) => json_stems(&self.root.join(dir)).await,
            None => Ok(Vec::new()),
        }
    }

    async fn discover_scenario_slugs(&self, workspace: &str) -> Result<Vec<String>> {
        match document_dir(ConfigKind::Scenario, &[workspace]) {
            Some(dir) => json_stems(&self.root.join(dir)).await,
            None => Ok(Vec::new()),
        }
    }
}

/// Sorted stems of the `.json` files in `dir`; empty when it does not exist
async fn json_stems(dir: &Path) -> Result<Vec<String>> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(EngineError::io_error(dir, err)),
    };

    let mut slugs = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| EngineError::io_error(dir, e))?
    {
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
            slugs.push(stem.to_string());
        }
    }
    slugs.sort();
    Ok(slugs)
}

/// In-memory config documents for tests and embedding
#[derive(Debug, Default)]
pub struct MemoryConfigSource {
    documents: RwLock<BTreeMap<PathBuf, Value>>,
}

impl MemoryConfigSource {
    /// Create empty source
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a document; ignored when `ids` do not address one
    pub fn insert(&self, kind: ConfigKind, ids: &[&str], document: Value) -> bool {
        match kind.relative_path(ids) {
            Some(path) => {
                self.documents.write().insert(path, document);
                true
            }
            None => false,
        }
    }

    /// With a document
    #[must_use]
    pub fn with_document(self, kind: ConfigKind, ids: &[&str], document: Value) -> Self {
        self.insert(kind, ids, document);
        self
    }

    /// Remove a document
    pub fn remove(&self, kind: ConfigKind, ids: &[&str]) -> Option<Value> {
        let path = kind.relative_path(ids)?;
        self.documents.write().remove(&path)
    }
}

#[async_trait::async_trait]
impl ConfigSource for MemoryConfigSource {
    async fn load_config(&self, kind: ConfigKind, ids: &[&str]) -> Result<Option<Value>> {
        Ok(kind
            .relative_path(ids)
            .and_then(|path| self.documents.read().get(&path).cloned()))
    }

    async fn discover_workspace_slugs(&self) -> Result<Vec<String>> {
        Ok(document_dir(ConfigKind::Workspace, &[])
            .map(|dir| self.stems_in(&dir))
            .unwrap_or_default())
    }

    async fn discover_scenario_slugs(&self, workspace: &str) -> Result<Vec<String>> {
        Ok(document_dir(ConfigKind::Scenario, &[workspace])
            .map(|dir| self.stems_in(&dir))
            .unwrap_or_default())
    }
}

impl MemoryConfigSource {
    // BTreeMap iteration is already sorted by path
    fn stems_in(&self, dir: &Path) -> Vec<String> {
        self.documents
            .read()
            .keys()
            .filter(|path| path.parent() == Some(dir))
            .filter_map(|path| path.file_stem().and_then(|s| s.to_str()).map(str::to_string))
            .collect()
    }
}
