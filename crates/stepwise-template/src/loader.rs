//! Template loaders
//!
//! A [`Loader`] turns a [`TemplateRef`] into a [`Template`]. The resolver
//! calls it at most once per reference per session.
//!
//! - [`StaticLoader`]: compiled registry, every template known up front
//! - [`FsLoader`]: reads `<root>/<namespace>/<category>/<identifier>` as JSON
//! - [`ChainLoader`]: first loader that finds the reference wins

use crate::error::LoadError;
use crate::template::Template;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use stepwise_model::TemplateRef;

/// Capability to load a template implementation by reference
#[async_trait::async_trait]
pub trait Loader: Send + Sync {
    /// Load the implementation bound to `reference`
    async fn load(&self, reference: &TemplateRef) -> Result<Template, LoadError>;
}

/// Compiled registry of templates
#[derive(Debug, Clone, Default)]
pub struct StaticLoader {
    templates: HashMap<TemplateRef, Value>,
}

impl StaticLoader {
    /// Create empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a template document
    #[inline]
    #[must_use]
    pub fn with_template(mut self, reference: TemplateRef, document: Value) -> Self {
        self.insert(reference, document);
        self
    }

    /// Register a template document
    #[inline]
    pub fn insert(&mut self, reference: TemplateRef, document: Value) {
        self.templates.insert(reference, document);
    }

    /// Number of registered templates
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Check if the registry is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

#[async_trait::async_trait]
impl Loader for StaticLoader {
    async fn load(&self, reference: &TemplateRef) -> Result<Template, LoadError> {
        self.templates
            .get(reference)
            .map(|document| Template::new(reference.clone(), document.clone()))
            .ok_or_else(|| LoadError::NotFound(reference.clone()))
    }
}

/// Loads template documents from a directory tree
#[derive(Debug, Clone)]
pub struct FsLoader {
    root: PathBuf,
}

impl FsLoader {
    /// Create loader rooted at `root`
    #[inline]
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File a reference maps to, or `None` if it would leave the root
    #[must_use]
    pub fn path_for(&self, reference: &TemplateRef) -> Option<PathBuf> {
        let relative = Path::new(&reference.namespace)
            .join(reference.category.as_str())
            .join(&reference.identifier);
        let contained = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        contained.then(|| self.root.join(relative))
    }
}

#[async_trait::async_trait]
impl Loader for FsLoader {
    async fn load(&self, reference: &TemplateRef) -> Result<Template, LoadError> {
        let path = self
            .path_for(reference)
            .ok_or_else(|| LoadError::NotFound(reference.clone()))?;
        let text = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| LoadError::io_error(&path, e))?;
        let document = serde_json::from_str(&text).map_err(|source| LoadError::Parse {
            path: path.clone(),
            source,
        })?;
        Ok(Template::new(reference.clone(), document))
    }
}

/// Tries loaders in order; the first one that does not report "not found"
/// decides the outcome
#[derive(Clone, Default)]
pub struct ChainLoader {
    loaders: Vec<Arc<dyn Loader>>,
}

impl ChainLoader {
    /// Create empty chain
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a loader
    #[inline]
    #[must_use]
    pub fn then(mut self, loader: Arc<dyn Loader>) -> Self {
        self.loaders.push(loader);
        self
    }
}

impl std::fmt::Debug for ChainLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainLoader")
            .field("loaders", &self.loaders.len())
            .finish()
    }
}

#[async_trait::async_trait]
impl Loader for ChainLoader {
    async fn load(&self, reference: &TemplateRef) -> Result<Template, LoadError> {
        for loader in &self.loaders {
            match loader.load(reference).await {
                Err(err) if err.is_not_found() => continue,
                outcome => return outcome,
            }
        }
        Err(LoadError::NotFound(reference.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn static_loader_hit_and_miss() {
        let reference = TemplateRef::step("default", "intro.json");
        let loader = StaticLoader::new().with_template(reference.clone(), json!({"title": "Intro"}));

        let template = loader.load(&reference).await.unwrap();
        assert_eq!(template.field("title"), Some(&json!("Intro")));

        let missing = TemplateRef::step("default", "missing.json");
        assert!(matches!(
            loader.load(&missing).await,
            Err(LoadError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn fs_loader_reads_json() {
        let dir = tempfile::tempdir().unwrap();
        let steps = dir.path().join("default").join("steps");
        std::fs::create_dir_all(&steps).unwrap();
        std::fs::write(steps.join("intro.json"), r#"{"title": "Intro"}"#).unwrap();

        let loader = FsLoader::new(dir.path());
        let template = loader
            .load(&TemplateRef::step("default", "intro.json"))
            .await
            .unwrap();
        assert_eq!(template.field("title"), Some(&json!("Intro")));
    }

    #[tokio::test]
    async fn fs_loader_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let layouts = dir.path().join("default").join("layouts");
        std::fs::create_dir_all(&layouts).unwrap();
        std::fs::write(layouts.join("broken.json"), "{not json").unwrap();

        let loader = FsLoader::new(dir.path());
        let result = loader
            .load(&TemplateRef::layout("default", "broken.json"))
            .await;
        assert!(matches!(result, Err(LoadError::Parse { .. })));
    }

    #[test]
    fn fs_loader_refuses_escaping_paths() {
        let loader = FsLoader::new("/tmp/templates");
        assert!(loader
            .path_for(&TemplateRef::step("default", "../../etc/passwd"))
            .is_none());
        assert!(loader
            .path_for(&TemplateRef::step("default", "forms/contact.json"))
            .is_some());
    }

    #[tokio::test]
    async fn chain_loader_falls_through_not_found() {
        let reference = TemplateRef::widget("default", "chat.json");
        let empty: Arc<dyn Loader> = Arc::new(StaticLoader::new());
        let filled: Arc<dyn Loader> = Arc::new(
            StaticLoader::new().with_template(reference.clone(), json!({"kind": "chat"})),
        );

        let chain = ChainLoader::new().then(empty).then(filled);
        assert!(chain.load(&reference).await.is_ok());
        assert!(chain
            .load(&TemplateRef::widget("default", "other.json"))
            .await
            .is_err());
    }
}
