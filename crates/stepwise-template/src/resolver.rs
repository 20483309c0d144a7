//! Template resolver using moka
//!
//! Maps a [`TemplateRef`] to a loaded [`Template`] through an injected
//! [`Loader`], caching the outcome for the lifetime of the resolver:
//! - Successes are cached by the full reference
//! - Failures are cached as `None` and never retried
//! - Concurrent first resolutions of one reference share a single load
//!
//! Layouts are additionally pinned per `(root_namespace, workspace_id)`.

use crate::loader::Loader;
use crate::template::Template;
use dashmap::DashMap;
use moka::future::Cache;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use stepwise_model::{Step, TemplateRef, TemplateSettings};

/// Outcome of a resolution: the shared implementation, or `None` when the
/// renderer is unavailable
pub type Resolution = Option<Arc<Template>>;

/// Statistics for cache performance monitoring
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolverStats {
    /// Number of cached references (including negative entries)
    pub entry_count: u64,
    /// Resolutions answered from cache
    pub hits: u64,
    /// Loads performed
    pub loads: u64,
    /// Loads that failed and were negatively cached
    pub failures: u64,
    /// Pinned workspace layouts
    pub pinned_layouts: usize,
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    loads: AtomicU64,
    failures: AtomicU64,
}

/// Layout pin key: `(root_namespace, workspace_id)`
type PinKey = (String, String);

/// Caching template resolver
#[derive(Clone)]
pub struct TemplateResolver {
    loader: Arc<dyn Loader>,
    cache: Cache<TemplateRef, Resolution>,
    layouts: Arc<DashMap<PinKey, Resolution>>,
    counters: Arc<Counters>,
}

impl std::fmt::Debug for TemplateResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateResolver")
            .field("entries", &self.cache.entry_count())
            .field("pinned_layouts", &self.layouts.len())
            .finish()
    }
}

impl TemplateResolver {
    /// Create resolver over a loader
    ///
    /// The cache is unbounded: entries are write-once for the session.
    #[must_use]
    pub fn new(loader: Arc<dyn Loader>) -> Self {
        Self {
            loader,
            cache: Cache::builder().build(),
            layouts: Arc::new(DashMap::new()),
            counters: Arc::new(Counters::default()),
        }
    }

    /// Create resolver with a bounded cache
    ///
    /// Evicted references are loaded again on their next resolution, so a
    /// bound trades the write-once guarantee for memory.
    #[must_use]
    pub fn with_capacity(loader: Arc<dyn Loader>, max_capacity: u64) -> Self {
        Self {
            cache: Cache::builder().max_capacity(max_capacity).build(),
            ..Self::new(loader)
        }
    }

    /// Resolve a reference
    ///
    /// Never fails. The first call for a reference performs the load; every
    /// later call returns the same `Arc` (or `None`) without touching the
    /// loader.
    pub async fn resolve(&self, reference: &TemplateRef) -> Resolution {
        let loader = Arc::clone(&self.loader);
        let counters = Arc::clone(&self.counters);
        let key = reference.clone();

        let entry = self
            .cache
            .entry(reference.clone())
            .or_insert_with(async move {
                counters.loads.fetch_add(1, Ordering::Relaxed);
                metrics::counter!("stepwise_template_loads_total").increment(1);
                match loader.load(&key).await {
                    Ok(template) => {
                        tracing::debug!(reference = %key, "template loaded");
                        Some(Arc::new(template))
                    }
                    Err(err) => {
                        counters.failures.fetch_add(1, Ordering::Relaxed);
                        metrics::counter!("stepwise_template_failures_total").increment(1);
                        tracing::warn!(reference = %key, error = %err, "template resolution failed; caching miss");
                        None
                    }
                }
            })
            .await;

        if !entry.is_fresh() {
            self.counters.hits.fetch_add(1, Ordering::Relaxed);
            metrics::counter!("stepwise_template_hits_total").increment(1);
        }
        entry.into_value()
    }

    /// Resolve by parts
    pub async fn resolve_parts(
        &self,
        namespace: &str,
        category: stepwise_model::TemplateCategory,
        identifier: &str,
    ) -> Resolution {
        self.resolve(&TemplateRef::new(namespace, category, identifier))
            .await
    }

    /// Resolve the template a step renders with
    pub async fn resolve_step(&self, namespace: &str, step: &Step) -> Resolution {
        self.resolve(&TemplateRef::step(namespace, step.tpl_file.clone()))
            .await
    }

    /// Resolve a workspace's layout, pinned per `(root_namespace, workspace_id)`
    ///
    /// Once pinned, later calls return the pinned outcome even if the
    /// workspace's settings changed; call [`TemplateResolver::unpin_layout`]
    /// to re-resolve.
    pub async fn resolve_layout(
        &self,
        root_namespace: &str,
        workspace_id: &str,
        settings: &TemplateSettings,
    ) -> Resolution {
        let pin: PinKey = (root_namespace.to_string(), workspace_id.to_string());
        if let Some(pinned) = self.layouts.get(&pin) {
            return pinned.value().clone();
        }

        let resolution = match settings.layout_ref(root_namespace) {
            Some(reference) => self.resolve(&reference).await,
            None => None,
        };

        let pinned = self.layouts.entry(pin).or_insert(resolution).value().clone();
        tracing::debug!(
            root_namespace,
            workspace = workspace_id,
            resolved = pinned.is_some(),
            "layout pinned"
        );
        pinned
    }

    /// Drop a layout pin (workspace reloaded or deleted)
    pub fn unpin_layout(&self, root_namespace: &str, workspace_id: &str) -> bool {
        self.layouts
            .remove(&(root_namespace.to_string(), workspace_id.to_string()))
            .is_some()
    }

    /// Check whether a reference has been resolved (successfully or not)
    #[inline]
    #[must_use]
    pub fn is_cached(&self, reference: &TemplateRef) -> bool {
        self.cache.contains_key(reference)
    }

    /// Cached outcome of a reference without loading
    pub async fn peek(&self, reference: &TemplateRef) -> Option<Resolution> {
        self.cache.get(reference).await
    }

    /// Flush pending cache maintenance so counts are exact
    pub async fn sync(&self) {
        self.cache.run_pending_tasks().await;
    }

    /// Get resolver statistics
    #[must_use]
    pub fn stats(&self) -> ResolverStats {
        ResolverStats {
            entry_count: self.cache.entry_count(),
            hits: self.counters.hits.load(Ordering::Relaxed),
            loads: self.counters.loads.load(Ordering::Relaxed),
            failures: self.counters.failures.load(Ordering::Relaxed),
            pinned_layouts: self.layouts.len(),
        }
    }
}
