//! Engine configuration

use serde::{Deserialize, Serialize};
use stepwise_navigation::AdjacencyPolicy;

/// Engine behaviour knobs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// How `next`/`prev` pick neighbours
    pub adjacency: AdjacencyPolicy,
    /// Template cache bound; `None` keeps every resolution for the session
    pub template_cache_capacity: Option<u64>,
    /// Namespace used when `app.json` has no `tplDir`
    pub root_namespace: String,
    /// Land on the first node when entering a scenario
    pub land_on_first_step: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            adjacency: AdjacencyPolicy::OrderAdjacent,
            template_cache_capacity: None,
            root_namespace: "default".to_string(),
            land_on_first_step: true,
        }
    }
}

impl EngineConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With adjacency policy
    #[inline]
    #[must_use]
    pub fn with_adjacency(mut self, adjacency: AdjacencyPolicy) -> Self {
        self.adjacency = adjacency;
        self
    }

    /// With bounded template cache
    #[inline]
    #[must_use]
    pub fn with_template_cache_capacity(mut self, capacity: u64) -> Self {
        self.template_cache_capacity = Some(capacity);
        self
    }

    /// With fallback root namespace
    #[inline]
    #[must_use]
    pub fn with_root_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.root_namespace = namespace.into();
        self
    }

    /// With scenario landing behaviour
    #[inline]
    #[must_use]
    pub fn with_land_on_first_step(mut self, land: bool) -> Self {
        self.land_on_first_step = land;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn partial_config_uses_defaults() {
        let config: EngineConfig =
            serde_json::from_value(json!({"adjacency": "indexAdjacent"})).unwrap();
        assert_eq!(config.adjacency, AdjacencyPolicy::IndexAdjacent);
        assert_eq!(config.root_namespace, "default");
        assert!(config.land_on_first_step);
    }

    #[test]
    fn builder() {
        let config = EngineConfig::new()
            .with_template_cache_capacity(64)
            .with_land_on_first_step(false);
        assert_eq!(config.template_cache_capacity, Some(64));
        assert!(!config.land_on_first_step);
    }
}
