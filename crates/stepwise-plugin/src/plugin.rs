//! Plugin trait and manifest

use crate::error::PluginError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use stepwise_model::Step;

/// Identity of a plugin
///
/// The `id` is also the step `type` the plugin handles.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PluginManifest {
    /// Plugin id and handled step type
    pub id: String,
    /// Display name
    pub name: String,
    /// Plugin version
    pub version: String,
    /// Free-form category (e.g. "form", "assistant")
    #[serde(default)]
    pub category: String,
}

impl PluginManifest {
    /// Create manifest
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>, version: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            version: version.into(),
            category: String::new(),
        }
    }

    /// With display name
    #[inline]
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// With category
    #[inline]
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }
}

/// Result of validating a step against its plugin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validation {
    /// Whether the step may execute
    pub valid: bool,
    /// Reason when invalid
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Validation {
    /// Valid step
    #[inline]
    #[must_use]
    pub fn valid() -> Self {
        Self {
            valid: true,
            error: None,
        }
    }

    /// Invalid step with a reason
    #[inline]
    #[must_use]
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self {
            valid: false,
            error: Some(reason.into()),
        }
    }
}

/// Product of a successful step execution
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepOutcome {
    /// Step result
    #[serde(default)]
    pub data: Value,
    /// Context writes, keyed by top-level key or dotted path
    #[serde(default)]
    pub context_updates: Map<String, Value>,
}

impl StepOutcome {
    /// Outcome carrying only data
    #[inline]
    #[must_use]
    pub fn with_data(data: Value) -> Self {
        Self {
            data,
            context_updates: Map::new(),
        }
    }

    /// Add a context update
    #[inline]
    #[must_use]
    pub fn with_update(mut self, path: impl Into<String>, value: Value) -> Self {
        self.context_updates.insert(path.into(), value);
        self
    }
}

/// A step-type handler
#[async_trait::async_trait]
pub trait Plugin: Send + Sync {
    /// Plugin identity
    fn manifest(&self) -> &PluginManifest;

    /// Check that `step` can run in `context`
    fn validate(&self, step: &Step, context: &Value) -> Validation;

    /// Execute the step
    ///
    /// Plugins without their own executor keep the default, which reports
    /// [`PluginError::ExecutorMissing`].
    async fn execute_step(&self, step: &Step, context: &Value) -> Result<StepOutcome, PluginError> {
        let _ = context;
        Err(PluginError::ExecutorMissing {
            step: step.slug.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn outcome_deserializes_camel_case() {
        let outcome: StepOutcome = serde_json::from_value(json!({
            "data": {"ok": true},
            "contextUpdates": {"profile.email": "a@b.c"}
        }))
        .unwrap();
        assert_eq!(outcome.context_updates.len(), 1);
        assert_eq!(outcome.data["ok"], json!(true));
    }

    #[test]
    fn validation_constructors() {
        assert!(Validation::valid().valid);
        let invalid = Validation::invalid("missing email");
        assert!(!invalid.valid);
        assert_eq!(invalid.error.as_deref(), Some("missing email"));
    }
}
