//! Steps (scenario nodes)
//!
//! A [`Step`] is one unit of a scenario. `slug` is the stable routing key and
//! is never renamed; `order` drives navigation; `tpl_file` names the template
//! the step renders with.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One node of a scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    /// Stable routing key
    #[serde(alias = "id")]
    pub slug: String,

    /// Human-readable label
    #[serde(default)]
    pub label: String,

    /// Navigation position within the scenario
    pub order: i64,

    /// Logical template identifier, resolved in the `steps` category
    #[serde(alias = "templateId", default)]
    pub tpl_file: String,

    /// Plugin type that executes this step, if any
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub step_type: Option<String>,

    /// Free-form attributes handed to the template
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attrs: Option<Map<String, Value>>,

    /// Message template shown by the assistant when the step is entered
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assistant_message: Option<String>,

    /// Dotted context path the step's submission is stored under
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_path: Option<String>,

    /// Message template prefilled as the user's input
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_user_message: Option<String>,
}

impl Step {
    /// Create a step with the required fields
    #[inline]
    #[must_use]
    pub fn new(slug: impl Into<String>, order: i64, tpl_file: impl Into<String>) -> Self {
        let slug = slug.into();
        Self {
            label: slug.clone(),
            slug,
            order,
            tpl_file: tpl_file.into(),
            step_type: None,
            attrs: None,
            assistant_message: None,
            context_path: None,
            initial_user_message: None,
        }
    }

    /// With label
    #[inline]
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// With plugin type
    #[inline]
    #[must_use]
    pub fn with_type(mut self, step_type: impl Into<String>) -> Self {
        self.step_type = Some(step_type.into());
        self
    }

    /// With context path
    #[inline]
    #[must_use]
    pub fn with_context_path(mut self, path: impl Into<String>) -> Self {
        self.context_path = Some(path.into());
        self
    }

    /// With assistant message template
    #[inline]
    #[must_use]
    pub fn with_assistant_message(mut self, message: impl Into<String>) -> Self {
        self.assistant_message = Some(message.into());
        self
    }

    /// With initial user message template
    #[inline]
    #[must_use]
    pub fn with_initial_user_message(mut self, message: impl Into<String>) -> Self {
        self.initial_user_message = Some(message.into());
        self
    }

    /// With a single attribute
    #[must_use]
    pub fn with_attr(mut self, key: impl Into<String>, value: Value) -> Self {
        self.attrs
            .get_or_insert_with(Map::new)
            .insert(key.into(), value);
        self
    }

    /// Look up an attribute
    #[inline]
    #[must_use]
    pub fn attr(&self, key: &str) -> Option<&Value> {
        self.attrs.as_ref().and_then(|attrs| attrs.get(key))
    }

    /// Context key the step's submission is stored under
    ///
    /// Falls back to the slug when no explicit `contextPath` is configured.
    #[inline]
    #[must_use]
    pub fn submission_path(&self) -> &str {
        self.context_path.as_deref().unwrap_or(&self.slug)
    }
}
