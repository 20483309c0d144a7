//! Template references
//!
//! A [`TemplateRef`] names a renderable implementation by
//! `(namespace, category, identifier)`. It is never persisted; it is
//! recomputed on every render and used as a cache key.

use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Template categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TemplateCategory {
    /// Workspace-level page layouts
    #[serde(rename = "layouts")]
    Layouts,
    /// Reusable widgets placed by layouts
    #[serde(rename = "widgets")]
    Widgets,
    /// Step bodies
    #[serde(rename = "steps")]
    Steps,
    /// Steps embedded in a flow
    #[serde(rename = "flowSteps")]
    FlowSteps,
}

impl TemplateCategory {
    /// All categories
    pub const ALL: [Self; 4] = [Self::Layouts, Self::Widgets, Self::Steps, Self::FlowSteps];

    /// Directory name of the category
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Layouts => "layouts",
            Self::Widgets => "widgets",
            Self::Steps => "steps",
            Self::FlowSteps => "flowSteps",
        }
    }
}

impl Display for TemplateCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TemplateCategory {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| ModelError::UnknownCategory(s.to_string()))
    }
}

/// Logical reference to a renderable implementation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TemplateRef {
    /// Theme or template directory
    pub namespace: String,
    /// Category within the namespace
    pub category: TemplateCategory,
    /// File identifier within the category
    pub identifier: String,
}

impl TemplateRef {
    /// Create new reference
    #[inline]
    #[must_use]
    pub fn new(
        namespace: impl Into<String>,
        category: TemplateCategory,
        identifier: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            category,
            identifier: identifier.into(),
        }
    }

    /// Layout reference
    #[inline]
    #[must_use]
    pub fn layout(namespace: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self::new(namespace, TemplateCategory::Layouts, identifier)
    }

    /// Step reference
    #[inline]
    #[must_use]
    pub fn step(namespace: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self::new(namespace, TemplateCategory::Steps, identifier)
    }

    /// Widget reference
    #[inline]
    #[must_use]
    pub fn widget(namespace: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self::new(namespace, TemplateCategory::Widgets, identifier)
    }

    /// Path-like key, `namespace/category/identifier`
    #[inline]
    #[must_use]
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl Display for TemplateRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.namespace, self.category, self.identifier)
    }
}

impl FromStr for TemplateRef {
    type Err = ModelError;

    /// Parse `namespace/category/identifier`; the identifier may contain `/`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, '/');
        let namespace = parts.next().unwrap_or_default();
        let category = parts.next().unwrap_or_default().parse()?;
        let identifier = parts.next().unwrap_or_default();
        Ok(Self::new(namespace, category, identifier))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_round_trips_through_str() {
        for category in TemplateCategory::ALL {
            assert_eq!(category.as_str().parse::<TemplateCategory>().unwrap(), category);
        }
    }

    #[test]
    fn category_rejects_unknown() {
        assert!(matches!(
            "pages".parse::<TemplateCategory>(),
            Err(ModelError::UnknownCategory(_))
        ));
    }

    #[test]
    fn template_ref_display() {
        let r = TemplateRef::step("default", "intro.json");
        assert_eq!(r.to_string(), "default/steps/intro.json");
    }

    #[test]
    fn template_ref_parse_keeps_nested_identifier() {
        let r: TemplateRef = "dark/flowSteps/forms/contact.json".parse().unwrap();
        assert_eq!(r.namespace, "dark");
        assert_eq!(r.category, TemplateCategory::FlowSteps);
        assert_eq!(r.identifier, "forms/contact.json");
    }

    #[test]
    fn category_serde_uses_directory_names() {
        let json = serde_json::to_string(&TemplateCategory::FlowSteps).unwrap();
        assert_eq!(json, "\"flowSteps\"");
    }
}
