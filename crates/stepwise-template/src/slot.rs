//! Renderable slots
//!
//! A [`Slot`] is what a view region shows: the resolved template, or a
//! visible "not found" placeholder naming the reference that failed.

use crate::resolver::Resolution;
use crate::template::Template;
use serde_json::{json, Value};
use std::sync::Arc;
use stepwise_model::TemplateRef;

/// Resolved content for one view region
#[derive(Debug, Clone, PartialEq)]
pub enum Slot {
    /// Template resolved
    Ready(Arc<Template>),
    /// Template unavailable; rendered as a placeholder
    NotFound {
        /// Reference that could not be resolved
        reference: TemplateRef,
    },
}

impl Slot {
    /// Build a slot from a resolution outcome
    #[must_use]
    pub fn from_resolution(reference: TemplateRef, resolution: Resolution) -> Self {
        match resolution {
            Some(template) => Self::Ready(template),
            None => Self::NotFound { reference },
        }
    }

    /// Check if the template resolved
    #[inline]
    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    /// Resolved template, if any
    #[inline]
    #[must_use]
    pub fn template(&self) -> Option<&Arc<Template>> {
        match self {
            Self::Ready(template) => Some(template),
            Self::NotFound { .. } => None,
        }
    }

    /// Reference the slot stands for
    #[must_use]
    pub fn reference(&self) -> &TemplateRef {
        match self {
            Self::Ready(template) => template.reference(),
            Self::NotFound { reference } => reference,
        }
    }

    /// Human-readable placeholder text, `None` when ready
    #[must_use]
    pub fn placeholder_label(&self) -> Option<String> {
        match self {
            Self::Ready(_) => None,
            Self::NotFound { reference } => Some(format!("Template not found: {reference}")),
        }
    }

    /// Render the slot to a JSON view node
    ///
    /// Ready slots render their document through `interpolate`; missing
    /// templates render a placeholder node instead of failing.
    pub fn render_with<F>(&self, interpolate: F) -> Value
    where
        F: Fn(&str) -> String,
    {
        match self {
            Self::Ready(template) => template.render_with(interpolate),
            Self::NotFound { reference } => json!({
                "placeholder": true,
                "reference": reference.key(),
                "message": format!("Template not found: {reference}"),
            }),
        }
    }
}
