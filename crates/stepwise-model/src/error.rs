//! Error types for the stepwise model
//!
//! Raised by node-list mutations that would break the scenario invariants.
//! Read paths never fail; they return `Option`.

/// Model mutation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// Another node in the scenario already uses this order value
    #[error("scenario '{scenario}' already has a node with order {order}")]
    DuplicateOrder {
        /// Scenario slug
        scenario: String,
        /// Colliding order value
        order: i64,
    },

    /// Another node in the scenario already uses this slug
    #[error("scenario '{scenario}' already has a node with slug '{slug}'")]
    DuplicateSlug {
        /// Scenario slug
        scenario: String,
        /// Colliding step slug
        slug: String,
    },

    /// No node with this slug exists in the scenario
    #[error("scenario '{scenario}' has no node '{slug}'")]
    UnknownStep {
        /// Scenario slug
        scenario: String,
        /// Missing step slug
        slug: String,
    },

    /// No scenario with this slug exists in the workspace
    #[error("workspace '{workspace}' has no scenario '{scenario}'")]
    UnknownScenario {
        /// Workspace slug
        workspace: String,
        /// Missing scenario slug
        scenario: String,
    },

    /// A replacement tried to change the routing key of a node
    #[error("step slug is immutable: '{from}' cannot become '{to}'")]
    SlugRenamed {
        /// Existing slug
        from: String,
        /// Slug carried by the replacement
        to: String,
    },

    /// Template category string is not one of the known categories
    #[error("unknown template category: '{0}'")]
    UnknownCategory(String),
}

impl ModelError {
    /// Stable machine-readable error code
    #[inline]
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::DuplicateOrder { .. } => "duplicate_order",
            Self::DuplicateSlug { .. } => "duplicate_slug",
            Self::UnknownStep { .. } => "unknown_step",
            Self::UnknownScenario { .. } => "unknown_scenario",
            Self::SlugRenamed { .. } => "slug_renamed",
            Self::UnknownCategory(_) => "unknown_category",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_order_display() {
        let err = ModelError::DuplicateOrder {
            scenario: "intro".to_string(),
            order: 3,
        };
        assert!(err.to_string().contains("order 3"));
        assert_eq!(err.code(), "duplicate_order");
    }

    #[test]
    fn slug_renamed_display() {
        let err = ModelError::SlugRenamed {
            from: "a".to_string(),
            to: "b".to_string(),
        };
        assert!(err.to_string().contains("immutable"));
    }
}
