//! The active navigation triple

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Active `(workspace, scenario?, step?)` selection
///
/// A step is only meaningful inside a scenario, and a scenario inside a
/// workspace; the navigator maintains that nesting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActiveTriple {
    /// Current workspace slug
    pub workspace: Option<String>,
    /// Current scenario slug
    pub scenario: Option<String>,
    /// Current step slug
    pub step: Option<String>,
}

impl ActiveTriple {
    /// Triple with only a workspace selected
    #[inline]
    #[must_use]
    pub fn workspace(workspace: impl Into<String>) -> Self {
        Self {
            workspace: Some(workspace.into()),
            scenario: None,
            step: None,
        }
    }

    /// With scenario
    #[inline]
    #[must_use]
    pub fn with_scenario(mut self, scenario: impl Into<String>) -> Self {
        self.scenario = Some(scenario.into());
        self
    }

    /// With step
    #[inline]
    #[must_use]
    pub fn with_step(mut self, step: impl Into<String>) -> Self {
        self.step = Some(step.into());
        self
    }

    /// Current workspace slug
    #[inline]
    #[must_use]
    pub fn workspace_id(&self) -> Option<&str> {
        self.workspace.as_deref()
    }

    /// Current scenario slug
    #[inline]
    #[must_use]
    pub fn scenario_id(&self) -> Option<&str> {
        self.scenario.as_deref()
    }

    /// Current step slug
    #[inline]
    #[must_use]
    pub fn step_slug(&self) -> Option<&str> {
        self.step.as_deref()
    }

    /// Check if a step is selected
    #[inline]
    #[must_use]
    pub fn has_step(&self) -> bool {
        self.step.is_some()
    }
}

impl Display for ActiveTriple {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let part = |p: &Option<String>| p.clone().unwrap_or_else(|| "-".to_string());
        write!(
            f,
            "{}/{}/{}",
            part(&self.workspace),
            part(&self.scenario),
            part(&self.step)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_marks_missing_parts() {
        let triple = ActiveTriple::workspace("main").with_scenario("intro");
        assert_eq!(triple.to_string(), "main/intro/-");
        assert!(!triple.has_step());
        assert_eq!(ActiveTriple::default().to_string(), "-/-/-");
    }
}
