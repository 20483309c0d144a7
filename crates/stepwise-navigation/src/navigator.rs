//! Navigation state machine
//!
//! The navigator owns only the active triple. Scenario data is passed in by
//! the caller on every relative move, so the navigator never holds a stale
//! copy of a workspace.

use crate::event::NavigationEvent;
use crate::policy::{AdjacencyPolicy, Direction};
use crate::triple::ActiveTriple;
use stepwise_model::{Scenario, Workspace};

/// Tracks the active triple and applies transitions
#[derive(Debug, Clone)]
pub struct Navigator {
    triple: ActiveTriple,
    policy: AdjacencyPolicy,
    land_on_first: bool,
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new()
    }
}

impl Navigator {
    /// Create navigator with order adjacency, landing on the first node of a
    /// scenario when entering it
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            triple: ActiveTriple::default(),
            policy: AdjacencyPolicy::OrderAdjacent,
            land_on_first: true,
        }
    }

    /// With adjacency policy
    #[inline]
    #[must_use]
    pub fn with_policy(mut self, policy: AdjacencyPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// With landing behaviour for [`Navigator::go_scenario`]
    #[inline]
    #[must_use]
    pub fn with_land_on_first(mut self, land: bool) -> Self {
        self.land_on_first = land;
        self
    }

    /// Current triple
    #[inline]
    #[must_use]
    pub fn current(&self) -> &ActiveTriple {
        &self.triple
    }

    /// Active adjacency policy
    #[inline]
    #[must_use]
    pub fn policy(&self) -> AdjacencyPolicy {
        self.policy
    }

    /// Make `workspace_id` current, clearing scenario and step
    pub fn go_workspace(&mut self, workspace_id: &str) -> Option<NavigationEvent> {
        let target = ActiveTriple::workspace(workspace_id);
        if self.triple == target {
            return None;
        }
        self.triple = target;
        tracing::debug!(workspace = workspace_id, "workspace entered");
        Some(NavigationEvent::WorkspaceEntered {
            workspace: workspace_id.to_string(),
        })
    }

    /// Make a scenario of `workspace` current
    ///
    /// Clears the step, then lands on the node with the minimum order when
    /// the scenario exists and has nodes. An unknown scenario slug is still
    /// selected so the renderer can show its "not found" state.
    pub fn go_scenario(
        &mut self,
        workspace: &Workspace,
        scenario_slug: &str,
    ) -> Option<NavigationEvent> {
        let landing = if self.land_on_first {
            workspace
                .scenario(scenario_slug)
                .and_then(Scenario::first_node)
                .map(|node| node.slug.clone())
        } else {
            None
        };

        let target = ActiveTriple {
            workspace: Some(workspace.slug.clone()),
            scenario: Some(scenario_slug.to_string()),
            step: landing.clone(),
        };
        if self.triple == target {
            return None;
        }
        self.triple = target;

        tracing::debug!(
            workspace = %workspace.slug,
            scenario = scenario_slug,
            step = ?landing,
            "scenario entered"
        );
        Some(NavigationEvent::ScenarioEntered {
            workspace: workspace.slug.clone(),
            scenario: scenario_slug.to_string(),
            step: landing,
        })
    }

    /// Select a step directly, without checking that it exists
    pub fn go_step(&mut self, scenario_slug: &str, step_slug: &str) -> Option<NavigationEvent> {
        if self.triple.scenario_id() == Some(scenario_slug)
            && self.triple.step_slug() == Some(step_slug)
        {
            return None;
        }
        let from = if self.triple.scenario_id() == Some(scenario_slug) {
            self.triple.step.take()
        } else {
            None
        };
        self.triple.scenario = Some(scenario_slug.to_string());
        self.triple.step = Some(step_slug.to_string());

        tracing::debug!(scenario = scenario_slug, step = step_slug, "step entered");
        Some(NavigationEvent::StepEntered {
            scenario: scenario_slug.to_string(),
            step: step_slug.to_string(),
            from,
        })
    }

    /// Advance to the following node; no-op when there is none
    pub fn next(&mut self, workspace: &Workspace) -> Option<NavigationEvent> {
        self.step_towards(workspace, Direction::Forward)
    }

    /// Go back to the preceding node; no-op when there is none
    pub fn prev(&mut self, workspace: &Workspace) -> Option<NavigationEvent> {
        self.step_towards(workspace, Direction::Backward)
    }

    /// Check if [`Navigator::next`] would move
    #[must_use]
    pub fn can_next(&self, workspace: &Workspace) -> bool {
        self.target(workspace, Direction::Forward).is_some()
    }

    /// Check if [`Navigator::prev`] would move
    #[must_use]
    pub fn can_prev(&self, workspace: &Workspace) -> bool {
        self.target(workspace, Direction::Backward).is_some()
    }

    /// Slug of the node a relative move would land on
    #[must_use]
    pub fn target(&self, workspace: &Workspace, direction: Direction) -> Option<String> {
        if self.triple.workspace_id() != Some(workspace.slug.as_str()) {
            return None;
        }
        let scenario = workspace.scenario(self.triple.scenario_id()?)?;
        let current = self.triple.step_slug()?;
        self.policy
            .neighbour(scenario, current, direction)
            .map(|node| node.slug.clone())
    }

    fn step_towards(
        &mut self,
        workspace: &Workspace,
        direction: Direction,
    ) -> Option<NavigationEvent> {
        let Some(target) = self.target(workspace, direction) else {
            tracing::debug!(triple = %self.triple, ?direction, "no adjacent step; staying");
            return None;
        };
        let scenario = self.triple.scenario.clone()?;
        self.go_step(&scenario, &target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stepwise_model::Step;

    fn workspace() -> Workspace {
        let onboarding = Scenario::from_nodes(
            "onboarding",
            vec![
                Step::new("profile", 2, "form.json"),
                Step::new("intro", 1, "intro.json"),
                Step::new("done", 3, "done.json"),
            ],
        )
        .unwrap();
        Workspace::new("main")
            .with_scenario(onboarding)
            .with_scenario(Scenario::new("empty"))
    }

    #[test]
    fn go_workspace_clears_scenario_and_step() {
        let ws = workspace();
        let mut nav = Navigator::new();
        nav.go_scenario(&ws, "onboarding");
        assert!(nav.current().has_step());

        let event = nav.go_workspace("main");
        assert_eq!(
            event,
            Some(NavigationEvent::WorkspaceEntered {
                workspace: "main".to_string()
            })
        );
        assert_eq!(nav.current(), &ActiveTriple::workspace("main"));
        assert!(nav.go_workspace("main").is_none());
    }

    #[test]
    fn go_scenario_lands_on_minimum_order() {
        let ws = workspace();
        let mut nav = Navigator::new();
        let event = nav.go_scenario(&ws, "onboarding").unwrap();
        assert_eq!(event.step(), Some("intro"));
        assert_eq!(nav.current().step_slug(), Some("intro"));
    }

    #[test]
    fn go_scenario_on_empty_or_unknown_has_no_step() {
        let ws = workspace();
        let mut nav = Navigator::new();
        nav.go_scenario(&ws, "empty");
        assert_eq!(nav.current().scenario_id(), Some("empty"));
        assert!(nav.current().step_slug().is_none());

        nav.go_scenario(&ws, "missing");
        assert_eq!(nav.current().scenario_id(), Some("missing"));
        assert!(!nav.can_next(&ws));
    }

    #[test]
    fn go_scenario_without_landing() {
        let ws = workspace();
        let mut nav = Navigator::new().with_land_on_first(false);
        nav.go_scenario(&ws, "onboarding");
        assert!(nav.current().step_slug().is_none());
    }

    #[test]
    fn next_and_prev_follow_order() {
        let ws = workspace();
        let mut nav = Navigator::new();
        nav.go_scenario(&ws, "onboarding");

        assert!(!nav.can_prev(&ws));
        assert!(nav.prev(&ws).is_none());

        let event = nav.next(&ws).unwrap();
        assert_eq!(
            event,
            NavigationEvent::StepEntered {
                scenario: "onboarding".to_string(),
                step: "profile".to_string(),
                from: Some("intro".to_string()),
            }
        );
        nav.next(&ws);
        assert_eq!(nav.current().step_slug(), Some("done"));
        assert!(nav.next(&ws).is_none());
        assert_eq!(nav.current().step_slug(), Some("done"));

        nav.prev(&ws);
        assert_eq!(nav.current().step_slug(), Some("profile"));
    }

    #[test]
    fn go_step_does_not_check_existence() {
        let ws = workspace();
        let mut nav = Navigator::new();
        nav.go_workspace("main");
        nav.go_step("onboarding", "ghost");
        assert_eq!(nav.current().step_slug(), Some("ghost"));
        assert!(!nav.can_next(&ws));
        assert!(nav.next(&ws).is_none());
    }

    #[test]
    fn relative_moves_ignore_other_workspaces() {
        let ws = workspace();
        let mut nav = Navigator::new();
        nav.go_workspace("other");
        nav.go_step("onboarding", "intro");
        assert!(!nav.can_next(&ws));
    }
}
