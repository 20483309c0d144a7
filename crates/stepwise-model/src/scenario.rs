//! Scenarios
//!
//! A [`Scenario`] owns an ordered node list. Order values are unique within a
//! scenario; gaps are tolerated. Every mutation re-sorts by `order` and leaves
//! the scenario untouched when it would introduce a duplicate.

use crate::error::ModelError;
use crate::step::Step;
use serde::{Deserialize, Serialize};

/// An ordered sequence of steps forming a guided workflow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    /// Stable routing key
    #[serde(alias = "id")]
    pub slug: String,

    /// Display name
    #[serde(default)]
    pub name: String,

    /// Optional description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// System message template for assistant-backed steps
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_message: Option<String>,

    /// Nodes, kept sorted by `order`
    #[serde(default)]
    pub nodes: Vec<Step>,
}

impl Scenario {
    /// Create empty scenario
    #[inline]
    #[must_use]
    pub fn new(slug: impl Into<String>) -> Self {
        let slug = slug.into();
        Self {
            name: slug.clone(),
            slug,
            description: None,
            system_message: None,
            nodes: Vec::new(),
        }
    }

    /// Build a scenario from raw nodes, validating and sorting them
    ///
    /// # Errors
    /// - `ModelError::DuplicateOrder` if two nodes share an order value
    /// - `ModelError::DuplicateSlug` if two nodes share a slug
    pub fn from_nodes(slug: impl Into<String>, nodes: Vec<Step>) -> Result<Self, ModelError> {
        let mut scenario = Self::new(slug);
        scenario.nodes = nodes;
        scenario.validate()?;
        scenario.sort();
        Ok(scenario)
    }

    /// With display name
    #[inline]
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Check the uniqueness invariants on the current node list
    ///
    /// # Errors
    /// Returns the first duplicate order or slug found
    pub fn validate(&self) -> Result<(), ModelError> {
        let mut orders = std::collections::HashSet::new();
        let mut slugs = std::collections::HashSet::new();
        for node in &self.nodes {
            if !orders.insert(node.order) {
                return Err(self.duplicate_order(node.order));
            }
            if !slugs.insert(node.slug.as_str()) {
                return Err(ModelError::DuplicateSlug {
                    scenario: self.slug.clone(),
                    slug: node.slug.clone(),
                });
            }
        }
        Ok(())
    }

    /// Stable sort of nodes by ascending order
    #[inline]
    pub fn sort(&mut self) {
        self.nodes.sort_by_key(|node| node.order);
    }

    /// Number of nodes
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the scenario has no nodes
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node with the minimum order value
    #[must_use]
    pub fn first_node(&self) -> Option<&Step> {
        self.nodes.iter().min_by_key(|node| node.order)
    }

    /// Look up a node by slug
    #[inline]
    #[must_use]
    pub fn node(&self, slug: &str) -> Option<&Step> {
        self.nodes.iter().find(|node| node.slug == slug)
    }

    /// Look up a node by exact order value
    #[inline]
    #[must_use]
    pub fn node_by_order(&self, order: i64) -> Option<&Step> {
        self.nodes.iter().find(|node| node.order == order)
    }

    /// Index of a node in the sorted node list
    #[inline]
    #[must_use]
    pub fn position(&self, slug: &str) -> Option<usize> {
        self.nodes.iter().position(|node| node.slug == slug)
    }

    /// Slugs in navigation order
    pub fn slugs(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(|node| node.slug.as_str())
    }

    /// Add a node
    ///
    /// # Errors
    /// - `ModelError::DuplicateSlug` if the slug is taken
    /// - `ModelError::DuplicateOrder` if the order is taken
    pub fn insert_node(&mut self, step: Step) -> Result<(), ModelError> {
        if self.node(&step.slug).is_some() {
            return Err(ModelError::DuplicateSlug {
                scenario: self.slug.clone(),
                slug: step.slug,
            });
        }
        if self.node_by_order(step.order).is_some() {
            return Err(self.duplicate_order(step.order));
        }
        self.nodes.push(step);
        self.sort();
        Ok(())
    }

    /// Replace a node wholesale and re-sort
    ///
    /// The replacement must keep the original slug.
    ///
    /// # Errors
    /// - `ModelError::UnknownStep` if `slug` is not in the scenario
    /// - `ModelError::SlugRenamed` if the replacement carries another slug
    /// - `ModelError::DuplicateOrder` if the new order collides with a sibling
    pub fn replace_node(&mut self, slug: &str, step: Step) -> Result<Step, ModelError> {
        let idx = self.position(slug).ok_or_else(|| self.unknown_step(slug))?;
        if step.slug != slug {
            return Err(ModelError::SlugRenamed {
                from: slug.to_string(),
                to: step.slug,
            });
        }
        if self.order_taken_by_other(step.order, slug) {
            return Err(self.duplicate_order(step.order));
        }
        let previous = std::mem::replace(&mut self.nodes[idx], step);
        self.sort();
        Ok(previous)
    }

    /// Remove a node, leaving a gap in the order sequence
    ///
    /// # Errors
    /// `ModelError::UnknownStep` if `slug` is not in the scenario
    pub fn remove_node(&mut self, slug: &str) -> Result<Step, ModelError> {
        let idx = self.position(slug).ok_or_else(|| self.unknown_step(slug))?;
        Ok(self.nodes.remove(idx))
    }

    /// Change the order value of a node
    ///
    /// # Errors
    /// - `ModelError::UnknownStep` if `slug` is not in the scenario
    /// - `ModelError::DuplicateOrder` if `new_order` is taken by a sibling
    pub fn move_node(&mut self, slug: &str, new_order: i64) -> Result<(), ModelError> {
        let idx = self.position(slug).ok_or_else(|| self.unknown_step(slug))?;
        if self.order_taken_by_other(new_order, slug) {
            return Err(self.duplicate_order(new_order));
        }
        self.nodes[idx].order = new_order;
        self.sort();
        Ok(())
    }

    /// Compact order values to `1..=n`, preserving the current sequence
    pub fn renumber(&mut self) {
        self.sort();
        for (node, order) in self.nodes.iter_mut().zip(1i64..) {
            node.order = order;
        }
    }

    /// Check whether order values form a contiguous run
    #[must_use]
    pub fn has_gaps(&self) -> bool {
        self.nodes
            .windows(2)
            .any(|pair| pair[1].order - pair[0].order != 1)
    }

    fn order_taken_by_other(&self, order: i64, slug: &str) -> bool {
        self.nodes
            .iter()
            .any(|node| node.order == order && node.slug != slug)
    }

    fn duplicate_order(&self, order: i64) -> ModelError {
        ModelError::DuplicateOrder {
            scenario: self.slug.clone(),
            order,
        }
    }

    fn unknown_step(&self, slug: &str) -> ModelError {
        ModelError::UnknownStep {
            scenario: self.slug.clone(),
            slug: slug.to_string(),
        }
    }
}
