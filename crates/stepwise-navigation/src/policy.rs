//! Step adjacency
//!
//! Two ways to find a node's neighbour:
//! - [`AdjacencyPolicy::OrderAdjacent`]: the node whose `order` is exactly
//!   `current.order ± 1`. A gap in the order values ends navigation.
//! - [`AdjacencyPolicy::IndexAdjacent`]: the previous/next node in sorted
//!   position, skipping over gaps.

use serde::{Deserialize, Serialize};
use stepwise_model::{Scenario, Step};

/// Direction of a relative transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Towards higher order
    Forward,
    /// Towards lower order
    Backward,
}

impl Direction {
    #[inline]
    fn delta(self) -> i64 {
        match self {
            Self::Forward => 1,
            Self::Backward => -1,
        }
    }
}

/// How `next`/`prev` pick the neighbouring node
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AdjacencyPolicy {
    /// Neighbour has `order == current.order ± 1`
    #[default]
    OrderAdjacent,
    /// Neighbour is the adjacent element of the sorted node list
    IndexAdjacent,
}

impl AdjacencyPolicy {
    /// Neighbour of `slug` in `direction`, or `None`
    ///
    /// Returns `None` when `slug` is not a node of the scenario.
    #[must_use]
    pub fn neighbour<'a>(
        self,
        scenario: &'a Scenario,
        slug: &str,
        direction: Direction,
    ) -> Option<&'a Step> {
        match self {
            Self::OrderAdjacent => {
                let current = scenario.node(slug)?;
                let target = current.order.checked_add(direction.delta())?;
                scenario.node_by_order(target)
            }
            Self::IndexAdjacent => {
                let position = scenario.position(slug)?;
                let target = match direction {
                    Direction::Forward => position.checked_add(1)?,
                    Direction::Backward => position.checked_sub(1)?,
                };
                scenario.nodes.get(target)
            }
        }
    }
}
