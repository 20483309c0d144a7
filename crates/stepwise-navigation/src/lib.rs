//! Stepwise Navigation
//!
//! Tracks the active `(workspace, scenario?, step?)` triple and computes
//! deterministic transitions over a scenario's ordered nodes:
//! - [`Navigator::go_workspace`] / [`Navigator::go_scenario`] / [`Navigator::go_step`]
//! - [`Navigator::next`] / [`Navigator::prev`] with a pluggable [`AdjacencyPolicy`]
//!
//! Navigation never fails. A transition that cannot happen is a no-op and
//! yields no [`NavigationEvent`].
//!
//! # Example
//!
//! ```rust,ignore
//! use stepwise_navigation::Navigator;
//!
//! let mut nav = Navigator::new();
//! nav.go_scenario(&workspace, "onboarding");
//! while nav.can_next(&workspace) {
//!     nav.next(&workspace);
//! }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod event;
pub mod navigator;
pub mod policy;
pub mod triple;

pub use event::NavigationEvent;
pub use navigator::Navigator;
pub use policy::{AdjacencyPolicy, Direction};
pub use triple::ActiveTriple;
