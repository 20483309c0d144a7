//! Stepwise Context
//!
//! Per-workspace context buckets consulted and updated during navigation.
//!
//! # Guarantees
//!
//! - Buckets are never merged across workspaces
//! - Writes are copy-on-write at every depth: a snapshot taken before a write
//!   never observes it
//! - Reads and interpolation never fail; missing data reads as `None` / empty
//!
//! # Example
//!
//! ```rust,ignore
//! use stepwise_context::ContextStore;
//!
//! let store = ContextStore::new();
//! store.seed("main", &initial_context);
//! store.select("main");
//!
//! store.set_path("user", "name", json!("Ann"));
//! assert_eq!(store.interpolate("Hi {{user.name}}!"), "Hi Ann!");
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod interpolate;
pub mod path;
pub mod store;
pub mod update;

pub use interpolate::{interpolate_with, render_value};
pub use path::{ContextPath, PathError};
pub use store::{bucket_to_value, Bucket, ContextStore};
