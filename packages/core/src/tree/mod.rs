//! Nested-Set Tree Engine
//!
//! This module owns the nested-set invariant for one table:
//!
//! - [`TreeConfig`] - table/column names for the managed table
//! - [`TreeStore`] - read queries and the renumbering insert
//! - [`ScopedTreeStore`] - tenant-scoped wrapper around [`TreeStore`]
//! - [`IntervalStack`] / [`WalkEvent`] - depth-first walk plumbing
//!
//! All operations are async and issue their statements against a
//! caller-supplied `libsql::Connection`. Structural mutations are expected
//! to run inside one caller-owned transaction; the engine never commits or
//! rolls back on its own.

mod config;
mod error;
mod scoped;
mod store;
mod walk;

pub use config::TreeConfig;
pub use error::TreeError;
pub use scoped::ScopedTreeStore;
pub use store::TreeStore;
pub use walk::{IntervalStack, WalkEvent};
