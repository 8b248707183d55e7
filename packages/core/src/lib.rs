//! Taxon Core Storage Engine
//!
//! This crate implements a hierarchical category store on top of a relational
//! table using the nested-set model: every node carries a `(left, right)`
//! integer interval, and ancestor/descendant/leaf/sibling relationships are
//! derived purely from interval containment - no recursive queries.
//!
//! # Architecture
//!
//! - **libsql**: Embedded SQLite-compatible database; every operation issues
//!   its statements against a caller-supplied `libsql::Connection` (pass a
//!   `libsql::Transaction` for all-or-nothing inserts)
//! - **Generic rows**: Rows are surfaced as column-name keyed JSON records,
//!   so the engine works against any table shape
//! - **Tenant scoping**: [`tree::ScopedTreeStore`] confines every interval
//!   comparison to one group column value
//!
//! # Modules
//!
//! - [`models`] - Data structures (Node, NewNode)
//! - [`tree`] - The nested-set engine (TreeStore, ScopedTreeStore, walk)
//! - [`db`] - Database layer with libsql integration

pub mod db;
pub mod models;
pub mod tree;

// Re-export commonly used types
pub use db::{DatabaseService, Record};
pub use models::{NewNode, Node};
pub use tree::{ScopedTreeStore, TreeConfig, TreeError, TreeStore};
