//! Node Data Structures
//!
//! This module defines the [`Node`] value type - one row of the managed
//! category table - and [`NewNode`], the caller-supplied input to `insert`.
//!
//! # Design
//!
//! The engine manages tables whose business columns it does not know about,
//! so a `Node` carries the full row as a generic [`Record`] alongside typed
//! accessors for the structural columns (id, parent, group, left, right).
//! A `Node` is immutable from the caller's point of view: `left`/`right` are
//! reassigned only by the engine's renumbering walk, which persists fresh
//! values back to storage rather than mutating rows in place.
//!
//! # Examples
//!
//! ```rust
//! use taxon_core::models::NewNode;
//! use serde_json::json;
//!
//! // A root category
//! let root = NewNode::root().with_field("name", json!("Electronics"));
//!
//! // A child category under an existing node
//! let child = NewNode::child("3f6c...").with_field("name", json!("Laptops"));
//! ```

use crate::db::Record;
use crate::tree::{TreeConfig, TreeError};
use serde::Serialize;
use serde_json::Value;

/// One row of the managed table, with the structural columns decoded.
///
/// # Fields
///
/// - `id`: unique identifier in canonical string form, assigned at creation
/// - `parent_id`: parent identifier, `None` for a tree root
/// - `group_id`: tenant/namespace identifier, `None` on unscoped tables
/// - `lft` / `rgt`: the nested-set interval; `lft < rgt` always
/// - `record`: the full caller-visible row (NULL columns normalized to `""`)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    pub id: String,
    pub parent_id: Option<String>,
    pub group_id: Option<String>,
    pub lft: i64,
    pub rgt: i64,
    /// Full row as fetched, including caller-owned business columns
    pub record: Record,
}

/// Read a column as canonical string form (identifier columns may come back
/// as text or integers depending on the table).
fn column_string(record: &Record, col: &str) -> Option<String> {
    match record.get(col)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Read an optional reference column; the empty-string NULL sentinel and a
/// missing column both mean "absent".
fn column_reference(record: &Record, col: &str) -> Option<String> {
    column_string(record, col).filter(|s| !s.is_empty())
}

impl Node {
    /// Decode a fetched record into a `Node` using the table's column names.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::InvalidRecord`] when the id column is missing or
    /// an interval bound is absent/non-integer - both mean the configured
    /// columns do not match the table.
    pub fn from_record(record: Record, config: &TreeConfig) -> Result<Self, TreeError> {
        let id = column_reference(&record, config.id_col())
            .ok_or_else(|| TreeError::invalid_record(format!("missing '{}'", config.id_col())))?;

        let interval = |col: &str| -> Result<i64, TreeError> {
            record
                .get(col)
                .and_then(Value::as_i64)
                .ok_or_else(|| TreeError::invalid_record(format!("missing interval '{}'", col)))
        };

        Ok(Self {
            id,
            parent_id: column_reference(&record, config.parent_col()),
            group_id: column_reference(&record, config.group_col()),
            lft: interval(config.left_col())?,
            rgt: interval(config.right_col())?,
            record,
        })
    }

    /// Consume the node, yielding the caller-visible record.
    pub fn into_record(self) -> Record {
        self.record
    }
}

/// Input to [`crate::tree::TreeStore::insert`].
///
/// Carries the parent reference, the optional group, and opaque business
/// columns. The identifier and the `left`/`right` interval are never
/// caller-supplied: the engine assigns them.
#[derive(Debug, Clone, Default)]
pub struct NewNode {
    pub parent_id: Option<String>,
    pub group_id: Option<String>,
    /// Caller-owned business columns for the new row
    pub fields: Record,
}

impl NewNode {
    /// A new tree root (no parent).
    pub fn root() -> Self {
        Self::default()
    }

    /// A new child of an existing node.
    pub fn child(parent_id: impl Into<String>) -> Self {
        Self {
            parent_id: Some(parent_id.into()),
            ..Self::default()
        }
    }

    /// Set the tenant/group identifier.
    pub fn with_group(mut self, group_id: impl Into<String>) -> Self {
        self.group_id = Some(group_id.into());
        self
    }

    /// Add a business column value.
    pub fn with_field(mut self, column: impl Into<String>, value: Value) -> Self {
        self.fields.insert(column.into(), value);
        self
    }
}
