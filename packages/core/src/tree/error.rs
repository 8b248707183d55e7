//! Tree Engine Error Types
//!
//! Caller-facing error taxonomy for tree operations. No variant is retried
//! internally; every failure during the renumbering walk propagates
//! immediately so the enclosing transaction aborts without committing a
//! partial renumbering.

use thiserror::Error;

/// Errors surfaced by [`crate::tree::TreeStore`] and
/// [`crate::tree::ScopedTreeStore`] operations
#[derive(Error, Debug)]
pub enum TreeError {
    /// Lookup of an identifier that does not exist
    #[error("Node not found: {id}")]
    NotFound { id: String },

    /// Attempt to insert a second root into a tree that already has one
    #[error("Tree already has a root; new nodes require a parent")]
    ParentMissing,

    /// The final insert statement affected zero rows
    #[error("Row was not created")]
    RowNotCreated,

    /// Scope mismatch or missing required argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A fetched row is missing a structural column or carries a
    /// non-integer interval bound
    #[error("Malformed row: {context}")]
    InvalidRecord { context: String },

    /// libsql statement failure
    #[error("Database operation failed: {0}")]
    Database(#[from] libsql::Error),
}

impl TreeError {
    /// Create a not found error
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// Create an invalid argument error
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Create a malformed row error
    pub fn invalid_record(context: impl Into<String>) -> Self {
        Self::InvalidRecord {
            context: context.into(),
        }
    }
}
