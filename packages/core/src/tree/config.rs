//! Tree Table Configuration
//!
//! Names of the managed table and its structural columns. Because these
//! names are interpolated into SQL text (values are always bound as
//! parameters), every identifier is validated at construction time.

use crate::tree::TreeError;

/// The id column is a fixed convention across all managed tables.
const ID_COL: &str = "id";

/// Table and column names for one managed category table
///
/// # Examples
///
/// ```rust
/// use taxon_core::tree::TreeConfig;
///
/// // Default parent/group column names
/// let config = TreeConfig::new("categories", "lft", "rgt").unwrap();
///
/// // Multi-tenant table with custom column names
/// let scoped = TreeConfig::with_columns(
///     "categories", "lft", "rgt", "parent_id", "tenant_id",
/// ).unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct TreeConfig {
    table: String,
    left: String,
    right: String,
    parent: String,
    group: String,
}

/// Reject anything that is not a plain SQL identifier.
pub(crate) fn validate_identifier(name: &str) -> Result<(), TreeError> {
    let mut chars = name.chars();
    let valid = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(TreeError::invalid_argument(format!(
            "invalid SQL identifier: '{}'",
            name
        )))
    }
}

impl TreeConfig {
    /// Create a configuration with the conventional `parent_id`/`group_id`
    /// column names.
    pub fn new(
        table: impl Into<String>,
        left_col: impl Into<String>,
        right_col: impl Into<String>,
    ) -> Result<Self, TreeError> {
        Self::with_columns(table, left_col, right_col, "parent_id", "group_id")
    }

    /// Create a configuration with explicit parent and group column names.
    pub fn with_columns(
        table: impl Into<String>,
        left_col: impl Into<String>,
        right_col: impl Into<String>,
        parent_col: impl Into<String>,
        group_col: impl Into<String>,
    ) -> Result<Self, TreeError> {
        let config = Self {
            table: table.into(),
            left: left_col.into(),
            right: right_col.into(),
            parent: parent_col.into(),
            group: group_col.into(),
        };
        for name in [
            &config.table,
            &config.left,
            &config.right,
            &config.parent,
            &config.group,
        ] {
            validate_identifier(name)?;
        }
        Ok(config)
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn id_col(&self) -> &str {
        ID_COL
    }

    pub fn left_col(&self) -> &str {
        &self.left
    }

    pub fn right_col(&self) -> &str {
        &self.right
    }

    pub fn parent_col(&self) -> &str {
        &self.parent
    }

    pub fn group_col(&self) -> &str {
        &self.group
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_plain_identifiers() {
        assert!(TreeConfig::new("categories", "lft", "rgt").is_ok());
        assert!(TreeConfig::with_columns("t1", "left_v2", "right_v2", "pid", "_tenant").is_ok());
    }

    #[test]
    fn test_rejects_hostile_identifiers() {
        for bad in ["", "1table", "cat;drop table x", "lft--", "a b"] {
            assert!(
                matches!(
                    TreeConfig::new(bad, "lft", "rgt"),
                    Err(TreeError::InvalidArgument(_))
                ),
                "identifier '{}' should be rejected",
                bad
            );
        }
    }
}
