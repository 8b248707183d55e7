//! Tenant-Scoped Tree Store
//!
//! [`ScopedTreeStore`] wraps a [`TreeStore`] for multi-tenant tables: every
//! operation takes a mandatory group identifier and is validated before
//! delegation, so no read or write can leak or merge intervals across
//! tenants, and no caller can operate tenant-less on a scoped table.
//!
//! Each group holds an independent tree in the same table; their intervals
//! never interact.

use crate::models::{NewNode, Node};
use crate::tree::{TreeError, TreeStore};
use libsql::Connection;

/// Composition wrapper adding a mandatory group to every [`TreeStore`]
/// operation
///
/// Scope checks happen once per call:
/// - an empty group is rejected with [`TreeError::InvalidArgument`]
/// - operations referencing an existing node fetch it and reject the call
///   when its stored group differs from the supplied one
#[derive(Debug, Clone)]
pub struct ScopedTreeStore {
    inner: TreeStore,
}

impl ScopedTreeStore {
    pub fn new(inner: TreeStore) -> Self {
        Self { inner }
    }

    /// Access the wrapped store (for unscoped id-unique lookups such as
    /// [`TreeStore::get_node`]).
    pub fn inner(&self) -> &TreeStore {
        &self.inner
    }

    /// Validate the supplied group, and when `node_id` is given, that the
    /// referenced node belongs to it.
    async fn check_scope(
        &self,
        conn: &Connection,
        group_id: &str,
        node_id: Option<&str>,
    ) -> Result<(), TreeError> {
        if group_id.is_empty() {
            return Err(TreeError::invalid_argument(format!(
                "{} is required",
                self.inner.config().group_col()
            )));
        }
        if let Some(id) = node_id {
            let node = self.inner.get_node(conn, id).await?;
            if node.group_id.as_deref() != Some(group_id) {
                return Err(TreeError::invalid_argument(format!(
                    "node '{}' does not belong to {} '{}'",
                    id,
                    self.inner.config().group_col(),
                    group_id
                )));
            }
        }
        Ok(())
    }

    /// All nodes of one group, ordered by the left bound.
    pub async fn get_all(
        &self,
        conn: &Connection,
        group_id: &str,
        limit: u64,
    ) -> Result<Vec<Node>, TreeError> {
        self.check_scope(conn, group_id, None).await?;
        self.inner.get_all(conn, Some(group_id), limit).await
    }

    /// Leaves of one group's tree.
    pub async fn get_leaves(
        &self,
        conn: &Connection,
        group_id: &str,
    ) -> Result<Vec<Node>, TreeError> {
        self.check_scope(conn, group_id, None).await?;
        self.inner.get_leaves(conn, Some(group_id)).await
    }

    /// Children (direct or all descendants) of a node in one group.
    pub async fn get_children(
        &self,
        conn: &Connection,
        parent_id: &str,
        direct_only: bool,
        group_id: &str,
    ) -> Result<Vec<Node>, TreeError> {
        self.check_scope(conn, group_id, Some(parent_id)).await?;
        self.inner
            .get_children(conn, parent_id, direct_only, Some(group_id))
            .await
    }

    /// Forward siblings of a node in one group.
    pub async fn get_forward_siblings(
        &self,
        conn: &Connection,
        node: &Node,
        group_id: &str,
    ) -> Result<Vec<Node>, TreeError> {
        self.check_scope(conn, group_id, Some(&node.id)).await?;
        self.inner
            .get_forward_siblings(conn, node, Some(group_id))
            .await
    }

    /// Equality filter over arbitrary columns within one group.
    pub async fn filter(
        &self,
        conn: &Connection,
        filters: &[(&str, serde_json::Value)],
        group_id: &str,
    ) -> Result<Vec<Node>, TreeError> {
        self.check_scope(conn, group_id, None).await?;
        self.inner.filter(conn, filters, Some(group_id)).await
    }

    /// Insert a node into one group's tree.
    ///
    /// The supplied group is stamped onto the new row. For a non-root the
    /// parent must already belong to the same group.
    pub async fn insert(
        &self,
        conn: &Connection,
        group_id: &str,
        new: NewNode,
    ) -> Result<Node, TreeError> {
        self.check_scope(conn, group_id, new.parent_id.as_deref())
            .await?;
        let new = NewNode {
            group_id: Some(group_id.to_owned()),
            ..new
        };
        self.inner.insert(conn, new).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DatabaseService;
    use crate::tree::TreeConfig;
    use serde_json::json;
    use tempfile::TempDir;

    async fn create_test_store() -> (ScopedTreeStore, libsql::Connection, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db = DatabaseService::new(temp_dir.path().join("test.db"))
            .await
            .unwrap();
        let config = TreeConfig::new("categories", "lft", "rgt").unwrap();
        db.ensure_tree_table(&config, &[("name", "TEXT")])
            .await
            .unwrap();
        let conn = db.connect_with_timeout().await.unwrap();
        (ScopedTreeStore::new(TreeStore::new(config)), conn, temp_dir)
    }

    #[tokio::test]
    async fn test_empty_group_rejected() {
        let (store, conn, _temp) = create_test_store().await;

        let err = store.get_all(&conn, "", 10).await.unwrap_err();
        assert!(matches!(err, TreeError::InvalidArgument(_)));

        let err = store.insert(&conn, "", NewNode::root()).await.unwrap_err();
        assert!(matches!(err, TreeError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_each_group_gets_its_own_root() {
        let (store, conn, _temp) = create_test_store().await;

        let r1 = store.insert(&conn, "g1", NewNode::root()).await.unwrap();
        // A root in another group is not a second root
        let r2 = store.insert(&conn, "g2", NewNode::root()).await.unwrap();
        assert_eq!((r1.lft, r1.rgt), (1, 2));
        assert_eq!((r2.lft, r2.rgt), (1, 2));
        assert_eq!(r1.group_id.as_deref(), Some("g1"));
        assert_eq!(r2.group_id.as_deref(), Some("g2"));

        // Within one group the single-root rule still holds
        let err = store
            .insert(&conn, "g1", NewNode::root())
            .await
            .unwrap_err();
        assert!(matches!(err, TreeError::ParentMissing));
    }

    #[tokio::test]
    async fn test_cross_group_parent_rejected() {
        let (store, conn, _temp) = create_test_store().await;

        let r1 = store.insert(&conn, "g1", NewNode::root()).await.unwrap();
        store.insert(&conn, "g2", NewNode::root()).await.unwrap();

        let err = store
            .insert(&conn, "g2", NewNode::child(r1.id))
            .await
            .unwrap_err();
        assert!(matches!(err, TreeError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_groups_renumber_independently() {
        let (store, conn, _temp) = create_test_store().await;

        let r1 = store
            .insert(&conn, "g1", NewNode::root().with_field("name", json!("R1")))
            .await
            .unwrap();
        let r2 = store
            .insert(&conn, "g2", NewNode::root().with_field("name", json!("R2")))
            .await
            .unwrap();

        // Grow g1; g2's intervals must not move
        let a = store
            .insert(&conn, "g1", NewNode::child(r1.id.clone()))
            .await
            .unwrap();
        store
            .insert(&conn, "g1", NewNode::child(a.id.clone()))
            .await
            .unwrap();

        let g1 = store.get_all(&conn, "g1", u64::MAX).await.unwrap();
        let g2 = store.get_all(&conn, "g2", u64::MAX).await.unwrap();
        assert_eq!(g1.len(), 3);
        assert_eq!(g2.len(), 1);
        assert!(g1.iter().all(|x| x.group_id.as_deref() == Some("g1")));

        let r1 = store.inner().get_node(&conn, &r1.id).await.unwrap();
        assert_eq!((r1.lft, r1.rgt), (1, 6));
        let r2 = store.inner().get_node(&conn, &r2.id).await.unwrap();
        assert_eq!((r2.lft, r2.rgt), (1, 2));

        // Scoped reads never surface the other tenant's rows
        let g2_leaves = store.get_leaves(&conn, "g2").await.unwrap();
        assert_eq!(g2_leaves.len(), 1);
        assert_eq!(g2_leaves[0].id, r2.id);
    }

    #[tokio::test]
    async fn test_scoped_reads_check_node_group() {
        let (store, conn, _temp) = create_test_store().await;

        let r1 = store.insert(&conn, "g1", NewNode::root()).await.unwrap();
        let a = store
            .insert(&conn, "g1", NewNode::child(r1.id.clone()))
            .await
            .unwrap();
        store.insert(&conn, "g2", NewNode::root()).await.unwrap();

        let children = store.get_children(&conn, &r1.id, true, "g1").await.unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].id, a.id);

        let err = store
            .get_children(&conn, &r1.id, true, "g2")
            .await
            .unwrap_err();
        assert!(matches!(err, TreeError::InvalidArgument(_)));

        let err = store
            .get_forward_siblings(&conn, &a, "g2")
            .await
            .unwrap_err();
        assert!(matches!(err, TreeError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_scoped_filter() {
        let (store, conn, _temp) = create_test_store().await;

        let r1 = store
            .insert(&conn, "g1", NewNode::root().with_field("name", json!("All")))
            .await
            .unwrap();
        store
            .insert(&conn, "g2", NewNode::root().with_field("name", json!("All")))
            .await
            .unwrap();

        let hits = store
            .filter(&conn, &[("name", json!("All"))], "g1")
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, r1.id);
    }
}
