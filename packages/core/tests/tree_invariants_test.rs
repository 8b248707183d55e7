//! End-to-end invariant checks for the nested-set engine
//!
//! Builds trees through the public API, committing every insert inside its
//! own transaction, and re-validates the global interval invariant after
//! each step.

use serde_json::json;
use taxon_core::{DatabaseService, NewNode, Node, TreeConfig, TreeStore};
use tempfile::TempDir;

async fn setup() -> (TreeStore, DatabaseService, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db = DatabaseService::new(temp_dir.path().join("taxon.db"))
        .await
        .unwrap();
    let config = TreeConfig::new("categories", "lft", "rgt").unwrap();
    db.ensure_tree_table(&config, &[("name", "TEXT")])
        .await
        .unwrap();
    (TreeStore::new(config), db, temp_dir)
}

/// Insert one node inside its own committed transaction.
async fn insert_committed(
    store: &TreeStore,
    conn: &libsql::Connection,
    parent: Option<&str>,
    name: &str,
) -> Node {
    let new = match parent {
        Some(p) => NewNode::child(p),
        None => NewNode::root(),
    };
    let txn = conn.transaction().await.unwrap();
    let node = store
        .insert(&txn, new.with_field("name", json!(name)))
        .await
        .unwrap();
    txn.commit().await.unwrap();
    node
}

/// The nested-set invariant over everything in the table: unique bounds
/// covering 1..=2N, one root spanning them, strict parent containment, and
/// no partially overlapping pair of intervals.
fn assert_nested_set(nodes: &[Node]) {
    let n = nodes.len() as i64;

    let mut bounds: Vec<i64> = nodes.iter().flat_map(|x| [x.lft, x.rgt]).collect();
    bounds.sort_unstable();
    bounds.dedup();
    assert_eq!(bounds.len() as i64, 2 * n);
    assert_eq!(bounds.first(), Some(&1));
    assert_eq!(bounds.last(), Some(&(2 * n)));

    let roots: Vec<_> = nodes.iter().filter(|x| x.parent_id.is_none()).collect();
    assert_eq!(roots.len(), 1);
    assert_eq!((roots[0].lft, roots[0].rgt), (1, 2 * n));

    for node in nodes {
        assert!(node.lft < node.rgt);
        if let Some(parent_id) = node.parent_id.as_deref() {
            let parent = nodes.iter().find(|x| x.id == parent_id).unwrap();
            assert!(parent.lft < node.lft && node.rgt < parent.rgt);
        }
    }

    for a in nodes {
        for b in nodes {
            if a.id == b.id {
                continue;
            }
            let disjoint = a.rgt < b.lft || b.rgt < a.lft;
            let nested = (b.lft < a.lft && a.rgt < b.rgt) || (a.lft < b.lft && b.rgt < a.rgt);
            assert!(
                disjoint || nested,
                "intervals of {} and {} partially overlap",
                a.id,
                b.id
            );
        }
    }
}

#[tokio::test]
async fn invariants_hold_for_committed_insert_sequence() {
    let (store, db, _temp) = setup().await;
    let conn = db.connect_with_timeout().await.unwrap();

    let root = insert_committed(&store, &conn, None, "root").await;

    // Three-level taxonomy grown one committed insert at a time
    let mut level1 = Vec::new();
    for i in 0..3 {
        let node = insert_committed(&store, &conn, Some(&root.id), &format!("l1-{i}")).await;
        level1.push(node);
        let all = store.get_all(&conn, None, u64::MAX).await.unwrap();
        assert_nested_set(&all);
    }

    for (i, parent) in level1.iter().enumerate() {
        for j in 0..2 {
            insert_committed(&store, &conn, Some(&parent.id), &format!("l2-{i}-{j}")).await;
            let all = store.get_all(&conn, None, u64::MAX).await.unwrap();
            assert_nested_set(&all);
        }
    }

    let deep_parent = &level1[1];
    let grandchildren = store
        .get_children(&conn, &deep_parent.id, true, None)
        .await
        .unwrap();
    let leaf_parent = &grandchildren[0];
    for k in 0..3 {
        insert_committed(&store, &conn, Some(&leaf_parent.id), &format!("l3-{k}")).await;
        let all = store.get_all(&conn, None, u64::MAX).await.unwrap();
        assert_nested_set(&all);
    }

    // 1 root + 3 + 6 + 3 nodes, listing ordered by the left bound
    let all = store.get_all(&conn, None, u64::MAX).await.unwrap();
    assert_eq!(all.len(), 13);
    assert!(all.windows(2).all(|w| w[0].lft < w[1].lft));

    // Descendant listing of the root is everything but the root itself
    let descendants = store.get_children(&conn, &root.id, false, None).await.unwrap();
    assert_eq!(descendants.len(), 12);

    // Leaves cross-checked against has_children
    let leaves = store.get_leaves(&conn, None).await.unwrap();
    for node in &all {
        let has = store.has_children(&conn, &node.id).await.unwrap();
        assert_eq!(!has, leaves.iter().any(|l| l.id == node.id));
    }
}

#[tokio::test]
async fn sibling_order_matches_insertion_order_at_every_level() {
    let (store, db, _temp) = setup().await;
    let conn = db.connect_with_timeout().await.unwrap();

    let root = insert_committed(&store, &conn, None, "root").await;
    let a = insert_committed(&store, &conn, Some(&root.id), "a").await;
    let b = insert_committed(&store, &conn, Some(&root.id), "b").await;
    let c = insert_committed(&store, &conn, Some(&root.id), "c").await;

    // Growing the first child's subtree shifts b and c but not their order
    for i in 0..3 {
        insert_committed(&store, &conn, Some(&a.id), &format!("a-{i}")).await;
    }

    let children = store.get_children_by_id(&conn, &root.id).await.unwrap();
    let ids: Vec<_> = children.iter().map(|x| x.id.as_str()).collect();
    assert_eq!(ids, vec![a.id.as_str(), b.id.as_str(), c.id.as_str()]);

    let under_a = store.get_children_by_id(&conn, &a.id).await.unwrap();
    let names: Vec<_> = under_a.iter().map(|x| x.record["name"].clone()).collect();
    assert_eq!(names, vec![json!("a-0"), json!("a-1"), json!("a-2")]);

    let all = store.get_all(&conn, None, u64::MAX).await.unwrap();
    assert_nested_set(&all);
}
