//! Nested-Set Tree Store
//!
//! [`TreeStore`] maintains the nested-set invariant for one table: every row
//! carries a `(left, right)` interval, a parent's interval strictly contains
//! each child's, and siblings are ordered by ascending left bound. Reads are
//! single statements; `insert` runs the depth-first renumbering walk that
//! shifts every interval at or after the insertion point right by two.
//!
//! Every operation takes a `&libsql::Connection` supplied by the caller. The
//! renumbering walk issues one update per touched node, so callers must wrap
//! `insert` in a transaction to keep partial renumberings from committing;
//! any statement failure propagates immediately and aborts the walk.

use crate::db::record::{self, json_to_sql};
use crate::models::{NewNode, Node};
use crate::tree::config::validate_identifier;
use crate::tree::walk::{IntervalStack, WalkEvent};
use crate::tree::{TreeConfig, TreeError};
use libsql::Connection;
use tracing::{debug, trace};
use uuid::Uuid;

/// Read/insert engine for one nested-set table
///
/// # Examples
///
/// ```no_run
/// use taxon_core::{DatabaseService, NewNode, TreeConfig, TreeStore};
/// use serde_json::json;
/// use std::path::PathBuf;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let db = DatabaseService::new(PathBuf::from("./data/taxon.db")).await?;
///     let config = TreeConfig::new("categories", "lft", "rgt")?;
///     db.ensure_tree_table(&config, &[("name", "TEXT")]).await?;
///
///     let store = TreeStore::new(config);
///     let conn = db.connect_with_timeout().await?;
///
///     let txn = conn.transaction().await?;
///     let root = store
///         .insert(&txn, NewNode::root().with_field("name", json!("All")))
///         .await?;
///     txn.commit().await?;
///
///     let children = store.get_children_by_id(&conn, &root.id).await?;
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct TreeStore {
    config: TreeConfig,
}

impl TreeStore {
    pub fn new(config: TreeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    /// Run a SELECT and decode every row into a [`Node`].
    async fn fetch_nodes(
        &self,
        conn: &Connection,
        sql: &str,
        params: Vec<libsql::Value>,
    ) -> Result<Vec<Node>, TreeError> {
        debug!(sql = %sql, "tree query");
        let rows = conn.query(sql, params).await?;
        record::collect_records(rows)
            .await?
            .into_iter()
            .map(|r| Node::from_record(r, &self.config))
            .collect()
    }

    /// Fetch a node by identifier.
    ///
    /// Identifiers are unique across the whole table, so no group filter is
    /// needed here.
    pub async fn get_node(&self, conn: &Connection, id: &str) -> Result<Node, TreeError> {
        let sql = format!(
            "SELECT * FROM {} WHERE {} = ?",
            self.config.table(),
            self.config.id_col()
        );
        let nodes = self
            .fetch_nodes(conn, &sql, vec![libsql::Value::Text(id.to_owned())])
            .await?;
        nodes
            .into_iter()
            .next()
            .ok_or_else(|| TreeError::not_found(id))
    }

    /// All nodes, optionally confined to one group, ordered ascending by the
    /// left bound and capped at `limit` rows.
    pub async fn get_all(
        &self,
        conn: &Connection,
        group_id: Option<&str>,
        limit: u64,
    ) -> Result<Vec<Node>, TreeError> {
        let mut params = Vec::new();
        let group_filter = match group_id {
            Some(group) => {
                params.push(libsql::Value::Text(group.to_owned()));
                format!("WHERE {} = ?", self.config.group_col())
            }
            None => String::new(),
        };
        params.push(libsql::Value::Integer(limit.min(i64::MAX as u64) as i64));

        let sql = format!(
            "SELECT * FROM {} {} ORDER BY {} LIMIT ?",
            self.config.table(),
            group_filter,
            self.config.left_col()
        );
        self.fetch_nodes(conn, &sql, params).await
    }

    /// Nodes whose id never appears as another node's parent, within scope.
    pub async fn get_leaves(
        &self,
        conn: &Connection,
        group_id: Option<&str>,
    ) -> Result<Vec<Node>, TreeError> {
        let mut params = Vec::new();
        let (inner_filter, outer_filter) = match group_id {
            Some(group) => {
                params.push(libsql::Value::Text(group.to_owned()));
                params.push(libsql::Value::Text(group.to_owned()));
                (
                    format!("AND {} = ?", self.config.group_col()),
                    format!("AND {} = ?", self.config.group_col()),
                )
            }
            None => (String::new(), String::new()),
        };

        let sql = format!(
            "SELECT * FROM {table} \
             WHERE {id} NOT IN (SELECT {parent} FROM {table} WHERE {parent} IS NOT NULL {inner}) \
             {outer} ORDER BY {left}",
            table = self.config.table(),
            id = self.config.id_col(),
            parent = self.config.parent_col(),
            inner = inner_filter,
            outer = outer_filter,
            left = self.config.left_col(),
        );
        self.fetch_nodes(conn, &sql, params).await
    }

    /// True iff some node has `parent_id == node_id`.
    pub async fn has_children(&self, conn: &Connection, node_id: &str) -> Result<bool, TreeError> {
        let sql = format!(
            "SELECT {} FROM {} WHERE {} = ? LIMIT 1",
            self.config.id_col(),
            self.config.table(),
            self.config.parent_col()
        );
        debug!(sql = %sql, "tree query");
        let mut rows = conn
            .query(&sql, vec![libsql::Value::Text(node_id.to_owned())])
            .await?;
        Ok(rows.next().await?.is_some())
    }

    /// Direct children of `parent_id`, ordered by the left bound.
    pub async fn get_children_by_id(
        &self,
        conn: &Connection,
        parent_id: &str,
    ) -> Result<Vec<Node>, TreeError> {
        let sql = format!(
            "SELECT * FROM {} WHERE {} = ? ORDER BY {}",
            self.config.table(),
            self.config.parent_col(),
            self.config.left_col()
        );
        self.fetch_nodes(conn, &sql, vec![libsql::Value::Text(parent_id.to_owned())])
            .await
    }

    /// Children of `parent_id`, ordered by the left bound.
    ///
    /// With `direct_only` this matches [`Self::get_children_by_id`]; otherwise
    /// it returns all descendants, computed purely from interval containment
    /// (`left > parent.left AND right < parent.right`).
    pub async fn get_children(
        &self,
        conn: &Connection,
        parent_id: &str,
        direct_only: bool,
        group_id: Option<&str>,
    ) -> Result<Vec<Node>, TreeError> {
        let parent = self.get_node(conn, parent_id).await?;

        let mut params = vec![
            libsql::Value::Integer(parent.lft),
            libsql::Value::Integer(parent.rgt),
        ];
        let mut filters = String::new();
        if direct_only {
            filters.push_str(&format!(" AND {} = ?", self.config.parent_col()));
            params.push(libsql::Value::Text(parent_id.to_owned()));
        }
        if let Some(group) = group_id {
            filters.push_str(&format!(" AND {} = ?", self.config.group_col()));
            params.push(libsql::Value::Text(group.to_owned()));
        }

        let sql = format!(
            "SELECT * FROM {table} WHERE {left} > ? AND {right} < ?{filters} ORDER BY {left}",
            table = self.config.table(),
            left = self.config.left_col(),
            right = self.config.right_col(),
            filters = filters,
        );
        self.fetch_nodes(conn, &sql, params).await
    }

    /// Siblings of `node` whose interval lies after it: same parent, left
    /// bound strictly greater than `node`'s right bound, ordered by left.
    ///
    /// The insert walk uses this to find what must shift right. Roots have
    /// no siblings.
    pub async fn get_forward_siblings(
        &self,
        conn: &Connection,
        node: &Node,
        group_id: Option<&str>,
    ) -> Result<Vec<Node>, TreeError> {
        let Some(parent_id) = node.parent_id.as_deref() else {
            return Ok(Vec::new());
        };

        let mut params = vec![
            libsql::Value::Text(parent_id.to_owned()),
            libsql::Value::Integer(node.rgt),
            libsql::Value::Text(node.id.clone()),
        ];
        let group_filter = match group_id {
            Some(group) => {
                params.push(libsql::Value::Text(group.to_owned()));
                format!(" AND {} = ?", self.config.group_col())
            }
            None => String::new(),
        };

        let sql = format!(
            "SELECT * FROM {table} WHERE {parent} = ? AND {left} > ? AND {id} != ?{group} \
             ORDER BY {left}",
            table = self.config.table(),
            parent = self.config.parent_col(),
            left = self.config.left_col(),
            id = self.config.id_col(),
            group = group_filter,
        );
        self.fetch_nodes(conn, &sql, params).await
    }

    /// Equality filter over arbitrary columns, optionally group-scoped.
    pub async fn filter(
        &self,
        conn: &Connection,
        filters: &[(&str, serde_json::Value)],
        group_id: Option<&str>,
    ) -> Result<Vec<Node>, TreeError> {
        let mut conditions = Vec::new();
        let mut params = Vec::new();
        for (column, value) in filters {
            validate_identifier(column)?;
            conditions.push(format!("{} = ?", column));
            params.push(json_to_sql(value));
        }
        if let Some(group) = group_id {
            conditions.push(format!("{} = ?", self.config.group_col()));
            params.push(libsql::Value::Text(group.to_owned()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };
        let sql = format!(
            "SELECT * FROM {} {} ORDER BY {}",
            self.config.table(),
            where_clause,
            self.config.left_col()
        );
        self.fetch_nodes(conn, &sql, params).await
    }

    /// Insert a node, renumbering every interval the insertion displaces.
    ///
    /// A root (no `parent_id`) is only accepted into an empty tree (within
    /// its group) and gets the interval `[1, 2]`. A non-root is appended
    /// after its parent's existing children: it takes the parent's old right
    /// bound as its left, and every interval at or after that point shifts
    /// right by two - one slot for each new bound.
    ///
    /// The shift is executed as a depth-first walk over tagged events (see
    /// [`WalkEvent`]): the parent's own right bound closes two slots later
    /// (an `Exit`), each of the parent's forward siblings is fully
    /// renumbered (an `Enter` of its subtree), and when a level drains the
    /// walk climbs to the next ancestor until the root closes. Siblings and
    /// children are processed in ascending left order, which preserves
    /// sibling order across inserts.
    ///
    /// # Errors
    ///
    /// - [`TreeError::ParentMissing`] - root insert into a non-empty tree
    /// - [`TreeError::NotFound`] - `parent_id` does not exist
    /// - [`TreeError::RowNotCreated`] - the final insert affected no rows
    pub async fn insert(&self, conn: &Connection, new: NewNode) -> Result<Node, TreeError> {
        let Some(parent_id) = new.parent_id.clone() else {
            // Root case: only one root per tree (per group under scoping)
            let existing = self.get_all(conn, new.group_id.as_deref(), 1).await?;
            if !existing.is_empty() {
                return Err(TreeError::ParentMissing);
            }
            return self.create_node(conn, &new, 1, 2).await;
        };

        let parent = self.get_node(conn, &parent_id).await?;

        // The new node takes the parent's old right bound; everything from
        // that point on shifts right by two. These values stay correct after
        // the walk because the walk only reassigns bounds strictly greater
        // than the insertion point.
        let mut cur = parent.rgt;
        let new_lft = cur;
        let new_rgt = cur + 1;
        cur += 1;

        let mut stack: IntervalStack<WalkEvent> = IntervalStack::new();
        if parent.parent_id.is_some() {
            let siblings = self
                .get_forward_siblings(conn, &parent, parent.group_id.as_deref())
                .await?;
            // Reverse pushes so the LIFO pops siblings in ascending left order
            for sibling in siblings.into_iter().rev() {
                stack.push(WalkEvent::Enter(sibling));
            }
        }
        stack.push(WalkEvent::Exit(parent));

        while let Some(event) = stack.pop() {
            let visited = match event {
                WalkEvent::Exit(mut node) => {
                    cur += 1;
                    node.rgt = cur;
                    trace!(id = %node.id, rgt = node.rgt, "walk exit");
                    self.persist_interval(conn, &node.id, None, Some(node.rgt))
                        .await?;
                    node
                }
                WalkEvent::Enter(mut node) => {
                    cur += 1;
                    node.lft = cur;
                    trace!(id = %node.id, lft = node.lft, "walk enter");
                    if self.has_children(conn, &node.id).await? {
                        self.persist_interval(conn, &node.id, Some(node.lft), None)
                            .await?;
                        let children = self.get_children_by_id(conn, &node.id).await?;
                        stack.push(WalkEvent::Exit(node.clone()));
                        for child in children.into_iter().rev() {
                            stack.push(WalkEvent::Enter(child));
                        }
                    } else {
                        // A leaf closes immediately
                        cur += 1;
                        node.rgt = cur;
                        self.persist_interval(conn, &node.id, Some(node.lft), Some(node.rgt))
                            .await?;
                    }
                    node
                }
            };

            // Level drained: climb to the next ancestor and keep shifting its
            // right bound (and any of its own forward siblings) until the
            // root closes.
            if stack.is_empty() {
                if let Some(ancestor_id) = visited.parent_id.as_deref() {
                    let ancestor = self.get_node(conn, ancestor_id).await?;
                    if ancestor.parent_id.is_some() {
                        let siblings = self
                            .get_forward_siblings(conn, &ancestor, ancestor.group_id.as_deref())
                            .await?;
                        for sibling in siblings.into_iter().rev() {
                            stack.push(WalkEvent::Enter(sibling));
                        }
                    }
                    stack.push(WalkEvent::Exit(ancestor));
                }
            }
        }

        self.create_node(conn, &new, new_lft, new_rgt).await
    }

    /// Insert the row itself. Callers outside the engine go through
    /// [`Self::insert`], which computes the interval.
    async fn create_node(
        &self,
        conn: &Connection,
        new: &NewNode,
        lft: i64,
        rgt: i64,
    ) -> Result<Node, TreeError> {
        let mut columns = vec![
            self.config.id_col().to_owned(),
            self.config.left_col().to_owned(),
            self.config.right_col().to_owned(),
        ];
        let mut params = vec![
            libsql::Value::Text(Uuid::new_v4().to_string()),
            libsql::Value::Integer(lft),
            libsql::Value::Integer(rgt),
        ];
        if let Some(parent_id) = new.parent_id.as_deref() {
            columns.push(self.config.parent_col().to_owned());
            params.push(libsql::Value::Text(parent_id.to_owned()));
        }
        if let Some(group_id) = new.group_id.as_deref() {
            columns.push(self.config.group_col().to_owned());
            params.push(libsql::Value::Text(group_id.to_owned()));
        }
        for (column, value) in &new.fields {
            validate_identifier(column)?;
            columns.push(column.clone());
            params.push(json_to_sql(value));
        }

        let placeholders = vec!["?"; columns.len()].join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING *",
            self.config.table(),
            columns.join(", "),
            placeholders
        );
        debug!(sql = %sql, "tree insert");

        let rows = conn.query(&sql, params).await?;
        let records = record::collect_records(rows).await?;
        let record = records.into_iter().next().ok_or(TreeError::RowNotCreated)?;
        Node::from_record(record, &self.config)
    }

    /// Persist freshly assigned interval bound(s) for one node.
    async fn persist_interval(
        &self,
        conn: &Connection,
        id: &str,
        lft: Option<i64>,
        rgt: Option<i64>,
    ) -> Result<(), TreeError> {
        let mut assignments = Vec::new();
        let mut params = Vec::new();
        if let Some(lft) = lft {
            assignments.push(format!("{} = ?", self.config.left_col()));
            params.push(libsql::Value::Integer(lft));
        }
        if let Some(rgt) = rgt {
            assignments.push(format!("{} = ?", self.config.right_col()));
            params.push(libsql::Value::Integer(rgt));
        }
        params.push(libsql::Value::Text(id.to_owned()));

        let sql = format!(
            "UPDATE {} SET {} WHERE {} = ?",
            self.config.table(),
            assignments.join(", "),
            self.config.id_col()
        );
        debug!(sql = %sql, "tree update");
        conn.execute(&sql, params).await?;
        Ok(())
    }
}
