//! Database Connection Management
//!
//! Core connection and initialization functionality using libsql.
//!
//! # Database Connection Patterns
//!
//! **Always use `connect_with_timeout()` in async functions.** SQLite
//! connections have thread-affinity requirements, and the Tokio runtime moves
//! futures between threads at `.await` points. The 5-second busy timeout lets
//! concurrent operations wait and retry instead of failing immediately with
//! `SQLITE_BUSY`.
//!
//! Use `connect()` only in single-threaded, synchronous contexts where the
//! connection will not be held across await points.
//!
//! Tree operations themselves never open connections; they consume a handle
//! supplied by the caller, so the caller controls the transaction boundary.

use crate::db::error::DatabaseError;
use crate::tree::TreeConfig;
use libsql::{Builder, Database};
use std::path::PathBuf;
use std::sync::Arc;

/// Database service for managing the libsql connection and table setup
///
/// # Examples
///
/// ```no_run
/// use taxon_core::db::DatabaseService;
/// use std::path::PathBuf;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let db = DatabaseService::new(PathBuf::from("./data/taxon.db")).await?;
///     let conn = db.connect_with_timeout().await?;
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct DatabaseService {
    /// libsql database handle (wrapped in Arc for sharing)
    pub db: Arc<Database>,

    /// Path to the database file
    pub db_path: PathBuf,
}

impl DatabaseService {
    /// Create a new DatabaseService with the specified database path
    ///
    /// This will:
    /// 1. Ensure the parent directory exists (create if needed)
    /// 2. Open/create the database file
    /// 3. Enable SQLite features (WAL mode, busy timeout, foreign keys)
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the parent directory cannot be created,
    /// the connection fails, or a pragma fails.
    pub async fn new(db_path: PathBuf) -> Result<Self, DatabaseError> {
        // Ensure parent directory exists
        if let Some(parent) = db_path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    if e.kind() == std::io::ErrorKind::PermissionDenied {
                        DatabaseError::permission_denied(db_path.clone())
                    } else {
                        DatabaseError::DirectoryCreationFailed(e)
                    }
                })?;
            }
        }

        let db = Builder::new_local(&db_path)
            .build()
            .await
            .map_err(|e| DatabaseError::connection_failed(db_path.clone(), e))?;

        let service = Self {
            db: Arc::new(db),
            db_path,
        };

        service.configure().await?;

        Ok(service)
    }

    /// Execute a PRAGMA statement
    ///
    /// PRAGMA statements return rows, so query() must be used instead of
    /// execute().
    async fn execute_pragma(
        &self,
        conn: &libsql::Connection,
        pragma: &str,
    ) -> Result<(), DatabaseError> {
        let mut stmt = conn.prepare(pragma).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute '{}': {}", pragma, e))
        })?;
        let _ = stmt.query(()).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute '{}': {}", pragma, e))
        })?;
        Ok(())
    }

    /// Apply connection-level SQLite configuration
    ///
    /// - WAL mode: Write-Ahead Logging for better concurrency
    /// - Busy timeout: wait up to 5s instead of failing on lock
    /// - Foreign keys: enabled for referential integrity
    async fn configure(&self) -> Result<(), DatabaseError> {
        let conn = self.connect()?;

        self.execute_pragma(&conn, "PRAGMA journal_mode = WAL")
            .await?;
        self.execute_pragma(&conn, "PRAGMA busy_timeout = 5000")
            .await?;
        self.execute_pragma(&conn, "PRAGMA foreign_keys = ON")
            .await?;

        Ok(())
    }

    /// Get a synchronous connection handle
    pub fn connect(&self) -> Result<libsql::Connection, DatabaseError> {
        self.db.connect().map_err(DatabaseError::LibsqlError)
    }

    /// Get an async connection with busy timeout configured
    ///
    /// Recommended for all async functions and Tokio runtime contexts. Sets a
    /// 5-second busy timeout so concurrent operations wait and retry instead
    /// of failing immediately when the database is locked.
    pub async fn connect_with_timeout(&self) -> Result<libsql::Connection, DatabaseError> {
        let conn = self.connect()?;

        self.execute_pragma(&conn, "PRAGMA busy_timeout = 5000")
            .await?;

        Ok(conn)
    }

    /// Create the category table and its core indexes if they do not exist
    ///
    /// Structural columns (id, parent, group, left, right) come from the
    /// supplied [`TreeConfig`]; `extra_columns` is a list of
    /// `(name, sql_type)` pairs for caller-owned business columns. The
    /// statement is idempotent, so it is safe to call on every startup.
    ///
    /// # Schema
    ///
    /// - `id TEXT PRIMARY KEY` - identifiers are stored in canonical text form
    /// - parent column: `TEXT`, NULL for the root of a tree
    /// - group column: `TEXT`, NULL when the table is unscoped
    /// - left/right columns: `INTEGER NOT NULL`, maintained by the engine
    /// - indexes on parent, left, and group columns (hierarchy, ordering,
    ///   and tenant filters respectively)
    pub async fn ensure_tree_table(
        &self,
        config: &TreeConfig,
        extra_columns: &[(&str, &str)],
    ) -> Result<(), DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        let mut columns = vec![
            format!("{} TEXT PRIMARY KEY", config.id_col()),
            format!("{} TEXT", config.parent_col()),
            format!("{} TEXT", config.group_col()),
            format!("{} INTEGER NOT NULL", config.left_col()),
            format!("{} INTEGER NOT NULL", config.right_col()),
        ];
        for (name, sql_type) in extra_columns {
            columns.push(format!("{} {}", name, sql_type));
        }

        conn.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS {} ({})",
                config.table(),
                columns.join(", ")
            ),
            (),
        )
        .await
        .map_err(|e| {
            DatabaseError::sql_execution(format!(
                "Failed to create table '{}': {}",
                config.table(),
                e
            ))
        })?;

        // Index on the parent column (hierarchy queries)
        // Index on the left column (sibling/listing order)
        // Index on the group column (tenant filters)
        for col in [config.parent_col(), config.left_col(), config.group_col()] {
            conn.execute(
                &format!(
                    "CREATE INDEX IF NOT EXISTS idx_{table}_{col} ON {table}({col})",
                    table = config.table(),
                    col = col
                ),
                (),
            )
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to create index on '{}': {}", col, e))
            })?;
        }

        Ok(())
    }
}
