//! Database Layer
//!
//! This module handles connection management and row conversion for the
//! libsql backend:
//!
//! - Database initialization and connection management
//! - Row to generic record conversion (NULL normalization)
//! - Value binding for caller-supplied columns

mod database;
mod error;
pub(crate) mod record;

pub use database::DatabaseService;
pub use error::DatabaseError;
pub use record::Record;
