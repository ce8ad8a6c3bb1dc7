//! SQLite backend implementation.
//!
//! This module provides a SQLite implementation of [`AuditStore`](crate::core::AuditStore).
//! It supports both in-memory databases (great for testing) and file-based
//! databases (for development and small deployments).
//!
//! All projects share one set of tables; there is no physical partitioning.
//!
//! # Example
//!
//! ```no_run
//! use auditum_persistence::backends::sqlite::SqliteBackend;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Create an in-memory database
//! let backend = SqliteBackend::in_memory()?;
//!
//! // Initialize the schema
//! backend.init_schema()?;
//! # Ok(())
//! # }
//! ```
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE projects (
//!     partition_number INTEGER PRIMARY KEY AUTOINCREMENT,
//!     id TEXT NOT NULL UNIQUE,
//!     create_time TEXT NOT NULL,
//!     display_name TEXT NOT NULL,
//!     update_record_enabled INTEGER NULL,
//!     delete_record_enabled INTEGER NULL
//! );
//!
//! CREATE TABLE records (
//!     id TEXT NOT NULL,
//!     project_id TEXT NOT NULL REFERENCES projects (id),
//!     -- resource_*, operation_*, actor_* columns, maps as JSON text
//!     PRIMARY KEY (project_id, id)
//! );
//!
//! CREATE TABLE records_resource_changes (
//!     record_id TEXT NOT NULL,
//!     project_id TEXT NOT NULL,
//!     position INTEGER NOT NULL,
//!     -- name, description, old_value, new_value
//!     PRIMARY KEY (project_id, record_id, position)
//! );
//! ```

mod backend;
mod rows;
mod schema;
mod storage;

pub use backend::{SqliteBackend, SqliteBackendConfig};
