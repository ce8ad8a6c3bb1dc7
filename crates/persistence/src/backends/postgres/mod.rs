//! PostgreSQL backend implementation.
//!
//! This module provides a PostgreSQL implementation of
//! [`AuditStore`](crate::core::AuditStore). It uses connection pooling via
//! deadpool-postgres, JSONB for label and metadata maps, native TIMESTAMPTZ
//! for times and UUID columns for identifiers.
//!
//! # Features
//!
//! - Connection pooling with deadpool-postgres
//! - Label filters answered with JSONB containment (`labels @> $1`)
//! - Optional per-project list partitions, see [`partition`]
//! - Every multi-statement operation runs in one transaction
//!
//! # Example
//!
//! ```no_run
//! use auditum_persistence::backends::postgres::{PostgresBackend, PostgresConfig};
//! use auditum_persistence::core::AuditStore;
//! use auditum_persistence::types::Project;
//!
//! # async fn main_example() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = PostgresBackend::new(PostgresConfig::default()).await?;
//! backend.init_schema().await?;
//!
//! backend.create_project(&Project::new("Billing")).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE projects (
//!     id UUID PRIMARY KEY,
//!     partition_number BIGINT GENERATED ALWAYS AS IDENTITY UNIQUE,
//!     create_time TIMESTAMPTZ NOT NULL,
//!     display_name TEXT NOT NULL,
//!     update_record_enabled BOOLEAN NULL,
//!     delete_record_enabled BOOLEAN NULL
//! );
//!
//! CREATE TABLE records (
//!     id UUID NOT NULL,
//!     project_id UUID NOT NULL REFERENCES projects (id),
//!     -- resource_*, operation_*, actor_* columns, maps as JSONB
//!     PRIMARY KEY (project_id, id)
//! ) PARTITION BY LIST (project_id);
//!
//! CREATE TABLE records_resource_changes (
//!     record_id UUID NOT NULL,
//!     project_id UUID NOT NULL,
//!     position INTEGER NOT NULL,
//!     -- name, description, old_value, new_value
//!     PRIMARY KEY (project_id, record_id, position)
//! ) PARTITION BY LIST (project_id);
//! ```

mod backend;
pub mod partition;
mod rows;
pub(crate) mod schema;
mod storage;

pub use backend::{PostgresBackend, PostgresConfig, PostgresSslMode};
