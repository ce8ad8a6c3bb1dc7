//! Auditum Persistence Layer
//!
//! This crate stores and queries audit records: immutable descriptions of
//! "who did what to which resource, when, and in what trace context",
//! grouped into tenant projects. It supports multiple database backends via
//! feature flags and keeps tenants apart either by a `project_id` key on
//! shared tables or by physical per-project partitions.
//!
//! # Features
//!
//! - **Two Backends**: SQLite (shared tables) and PostgreSQL (list partitions per project)
//! - **Keyset Pagination**: stable pages ordered by operation time and id, with opaque tokens
//! - **Field-Mask Updates**: only the selected top-level groups of a record change
//! - **Per-Project Gating**: record updates and deletions switched per project
//! - **Input Restrictions**: configurable size limits and W3C trace-context checks
//!
//! # Backend Features
//!
//! Enable backends with feature flags in `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! auditum-persistence = { version = "0.1", features = ["postgres"] }
//! ```
//!
//! Available backend features:
//! - `sqlite` (default) - SQLite with in-memory and file modes
//! - `postgres` - PostgreSQL with JSONB labels and tenant partitioning
//!
//! # Architecture
//!
//! - [`types`] - Identifiers, projects, records, filters and cursors
//! - [`restrictions`] - Validation of caller input against size limits
//! - [`error`] - Error types for all operations
//! - [`core`] - The [`AuditStore`] and [`Backend`] traits
//! - [`backends`] - Backend implementations (SQLite, PostgreSQL)
//! - [`config`] - Backend selection and [`open_store`](config::open_store)
//!
//! # Quick Start
//!
//! ```no_run
//! use auditum_persistence::config::{open_store, StoreConfig};
//! use auditum_persistence::restrictions::{validate_record, RecordsRestrictions};
//! use auditum_persistence::types::{
//!     Actor, Operation, PageCursor, Project, Record, RecordCursor, RecordFilter, Resource,
//! };
//! use chrono::Utc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = open_store(&StoreConfig::default()).await?;
//!
//! let project = Project::new("Blog");
//! store.create_project(&project).await?;
//!
//! let record = Record::new(
//!     project.id,
//!     Resource::new("POST", "post-42"),
//!     Operation::new("UPDATE", "example.v1.PostService/UpdatePost", Utc::now()),
//!     Actor::new("USER", "user-82"),
//! )
//! .with_label("post_id", "post-42");
//! validate_record(&record, &RecordsRestrictions::default())?;
//! store.create_record(&record).await?;
//!
//! let filter = RecordFilter::new().label("post_id", "post-42");
//! let page = store
//!     .list_records(project.id, &filter, 20, &RecordCursor::default())
//!     .await?;
//! let next_token = RecordCursor::next_page(&page, 20).encode();
//! assert!(next_token.is_empty());
//! # Ok(())
//! # }
//! ```
//!
//! # Pagination
//!
//! Page tokens are opaque strings. An empty token means "first page" on the
//! way in and "no further pages" on the way out:
//!
//! ```
//! use auditum_persistence::types::{Id, PageCursor, ProjectCursor};
//!
//! let cursor = ProjectCursor { last_id: Some(Id::from_u128(9)) };
//! let token = cursor.encode();
//! assert_eq!(ProjectCursor::decode(&token).unwrap(), cursor);
//! assert!(ProjectCursor::decode("%%%").is_err());
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod backends;
pub mod config;
pub mod core;
pub mod error;
pub mod restrictions;
pub mod types;

// Re-export commonly used types at crate root
pub use config::{open_store, StoreConfig, StoreKind};
pub use error::{StorageError, StorageResult};
pub use types::{Id, Project, Record};

// Re-export core traits
pub use core::{AuditStore, Backend, BackendCapability, BackendKind};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
