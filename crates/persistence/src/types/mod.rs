//! Core types for the persistence layer.
//!
//! This module provides the domain types exchanged with the store:
//!
//! - [`Id`] - Time-ordered identifiers
//! - [`BoolValue`] - Tri-state flag for project settings
//! - [`Project`], [`Record`] - The two stored entities
//! - [`ProjectUpdate`], [`RecordUpdate`] - Field-mask updates
//! - [`RecordFilter`] - Record listing conditions
//! - [`ProjectCursor`], [`RecordCursor`] - Keyset pagination cursors
//!
//! # Examples
//!
//! ## Building a Record
//!
//! ```
//! use auditum_persistence::types::{Actor, Id, Operation, Record, Resource};
//! use chrono::Utc;
//!
//! let project_id = Id::new();
//! let record = Record::new(
//!     project_id,
//!     Resource::new("POST", "post-42"),
//!     Operation::new("UPDATE", "example.v1.PostService/UpdatePost", Utc::now()),
//!     Actor::new("USER", "user-82"),
//! )
//! .with_label("post_id", "post-42");
//!
//! assert_eq!(record.project_id, project_id);
//! assert_eq!(record.labels["post_id"], "post-42");
//! ```
//!
//! ## Filtering
//!
//! ```
//! use auditum_persistence::types::RecordFilter;
//!
//! let filter = RecordFilter::new()
//!     .label("post_id", "post-42")
//!     .resource("POST", Some("post-42"));
//! assert_eq!(filter.resource_id.as_deref(), Some("post-42"));
//! ```

mod bool_value;
mod id;
mod pagination;
mod project;
mod query;
mod record;

pub use bool_value::BoolValue;
pub use id::Id;
pub use pagination::{PageCursor, ProjectCursor, RecordCursor};
pub use project::Project;
pub use query::{ProjectUpdate, RecordFilter, RecordUpdate};
pub use record::{Actor, Operation, OperationStatus, Record, Resource, ResourceChange, TraceContext};
