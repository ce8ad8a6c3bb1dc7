//! Core storage traits and abstractions.
//!
//! - [`Backend`] - Database driver abstraction
//! - [`AuditStore`] - Project and record operations
//!
//! Both relational backends implement both traits. Code that only needs the
//! audit operations should depend on `dyn AuditStore`, which is what
//! [`open_store`](crate::config::open_store) returns.

pub mod backend;
pub mod store;

pub use backend::{Backend, BackendCapability, BackendKind};
pub use store::AuditStore;
