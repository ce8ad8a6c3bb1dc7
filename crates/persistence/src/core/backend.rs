//! Backend abstraction for database drivers.
//!
//! This module defines the [`Backend`] trait implemented by each relational
//! driver. It covers connection handling and schema lifecycle; the audit
//! operations themselves live on [`AuditStore`](super::AuditStore).

use std::fmt::Debug;

use async_trait::async_trait;

use crate::error::BackendError;

/// Identifies the type of database backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// SQLite database (file-based or in-memory).
    Sqlite,
    /// PostgreSQL database.
    Postgres,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::Sqlite => write!(f, "sqlite"),
            BackendKind::Postgres => write!(f, "postgres"),
        }
    }
}

/// Capabilities that a backend may support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendCapability {
    /// One physical partition per project, created and dropped with it.
    TenantPartitioning,
}

impl std::fmt::Display for BackendCapability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendCapability::TenantPartitioning => write!(f, "tenant-partitioning"),
        }
    }
}

/// A database backend.
///
/// # Example
///
/// ```ignore
/// use auditum_persistence::core::{Backend, BackendCapability};
///
/// if backend.supports(BackendCapability::TenantPartitioning) {
///     // Per-project partitions are created with each project.
/// }
/// ```
#[async_trait]
pub trait Backend: Send + Sync + Debug {
    /// Returns the kind of backend.
    fn kind(&self) -> BackendKind;

    /// Returns a human-readable name for this backend.
    fn name(&self) -> &'static str;

    /// Checks if this backend supports the given capability.
    fn supports(&self, capability: BackendCapability) -> bool;

    /// Returns all capabilities supported by this backend.
    fn capabilities(&self) -> Vec<BackendCapability>;

    /// Checks if the backend is healthy and accepting connections.
    async fn health_check(&self) -> Result<(), BackendError>;

    /// Brings the schema up to the current version. Safe to repeat.
    async fn migrate(&self) -> Result<(), BackendError>;
}
