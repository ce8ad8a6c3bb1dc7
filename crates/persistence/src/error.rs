//! Error types for the persistence layer.
//!
//! This module defines all error types used throughout the persistence layer,
//! following a hierarchy that separates not-found conditions, per-project
//! gating, caller validation, pagination and backend failures.
//!
//! Only [`ResourceError`] and [`TenantError`] are meant to be branched on by
//! callers. Everything under [`BackendError`] is opaque: it carries the
//! backend name and the failing step, and is propagated without retries.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use thiserror::Error;

use crate::types::Id;

/// The primary error type for all storage operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Project or record absent.
    #[error(transparent)]
    Resource(#[from] ResourceError),

    /// Mutation blocked by a project flag.
    #[error(transparent)]
    Tenant(#[from] TenantError),

    /// Caller errors detected before touching the database.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Continuation token errors.
    #[error(transparent)]
    Search(#[from] SearchError),

    /// A commit failed and nothing was written.
    #[error(transparent)]
    Transaction(#[from] TransactionError),

    /// Backend-specific errors
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl StorageError {
    /// Returns `true` if the referenced project does not exist.
    pub fn is_project_not_found(&self) -> bool {
        matches!(
            self,
            StorageError::Resource(ResourceError::ProjectNotFound { .. })
        )
    }

    /// Returns `true` if the project exists but the record does not.
    pub fn is_record_not_found(&self) -> bool {
        matches!(
            self,
            StorageError::Resource(ResourceError::RecordNotFound { .. })
        )
    }

    /// Returns `true` if the operation is disabled for the project.
    pub fn is_disabled(&self) -> bool {
        matches!(
            self,
            StorageError::Tenant(TenantError::OperationDisabled { .. })
        )
    }
}

/// Errors related to missing rows.
#[derive(Error, Debug)]
pub enum ResourceError {
    #[error("project not found: {id}")]
    ProjectNotFound { id: Id },

    #[error("record not found: {project_id}/{id}")]
    RecordNotFound { project_id: Id, id: Id },
}

/// Errors related to per-project gating.
#[derive(Error, Debug)]
pub enum TenantError {
    /// The project's settings do not allow the operation.
    #[error("{operation} is disabled for project {project_id}")]
    OperationDisabled {
        project_id: Id,
        operation: &'static str,
    },
}

/// Errors caused by caller input.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// A field-mask update that selects no field.
    #[error("nothing to update")]
    NothingToUpdate,

    /// A batch create with no records.
    #[error("no records to create")]
    EmptyBatch,

    /// A batch create spanning more than one project.
    #[error("records must have the same project id")]
    MixedProjectBatch,

    /// A value violating a configured restriction.
    #[error("invalid {field}: {message}")]
    InvalidField { field: String, message: String },

    /// Text that is not a valid identifier.
    #[error("invalid id {value:?}: {message}")]
    InvalidId { value: String, message: String },
}

impl ValidationError {
    pub(crate) fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        ValidationError::InvalidField {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Errors related to pagination.
#[derive(Error, Debug)]
pub enum SearchError {
    /// Invalid cursor for pagination.
    #[error("invalid pagination cursor: {cursor}")]
    InvalidCursor { cursor: String },
}

/// Errors related to transactions.
#[derive(Error, Debug)]
pub enum TransactionError {
    /// Transaction was rolled back.
    #[error("transaction rolled back: {reason}")]
    RolledBack { reason: String },
}

/// Errors originating from the database backend.
#[derive(Error, Debug)]
pub enum BackendError {
    /// The backend is currently unavailable.
    #[error("backend unavailable: {backend_name}")]
    Unavailable {
        backend_name: String,
        message: String,
    },

    /// Connection to the backend failed.
    #[error("connection failed to {backend_name}: {message}")]
    ConnectionFailed {
        backend_name: String,
        message: String,
    },

    /// Connection pool exhausted.
    #[error("connection pool exhausted for {backend_name}")]
    PoolExhausted { backend_name: String },

    /// The requested capability is not supported by this backend.
    #[error("capability '{capability}' not supported by {backend_name}")]
    UnsupportedCapability {
        backend_name: String,
        capability: String,
    },

    /// Schema migration error.
    #[error("schema migration failed: {message}")]
    MigrationError { message: String },

    /// Internal backend error.
    #[error("internal error in {backend_name}: {message}")]
    Internal {
        backend_name: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Serialization/deserialization error.
    #[error("serialization error: {message}")]
    SerializationError { message: String },
}

/// Result type alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Backend(BackendError::SerializationError {
            message: err.to_string(),
        })
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        StorageError::Backend(BackendError::Internal {
            backend_name: "sqlite".to_string(),
            message: err.to_string(),
            source: Some(Box::new(err)),
        })
    }
}

#[cfg(feature = "sqlite")]
impl From<r2d2::Error> for StorageError {
    fn from(_err: r2d2::Error) -> Self {
        StorageError::Backend(BackendError::PoolExhausted {
            backend_name: "sqlite".to_string(),
        })
    }
}

#[cfg(feature = "postgres")]
impl From<tokio_postgres::Error> for StorageError {
    fn from(err: tokio_postgres::Error) -> Self {
        StorageError::Backend(BackendError::Internal {
            backend_name: "postgres".to_string(),
            message: err.to_string(),
            source: Some(Box::new(err)),
        })
    }
}
