//! The audit store contract.
//!
//! [`AuditStore`] is the single behavioral surface the transport layer
//! consumes. Every operation runs in exactly one database transaction and
//! either commits fully or leaves no trace.

use async_trait::async_trait;

use super::Backend;
use crate::error::StorageResult;
use crate::types::{
    Id, Project, ProjectCursor, ProjectUpdate, Record, RecordCursor, RecordFilter, RecordUpdate,
};

/// Persistence for projects and their audit records.
///
/// Every store is also a [`Backend`], so holders of a `dyn AuditStore` can
/// check health and capabilities without knowing the driver.
///
/// Callers generate ids and creation times before calling the create
/// operations, validate free-form input with
/// [`restrictions`](crate::restrictions), and translate cursors to and from
/// page tokens with [`PageCursor`](crate::types::PageCursor).
///
/// # Errors
///
/// Not-found conditions surface as
/// [`ResourceError`](crate::error::ResourceError) and feature-flag
/// rejections as [`TenantError::OperationDisabled`](crate::error::TenantError::OperationDisabled).
/// Everything the database reports is wrapped in
/// [`BackendError`](crate::error::BackendError) and never retried.
///
/// # Example
///
/// ```no_run
/// use auditum_persistence::backends::sqlite::SqliteBackend;
/// use auditum_persistence::core::AuditStore;
/// use auditum_persistence::types::{Project, ProjectCursor};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = SqliteBackend::in_memory()?;
/// store.init_schema()?;
///
/// let project = Project::new("Billing");
/// store.create_project(&project).await?;
///
/// let page = store.list_projects(20, &ProjectCursor::default()).await?;
/// assert_eq!(page.len(), 1);
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait AuditStore: Backend {
    /// Inserts a project.
    ///
    /// On backends with tenant partitioning the project's partitions are
    /// created in the same transaction; if that fails nothing is inserted.
    async fn create_project(&self, project: &Project) -> StorageResult<()>;

    /// Reads a project.
    ///
    /// # Errors
    ///
    /// * `ResourceError::ProjectNotFound` - if no project has this id
    async fn get_project(&self, id: Id) -> StorageResult<Project>;

    /// Lists projects by id, newest first, starting strictly after `cursor`.
    async fn list_projects(&self, limit: u32, cursor: &ProjectCursor)
    -> StorageResult<Vec<Project>>;

    /// Writes the selected project fields and returns the updated project.
    ///
    /// # Errors
    ///
    /// * `ValidationError::NothingToUpdate` - if `update` selects nothing
    /// * `ResourceError::ProjectNotFound` - if no project has this id
    async fn update_project(&self, id: Id, update: &ProjectUpdate) -> StorageResult<Project>;

    /// Inserts one record and its resource changes.
    ///
    /// # Errors
    ///
    /// * `ResourceError::ProjectNotFound` - if the owning project is missing
    async fn create_record(&self, record: &Record) -> StorageResult<()>;

    /// Inserts a batch of records belonging to one project.
    ///
    /// Every record is stored with the first record's `create_time`.
    ///
    /// # Errors
    ///
    /// * `ValidationError::EmptyBatch` - if `records` is empty
    /// * `ValidationError::MixedProjectBatch` - if project ids differ
    /// * `ResourceError::ProjectNotFound` - if the owning project is missing
    async fn create_records(&self, records: &[Record]) -> StorageResult<()>;

    /// Reads a record with its resource changes.
    ///
    /// # Errors
    ///
    /// * `ResourceError::ProjectNotFound` - checked first
    /// * `ResourceError::RecordNotFound`
    async fn get_record(&self, project_id: Id, id: Id) -> StorageResult<Record>;

    /// Lists a project's records matching `filter`, ordered by operation time
    /// then id, both descending, starting strictly after `cursor`.
    async fn list_records(
        &self,
        project_id: Id,
        filter: &RecordFilter,
        limit: u32,
        cursor: &RecordCursor,
    ) -> StorageResult<Vec<Record>>;

    /// Writes the selected record groups and returns the updated record.
    ///
    /// Blocked only when the project's `update_record_enabled` is explicitly
    /// false. Selecting the resource group replaces all resource changes.
    ///
    /// # Errors
    ///
    /// * `ResourceError::ProjectNotFound`
    /// * `TenantError::OperationDisabled`
    /// * `ValidationError::NothingToUpdate`
    /// * `ResourceError::RecordNotFound`
    async fn update_record(&self, project_id: Id, id: Id, update: &RecordUpdate)
    -> StorageResult<Record>;

    /// Deletes a record.
    ///
    /// Allowed only when the project's `delete_record_enabled` is explicitly
    /// true. Deleting a missing record is not an error.
    ///
    /// # Errors
    ///
    /// * `ResourceError::ProjectNotFound`
    /// * `TenantError::OperationDisabled`
    async fn delete_record(&self, project_id: Id, id: Id) -> StorageResult<()>;
}
