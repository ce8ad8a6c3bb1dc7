//! Per-project list partitions.
//!
//! When tenant partitioning is enabled, `records` and
//! `records_resource_changes` are declared `PARTITION BY LIST (project_id)`
//! and every project gets one partition of each, named after the parent
//! table and the project's `partition_number`:
//!
//! ```text
//! records_ppn_1                   FOR VALUES IN ('<project 1 id>')
//! records_resource_changes_ppn_1  FOR VALUES IN ('<project 1 id>')
//! ```
//!
//! Partitions are created in the transaction that inserts the project and
//! dropped in the transaction that deletes it. Queries still filter on
//! `project_id`; partitioning only bounds scan cost and makes teardown a
//! constant number of DDL statements.

use tokio_postgres::Transaction;

use crate::error::{BackendError, StorageError, StorageResult};
use crate::types::Id;

/// Tables partitioned per project, in creation order.
pub const PARTITIONED_TABLES: [&str; 2] = ["records", "records_resource_changes"];

fn partition_error(message: String) -> StorageError {
    StorageError::Backend(BackendError::Internal {
        backend_name: "postgres".to_string(),
        message,
        source: None,
    })
}

/// Returns the name of a project's partition of `table`.
pub fn partition_table_name(table: &str, partition_number: i64) -> String {
    format!("{}_ppn_{}", table, partition_number)
}

/// Builds the DDL creating a project's partition of `parent_table`.
///
/// Partition bounds cannot be bound parameters, so the project id is
/// inlined. An [`Id`] only ever renders as hex digits and hyphens.
pub fn create_partition_sql(parent_table: &str, project_id: Id, partition_number: i64) -> String {
    format!(
        "CREATE TABLE {} PARTITION OF {} FOR VALUES IN ('{}')",
        partition_table_name(parent_table, partition_number),
        parent_table,
        project_id
    )
}

/// Builds the DDL dropping a project's partition of `parent_table`.
pub fn drop_partition_sql(parent_table: &str, partition_number: i64) -> String {
    format!(
        "DROP TABLE IF EXISTS {} CASCADE",
        partition_table_name(parent_table, partition_number)
    )
}

/// Creates a project's partition of `parent_table` inside `tx`.
pub async fn create_partition(
    tx: &Transaction<'_>,
    parent_table: &str,
    project_id: Id,
    partition_number: i64,
) -> StorageResult<()> {
    let sql = create_partition_sql(parent_table, project_id, partition_number);
    tx.batch_execute(&sql).await.map_err(|e| {
        partition_error(format!(
            "Failed to create partition {}: {}",
            partition_table_name(parent_table, partition_number),
            e
        ))
    })?;

    tracing::info!(
        table = parent_table,
        partition_number,
        project_id = %project_id,
        "Created partition"
    );
    Ok(())
}

/// Drops a project's partition of `parent_table` inside `tx`.
pub async fn drop_partition(
    tx: &Transaction<'_>,
    parent_table: &str,
    partition_number: i64,
) -> StorageResult<()> {
    let sql = drop_partition_sql(parent_table, partition_number);
    tx.batch_execute(&sql).await.map_err(|e| {
        partition_error(format!(
            "Failed to drop partition {}: {}",
            partition_table_name(parent_table, partition_number),
            e
        ))
    })?;

    tracing::info!(table = parent_table, partition_number, "Dropped partition");
    Ok(())
}
