//! PostgreSQL schema definitions and migrations.

use tokio_postgres::Transaction;

use crate::error::{BackendError, StorageError, StorageResult};

/// Current schema version.
pub const SCHEMA_VERSION: i32 = 1;

fn pg_error(message: String) -> StorageError {
    StorageError::Backend(BackendError::MigrationError { message })
}

/// Initialize the database schema.
///
/// `tenant_partitioning` selects partitioned or plain record tables and is
/// only consulted when the schema is created.
pub async fn initialize_schema(
    client: &mut deadpool_postgres::Client,
    tenant_partitioning: bool,
) -> StorageResult<()> {
    let tx = client
        .transaction()
        .await
        .map_err(|e| pg_error(format!("Failed to begin schema transaction: {}", e)))?;

    // Serializes concurrent initializers; released at commit.
    tx.batch_execute("SELECT pg_advisory_xact_lock(7412093)")
        .await
        .map_err(|e| pg_error(format!("Failed to acquire schema lock: {}", e)))?;

    let current_version = get_schema_version(&tx).await?;

    if current_version == 0 {
        create_schema_v1(&tx, tenant_partitioning).await?;
        set_schema_version(&tx, 1).await?;
        tracing::info!(
            version = SCHEMA_VERSION,
            tenant_partitioning,
            "Initialized PostgreSQL schema"
        );
    } else if current_version > SCHEMA_VERSION {
        return Err(pg_error(format!(
            "database schema version {} is newer than supported version {}",
            current_version, SCHEMA_VERSION
        )));
    }

    tx.commit()
        .await
        .map_err(|e| pg_error(format!("Failed to commit schema: {}", e)))?;

    Ok(())
}

/// Get the current schema version.
async fn get_schema_version(tx: &Transaction<'_>) -> StorageResult<i32> {
    tx.batch_execute(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER NOT NULL
        )",
    )
    .await
    .map_err(|e| pg_error(format!("Failed to create schema_version table: {}", e)))?;

    let row = tx
        .query_opt("SELECT version FROM schema_version LIMIT 1", &[])
        .await
        .map_err(|e| pg_error(format!("Failed to query schema version: {}", e)))?;

    Ok(row.map(|r| r.get::<_, i32>(0)).unwrap_or(0))
}

/// Set the schema version.
async fn set_schema_version(tx: &Transaction<'_>, version: i32) -> StorageResult<()> {
    tx.execute("DELETE FROM schema_version", &[])
        .await
        .map_err(|e| pg_error(format!("Failed to clear schema_version: {}", e)))?;

    tx.execute(
        "INSERT INTO schema_version (version) VALUES ($1)",
        &[&version],
    )
    .await
    .map_err(|e| pg_error(format!("Failed to set schema_version: {}", e)))?;

    Ok(())
}

/// Create the initial schema (version 1).
///
/// There is deliberately no foreign key from `records_resource_changes` to
/// `records`: dropping one partition of a referenced partitioned table
/// would have to re-validate the reference across every partition.
async fn create_schema_v1(tx: &Transaction<'_>, tenant_partitioning: bool) -> StorageResult<()> {
    let partition_clause = if tenant_partitioning {
        " PARTITION BY LIST (project_id)"
    } else {
        ""
    };

    tx.batch_execute(
        "CREATE TABLE IF NOT EXISTS projects (
            id UUID PRIMARY KEY,
            partition_number BIGINT GENERATED ALWAYS AS IDENTITY UNIQUE,
            create_time TIMESTAMPTZ NOT NULL,
            display_name TEXT NOT NULL,
            update_record_enabled BOOLEAN NULL,
            delete_record_enabled BOOLEAN NULL
        )",
    )
    .await
    .map_err(|e| pg_error(format!("Failed to create projects table: {}", e)))?;

    tx.batch_execute(&format!(
        "CREATE TABLE IF NOT EXISTS records (
            id UUID NOT NULL,
            project_id UUID NOT NULL REFERENCES projects (id),
            create_time TIMESTAMPTZ NOT NULL,
            labels JSONB NOT NULL DEFAULT '{{}}',
            resource_type TEXT NOT NULL,
            resource_id TEXT NOT NULL,
            resource_metadata JSONB NOT NULL DEFAULT '{{}}',
            operation_type TEXT NOT NULL,
            operation_id TEXT NOT NULL,
            operation_time TIMESTAMPTZ NOT NULL,
            operation_metadata JSONB NOT NULL DEFAULT '{{}}',
            operation_traceparent TEXT NULL,
            operation_tracestate TEXT NULL,
            operation_status INTEGER NOT NULL DEFAULT 0,
            actor_type TEXT NOT NULL,
            actor_id TEXT NOT NULL,
            actor_metadata JSONB NOT NULL DEFAULT '{{}}',
            PRIMARY KEY (project_id, id)
        ){partition_clause}"
    ))
    .await
    .map_err(|e| pg_error(format!("Failed to create records table: {}", e)))?;

    tx.batch_execute(
        "CREATE INDEX IF NOT EXISTS idx_records_operation_time
            ON records (project_id, operation_time DESC, id DESC);
         CREATE INDEX IF NOT EXISTS idx_records_labels
            ON records USING GIN (labels)",
    )
    .await
    .map_err(|e| pg_error(format!("Failed to create records indexes: {}", e)))?;

    tx.batch_execute(&format!(
        "CREATE TABLE IF NOT EXISTS records_resource_changes (
            record_id UUID NOT NULL,
            project_id UUID NOT NULL,
            position INTEGER NOT NULL,
            name TEXT NOT NULL,
            description TEXT NULL,
            old_value BYTEA NULL,
            new_value BYTEA NULL,
            PRIMARY KEY (project_id, record_id, position)
        ){partition_clause}"
    ))
    .await
    .map_err(|e| pg_error(format!("Failed to create records_resource_changes table: {}", e)))?;

    Ok(())
}
