//! SQLite schema definitions and migrations.

use rusqlite::Connection;

use crate::error::{BackendError, StorageError, StorageResult};

/// Current schema version.
pub const SCHEMA_VERSION: i32 = 1;

fn migration_error(message: String) -> StorageError {
    StorageError::Backend(BackendError::MigrationError { message })
}

/// Initialize the database schema.
pub fn initialize_schema(conn: &Connection) -> StorageResult<()> {
    let current_version = get_schema_version(conn)?;

    if current_version == 0 {
        create_schema_v1(conn)?;
        set_schema_version(conn, 1)?;
        tracing::info!(version = SCHEMA_VERSION, "Initialized SQLite schema");
    } else if current_version > SCHEMA_VERSION {
        return Err(migration_error(format!(
            "database schema version {} is newer than supported version {}",
            current_version, SCHEMA_VERSION
        )));
    }

    Ok(())
}

/// Get the current schema version.
fn get_schema_version(conn: &Connection) -> StorageResult<i32> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER NOT NULL
        )",
        [],
    )
    .map_err(|e| migration_error(format!("Failed to create schema_version table: {}", e)))?;

    let version: Option<i32> = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
            row.get(0)
        })
        .ok();

    Ok(version.unwrap_or(0))
}

/// Set the schema version.
fn set_schema_version(conn: &Connection, version: i32) -> StorageResult<()> {
    conn.execute("DELETE FROM schema_version", [])
        .map_err(|e| migration_error(format!("Failed to clear schema_version: {}", e)))?;

    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])
        .map_err(|e| migration_error(format!("Failed to set schema_version: {}", e)))?;

    Ok(())
}

/// Create the initial schema (version 1).
///
/// Ids are canonical hyphenated text and times fixed-width RFC 3339 UTC
/// text, so text order matches id and time order. Maps are JSON text.
fn create_schema_v1(conn: &Connection) -> StorageResult<()> {
    conn.execute_batch(
        "BEGIN;

        CREATE TABLE IF NOT EXISTS projects (
            partition_number INTEGER PRIMARY KEY AUTOINCREMENT,
            id TEXT NOT NULL UNIQUE,
            create_time TEXT NOT NULL,
            display_name TEXT NOT NULL,
            update_record_enabled INTEGER NULL,
            delete_record_enabled INTEGER NULL
        );

        CREATE TABLE IF NOT EXISTS records (
            id TEXT NOT NULL,
            project_id TEXT NOT NULL REFERENCES projects (id),
            create_time TEXT NOT NULL,
            labels TEXT NOT NULL DEFAULT '{}',
            resource_type TEXT NOT NULL,
            resource_id TEXT NOT NULL,
            resource_metadata TEXT NOT NULL DEFAULT '{}',
            operation_type TEXT NOT NULL,
            operation_id TEXT NOT NULL,
            operation_time TEXT NOT NULL,
            operation_metadata TEXT NOT NULL DEFAULT '{}',
            operation_traceparent TEXT NULL,
            operation_tracestate TEXT NULL,
            operation_status INTEGER NOT NULL DEFAULT 0,
            actor_type TEXT NOT NULL,
            actor_id TEXT NOT NULL,
            actor_metadata TEXT NOT NULL DEFAULT '{}',
            PRIMARY KEY (project_id, id)
        );

        CREATE INDEX IF NOT EXISTS idx_records_operation_time
            ON records (project_id, operation_time DESC, id DESC);

        CREATE TABLE IF NOT EXISTS records_resource_changes (
            record_id TEXT NOT NULL,
            project_id TEXT NOT NULL,
            position INTEGER NOT NULL,
            name TEXT NOT NULL,
            description TEXT NULL,
            old_value BLOB NULL,
            new_value BLOB NULL,
            PRIMARY KEY (project_id, record_id, position),
            FOREIGN KEY (project_id, record_id)
                REFERENCES records (project_id, id) ON DELETE CASCADE
        );

        COMMIT;",
    )
    .map_err(|e| migration_error(format!("Failed to create schema v1: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_database_gets_current_version() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();
        initialize_schema(&conn).unwrap();

        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn test_newer_schema_is_rejected() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();
        set_schema_version(&conn, SCHEMA_VERSION + 1).unwrap();

        let err = initialize_schema(&conn).unwrap_err();
        assert!(matches!(
            err,
            StorageError::Backend(BackendError::MigrationError { .. })
        ));
    }

    #[test]
    fn test_changes_cascade_with_record() {
        let conn = Connection::open_in_memory().unwrap();
        conn.pragma_update(None, "foreign_keys", true).unwrap();
        initialize_schema(&conn).unwrap();

        conn.execute_batch(
            "INSERT INTO projects (id, create_time, display_name)
                VALUES ('p', '2023-01-01T00:00:00.000000000Z', 'Project');
             INSERT INTO records (id, project_id, create_time, resource_type, resource_id,
                operation_type, operation_id, operation_time, actor_type, actor_id)
                VALUES ('r', 'p', '2023-01-01T00:00:00.000000000Z', 'POST', 'post-1',
                    'CREATE', 'CreatePost', '2023-01-01T00:00:00.000000000Z', 'USER', 'user-1');
             INSERT INTO records_resource_changes (record_id, project_id, position, name)
                VALUES ('r', 'p', 0, 'title');
             DELETE FROM records WHERE project_id = 'p' AND id = 'r';",
        )
        .unwrap();

        let changes: i64 = conn
            .query_row("SELECT COUNT(*) FROM records_resource_changes", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(changes, 0);
    }
}
