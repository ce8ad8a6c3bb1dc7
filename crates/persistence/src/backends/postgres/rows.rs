//! Row mappers for PostgreSQL.

use std::collections::BTreeMap;

use postgres_types::Json;
use tokio_postgres::Row;
use uuid::Uuid;

use crate::error::{BackendError, StorageError, StorageResult};
use crate::types::{
    Actor, BoolValue, Id, Operation, OperationStatus, Project, Record, Resource, ResourceChange,
    TraceContext,
};

pub(super) const PROJECT_COLUMNS: &str =
    "id, create_time, display_name, update_record_enabled, delete_record_enabled";

pub(super) const RECORD_COLUMNS: &str = "id, project_id, create_time, labels, \
     resource_type, resource_id, resource_metadata, \
     operation_type, operation_id, operation_time, operation_metadata, \
     operation_traceparent, operation_tracestate, operation_status, \
     actor_type, actor_id, actor_metadata";

pub(super) const CHANGE_COLUMNS: &str = "record_id, name, description, old_value, new_value";

fn column_error(column: &str, e: impl std::fmt::Display) -> StorageError {
    StorageError::Backend(BackendError::Internal {
        backend_name: "postgres".to_string(),
        message: format!("Failed to read column {}: {}", column, e),
        source: None,
    })
}

fn id_column(row: &Row, column: &str) -> StorageResult<Id> {
    row.try_get::<_, Uuid>(column)
        .map(Id::from)
        .map_err(|e| column_error(column, e))
}

fn map_column(row: &Row, column: &str) -> StorageResult<BTreeMap<String, String>> {
    row.try_get::<_, Json<BTreeMap<String, String>>>(column)
        .map(|json| json.0)
        .map_err(|e| column_error(column, e))
}

fn try_column<'a, T: tokio_postgres::types::FromSql<'a>>(
    row: &'a Row,
    column: &str,
) -> StorageResult<T> {
    row.try_get(column).map_err(|e| column_error(column, e))
}

/// Wraps a label or metadata map for a JSONB parameter.
pub(super) fn json_map(map: &BTreeMap<String, String>) -> Json<BTreeMap<String, String>> {
    Json(map.clone())
}

/// Maps a row selected with [`PROJECT_COLUMNS`].
pub(super) fn project_from_row(row: &Row) -> StorageResult<Project> {
    Ok(Project {
        id: id_column(row, "id")?,
        create_time: try_column(row, "create_time")?,
        display_name: try_column(row, "display_name")?,
        update_record_enabled: BoolValue::from(try_column::<Option<bool>>(
            row,
            "update_record_enabled",
        )?),
        delete_record_enabled: BoolValue::from(try_column::<Option<bool>>(
            row,
            "delete_record_enabled",
        )?),
    })
}

/// Maps a row selected with [`RECORD_COLUMNS`]. Resource changes are loaded
/// separately.
pub(super) fn record_from_row(row: &Row) -> StorageResult<Record> {
    let status: i32 = try_column(row, "operation_status")?;
    let status = OperationStatus::try_from(status)
        .map_err(|code| column_error("operation_status", format!("unknown status {}", code)))?;

    Ok(Record {
        id: id_column(row, "id")?,
        project_id: id_column(row, "project_id")?,
        create_time: try_column(row, "create_time")?,
        labels: map_column(row, "labels")?,
        resource: Resource {
            r#type: try_column(row, "resource_type")?,
            id: try_column(row, "resource_id")?,
            metadata: map_column(row, "resource_metadata")?,
            changes: Vec::new(),
        },
        operation: Operation {
            r#type: try_column(row, "operation_type")?,
            id: try_column(row, "operation_id")?,
            time: try_column(row, "operation_time")?,
            metadata: map_column(row, "operation_metadata")?,
            trace_context: TraceContext {
                traceparent: try_column(row, "operation_traceparent")?,
                tracestate: try_column(row, "operation_tracestate")?,
            },
            status,
        },
        actor: Actor {
            r#type: try_column(row, "actor_type")?,
            id: try_column(row, "actor_id")?,
            metadata: map_column(row, "actor_metadata")?,
        },
    })
}

/// Maps a row selected with [`CHANGE_COLUMNS`] to its record id and change.
pub(super) fn change_from_row(row: &Row) -> StorageResult<(Id, ResourceChange)> {
    Ok((
        id_column(row, "record_id")?,
        ResourceChange {
            name: try_column(row, "name")?,
            description: try_column(row, "description")?,
            old_value: try_column(row, "old_value")?,
            new_value: try_column(row, "new_value")?,
        },
    ))
}
