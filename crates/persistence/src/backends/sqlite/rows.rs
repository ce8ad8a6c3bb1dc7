//! Column encodings and row mappers for SQLite.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, Type, ValueRef};
use rusqlite::Row;

use crate::types::{
    Actor, BoolValue, Id, Operation, OperationStatus, Project, Record, Resource, TraceContext,
};

pub(super) const PROJECT_COLUMNS: &str =
    "id, create_time, display_name, update_record_enabled, delete_record_enabled";

pub(super) const RECORD_COLUMNS: &str = "id, project_id, create_time, labels, \
     resource_type, resource_id, resource_metadata, \
     operation_type, operation_id, operation_time, operation_metadata, \
     operation_traceparent, operation_tracestate, operation_status, \
     actor_type, actor_id, actor_metadata";

impl ToSql for Id {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.to_string()))
    }
}

impl FromSql for Id {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = value.as_str()?;
        Id::parse(text).map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

/// Fixed-width RFC 3339 in UTC with nanoseconds, so text order is time order.
pub(super) fn format_time(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn time_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let text: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&text)
        .map(|time| time.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(super) fn map_to_json(map: &BTreeMap<String, String>) -> serde_json::Result<String> {
    serde_json::to_string(map)
}

fn map_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<BTreeMap<String, String>> {
    let text: String = row.get(idx)?;
    serde_json::from_str(&text)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn bool_value_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<BoolValue> {
    let value: Option<bool> = row.get(idx)?;
    Ok(BoolValue::from(value))
}

/// Maps a row selected with [`PROJECT_COLUMNS`].
pub(super) fn project_from_row(row: &Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get(0)?,
        create_time: time_column(row, 1)?,
        display_name: row.get(2)?,
        update_record_enabled: bool_value_column(row, 3)?,
        delete_record_enabled: bool_value_column(row, 4)?,
    })
}

/// Maps a row selected with [`RECORD_COLUMNS`]. Resource changes are loaded
/// separately.
pub(super) fn record_from_row(row: &Row<'_>) -> rusqlite::Result<Record> {
    let status: i32 = row.get(13)?;
    let status = OperationStatus::try_from(status)
        .map_err(|code| rusqlite::Error::IntegralValueOutOfRange(13, code as i64))?;

    Ok(Record {
        id: row.get(0)?,
        project_id: row.get(1)?,
        create_time: time_column(row, 2)?,
        labels: map_column(row, 3)?,
        resource: Resource {
            r#type: row.get(4)?,
            id: row.get(5)?,
            metadata: map_column(row, 6)?,
            changes: Vec::new(),
        },
        operation: Operation {
            r#type: row.get(7)?,
            id: row.get(8)?,
            time: time_column(row, 9)?,
            metadata: map_column(row, 10)?,
            trace_context: TraceContext {
                traceparent: row.get(11)?,
                tracestate: row.get(12)?,
            },
            status,
        },
        actor: Actor {
            r#type: row.get(14)?,
            id: row.get(15)?,
            metadata: map_column(row, 16)?,
        },
    })
}
