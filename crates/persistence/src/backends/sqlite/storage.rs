//! AuditStore implementation for SQLite.

use std::collections::HashMap;

use async_trait::async_trait;
use rusqlite::{params, OptionalExtension, ToSql, Transaction, TransactionBehavior};

use crate::core::AuditStore;
use crate::error::{
    BackendError, ResourceError, StorageError, StorageResult, TenantError, TransactionError,
    ValidationError,
};
use crate::types::{
    Id, Project, ProjectCursor, ProjectUpdate, Record, RecordCursor, RecordFilter, RecordUpdate,
    ResourceChange,
};

use super::rows::{
    format_time, map_to_json, project_from_row, record_from_row, PROJECT_COLUMNS, RECORD_COLUMNS,
};
use super::SqliteBackend;

fn internal_error(message: String) -> StorageError {
    StorageError::Backend(BackendError::Internal {
        backend_name: "sqlite".to_string(),
        message,
        source: None,
    })
}

fn commit_error(message: String) -> StorageError {
    StorageError::Transaction(TransactionError::RolledBack { reason: message })
}

/// Numbered placeholder list for dynamically built statements.
struct SqlParams {
    values: Vec<Box<dyn ToSql>>,
}

impl SqlParams {
    fn new() -> Self {
        Self { values: Vec::new() }
    }

    /// Adds a value and returns its placeholder.
    fn push<T: ToSql + 'static>(&mut self, value: T) -> String {
        self.values.push(Box::new(value));
        format!("?{}", self.values.len())
    }

    fn refs(&self) -> Vec<&dyn ToSql> {
        self.values.iter().map(|p| p.as_ref()).collect()
    }
}

#[async_trait]
impl AuditStore for SqliteBackend {
    async fn create_project(&self, project: &Project) -> StorageResult<()> {
        let mut conn = self.get_connection()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| internal_error(format!("Failed to begin transaction: {}", e)))?;

        let sql = "INSERT INTO projects
             (id, create_time, display_name, update_record_enabled, delete_record_enabled)
             VALUES (?1, ?2, ?3, ?4, ?5)";
        self.log_query(sql);
        tx.execute(
            sql,
            params![
                project.id,
                format_time(&project.create_time),
                project.display_name,
                project.update_record_enabled.to_option(),
                project.delete_record_enabled.to_option(),
            ],
        )
        .map_err(|e| internal_error(format!("Failed to insert project: {}", e)))?;

        tx.commit()
            .map_err(|e| commit_error(format!("Failed to commit project: {}", e)))?;

        tracing::info!(project_id = %project.id, "Created project");
        Ok(())
    }

    async fn get_project(&self, id: Id) -> StorageResult<Project> {
        let conn = self.get_connection()?;
        let sql = format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ?1");
        self.log_query(&sql);

        conn.query_row(&sql, [id], project_from_row)
            .optional()
            .map_err(|e| internal_error(format!("Failed to read project: {}", e)))?
            .ok_or_else(|| StorageError::Resource(ResourceError::ProjectNotFound { id }))
    }

    async fn list_projects(
        &self,
        limit: u32,
        cursor: &ProjectCursor,
    ) -> StorageResult<Vec<Project>> {
        let conn = self.get_connection()?;
        let mut params = SqlParams::new();

        let mut sql = format!("SELECT {PROJECT_COLUMNS} FROM projects");
        if let Some(last_id) = cursor.last_id {
            sql.push_str(&format!(" WHERE id < {}", params.push(last_id)));
        }
        sql.push_str(&format!(" ORDER BY id DESC LIMIT {}", params.push(limit)));
        self.log_query(&sql);

        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| internal_error(format!("Failed to prepare query: {}", e)))?;
        let projects = stmt
            .query_map(params.refs().as_slice(), project_from_row)
            .map_err(|e| internal_error(format!("Failed to list projects: {}", e)))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| internal_error(format!("Failed to read project row: {}", e)))?;

        Ok(projects)
    }

    async fn update_project(&self, id: Id, update: &ProjectUpdate) -> StorageResult<Project> {
        if update.is_empty() {
            return Err(ValidationError::NothingToUpdate.into());
        }

        let mut params = SqlParams::new();
        let mut sets = Vec::new();
        if let Some(display_name) = &update.display_name {
            sets.push(format!("display_name = {}", params.push(display_name.clone())));
        }
        if let Some(value) = update.update_record_enabled {
            sets.push(format!(
                "update_record_enabled = {}",
                params.push(value.to_option())
            ));
        }
        if let Some(value) = update.delete_record_enabled {
            sets.push(format!(
                "delete_record_enabled = {}",
                params.push(value.to_option())
            ));
        }

        let sql = format!(
            "UPDATE projects SET {} WHERE id = {} RETURNING {PROJECT_COLUMNS}",
            sets.join(", "),
            params.push(id),
        );
        self.log_query(&sql);

        let mut conn = self.get_connection()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| internal_error(format!("Failed to begin transaction: {}", e)))?;

        let project = tx
            .query_row(&sql, params.refs().as_slice(), project_from_row)
            .optional()
            .map_err(|e| internal_error(format!("Failed to update project: {}", e)))?
            .ok_or(StorageError::Resource(ResourceError::ProjectNotFound { id }))?;

        tx.commit()
            .map_err(|e| commit_error(format!("Failed to commit project update: {}", e)))?;

        Ok(project)
    }

    async fn create_record(&self, record: &Record) -> StorageResult<()> {
        self.create_records(std::slice::from_ref(record)).await
    }

    async fn create_records(&self, records: &[Record]) -> StorageResult<()> {
        let Some(first) = records.first() else {
            return Err(ValidationError::EmptyBatch.into());
        };
        let project_id = first.project_id;
        if records.iter().any(|r| r.project_id != project_id) {
            return Err(ValidationError::MixedProjectBatch.into());
        }

        let mut conn = self.get_connection()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| internal_error(format!("Failed to begin transaction: {}", e)))?;

        self.ensure_project(&tx, project_id)?;

        let create_time = format_time(&first.create_time);
        let sql = format!(
            "INSERT INTO records ({RECORD_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)"
        );
        self.log_query(&sql);
        {
            let mut stmt = tx
                .prepare_cached(&sql)
                .map_err(|e| internal_error(format!("Failed to prepare insert: {}", e)))?;
            for record in records {
                let operation = &record.operation;
                stmt.execute(params![
                    record.id,
                    project_id,
                    create_time,
                    map_to_json(&record.labels)?,
                    record.resource.r#type,
                    record.resource.id,
                    map_to_json(&record.resource.metadata)?,
                    operation.r#type,
                    operation.id,
                    format_time(&operation.time),
                    map_to_json(&operation.metadata)?,
                    operation.trace_context.traceparent,
                    operation.trace_context.tracestate,
                    operation.status.as_i32(),
                    record.actor.r#type,
                    record.actor.id,
                    map_to_json(&record.actor.metadata)?,
                ])
                .map_err(|e| internal_error(format!("Failed to insert record: {}", e)))?;
            }
        }

        for record in records {
            self.insert_changes(&tx, project_id, record.id, &record.resource.changes)?;
        }

        tx.commit()
            .map_err(|e| commit_error(format!("Failed to commit records: {}", e)))?;

        tracing::debug!(project_id = %project_id, count = records.len(), "Created records");
        Ok(())
    }

    async fn get_record(&self, project_id: Id, id: Id) -> StorageResult<Record> {
        let mut conn = self.get_connection()?;
        let tx = conn
            .transaction()
            .map_err(|e| internal_error(format!("Failed to begin transaction: {}", e)))?;

        self.ensure_project(&tx, project_id)?;
        let record = self.read_record(&tx, project_id, id)?;

        tx.commit()
            .map_err(|e| commit_error(format!("Failed to commit read: {}", e)))?;
        Ok(record)
    }

    async fn list_records(
        &self,
        project_id: Id,
        filter: &RecordFilter,
        limit: u32,
        cursor: &RecordCursor,
    ) -> StorageResult<Vec<Record>> {
        let mut params = SqlParams::new();
        let mut conditions = vec![format!("project_id = {}", params.push(project_id))];

        for (key, value) in &filter.labels {
            conditions.push(format!(
                "EXISTS (SELECT 1 FROM json_each(records.labels) WHERE key = {} AND value = {})",
                params.push(key.clone()),
                params.push(value.clone()),
            ));
        }

        let equalities = [
            ("resource_type", &filter.resource_type),
            ("resource_id", &filter.resource_id),
            ("operation_type", &filter.operation_type),
            ("operation_id", &filter.operation_id),
            ("actor_type", &filter.actor_type),
            ("actor_id", &filter.actor_id),
        ];
        for (column, value) in equalities {
            if let Some(value) = value.as_ref().filter(|value| !value.is_empty()) {
                conditions.push(format!("{column} = {}", params.push(value.clone())));
            }
        }

        if let Some(from) = &filter.operation_time_from {
            conditions.push(format!("operation_time >= {}", params.push(format_time(from))));
        }
        if let Some(to) = &filter.operation_time_to {
            conditions.push(format!("operation_time < {}", params.push(format_time(to))));
        }

        if let Some((last_time, last_id)) = cursor.keyset()? {
            conditions.push(format!(
                "operation_time < {}",
                params.push(format_time(&last_time))
            ));
            conditions.push(format!("id < {}", params.push(last_id)));
        }

        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM records WHERE {}
             ORDER BY operation_time DESC, id DESC LIMIT {}",
            conditions.join(" AND "),
            params.push(limit),
        );
        self.log_query(&sql);

        let mut conn = self.get_connection()?;
        let tx = conn
            .transaction()
            .map_err(|e| internal_error(format!("Failed to begin transaction: {}", e)))?;

        self.ensure_project(&tx, project_id)?;

        let mut records = {
            let mut stmt = tx
                .prepare(&sql)
                .map_err(|e| internal_error(format!("Failed to prepare query: {}", e)))?;
            stmt.query_map(params.refs().as_slice(), record_from_row)
                .map_err(|e| internal_error(format!("Failed to list records: {}", e)))?
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| internal_error(format!("Failed to read record row: {}", e)))?
        };

        let ids: Vec<Id> = records.iter().map(|r| r.id).collect();
        let mut changes = self.load_changes(&tx, project_id, &ids)?;
        for record in &mut records {
            record.resource.changes = changes.remove(&record.id).unwrap_or_default();
        }

        tx.commit()
            .map_err(|e| commit_error(format!("Failed to commit read: {}", e)))?;
        Ok(records)
    }

    async fn update_record(
        &self,
        project_id: Id,
        id: Id,
        update: &RecordUpdate,
    ) -> StorageResult<Record> {
        if update.is_empty() {
            return Err(ValidationError::NothingToUpdate.into());
        }

        let mut params = SqlParams::new();
        let mut sets = Vec::new();

        if let Some(labels) = &update.labels {
            sets.push(format!("labels = {}", params.push(map_to_json(labels)?)));
        }
        if let Some(resource) = &update.resource {
            sets.push(format!("resource_type = {}", params.push(resource.r#type.clone())));
            sets.push(format!("resource_id = {}", params.push(resource.id.clone())));
            sets.push(format!(
                "resource_metadata = {}",
                params.push(map_to_json(&resource.metadata)?)
            ));
        }
        if let Some(operation) = &update.operation {
            sets.push(format!("operation_type = {}", params.push(operation.r#type.clone())));
            sets.push(format!("operation_id = {}", params.push(operation.id.clone())));
            sets.push(format!(
                "operation_time = {}",
                params.push(format_time(&operation.time))
            ));
            sets.push(format!(
                "operation_metadata = {}",
                params.push(map_to_json(&operation.metadata)?)
            ));
            sets.push(format!(
                "operation_traceparent = {}",
                params.push(operation.trace_context.traceparent.clone())
            ));
            sets.push(format!(
                "operation_tracestate = {}",
                params.push(operation.trace_context.tracestate.clone())
            ));
            sets.push(format!(
                "operation_status = {}",
                params.push(operation.status.as_i32())
            ));
        }
        if let Some(actor) = &update.actor {
            sets.push(format!("actor_type = {}", params.push(actor.r#type.clone())));
            sets.push(format!("actor_id = {}", params.push(actor.id.clone())));
            sets.push(format!(
                "actor_metadata = {}",
                params.push(map_to_json(&actor.metadata)?)
            ));
        }

        let sql = format!(
            "UPDATE records SET {} WHERE project_id = {} AND id = {}",
            sets.join(", "),
            params.push(project_id),
            params.push(id),
        );

        let mut conn = self.get_connection()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| internal_error(format!("Failed to begin transaction: {}", e)))?;

        let project = self.project_in_tx(&tx, project_id)?;
        if project.update_record_enabled.is_false() {
            return Err(TenantError::OperationDisabled {
                project_id,
                operation: "update record",
            }
            .into());
        }

        self.log_query(&sql);
        let updated = tx
            .execute(&sql, params.refs().as_slice())
            .map_err(|e| internal_error(format!("Failed to update record: {}", e)))?;
        if updated == 0 {
            return Err(ResourceError::RecordNotFound { project_id, id }.into());
        }

        if let Some(resource) = &update.resource {
            self.delete_changes(&tx, project_id, id)?;
            self.insert_changes(&tx, project_id, id, &resource.changes)?;
        }

        let record = self.read_record(&tx, project_id, id)?;

        tx.commit()
            .map_err(|e| commit_error(format!("Failed to commit record update: {}", e)))?;
        Ok(record)
    }

    async fn delete_record(&self, project_id: Id, id: Id) -> StorageResult<()> {
        let mut conn = self.get_connection()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| internal_error(format!("Failed to begin transaction: {}", e)))?;

        let project = self.project_in_tx(&tx, project_id)?;
        if !project.delete_record_enabled.is_true() {
            return Err(TenantError::OperationDisabled {
                project_id,
                operation: "delete record",
            }
            .into());
        }

        self.delete_changes(&tx, project_id, id)?;

        let sql = "DELETE FROM records WHERE project_id = ?1 AND id = ?2";
        self.log_query(sql);
        tx.execute(sql, params![project_id, id])
            .map_err(|e| internal_error(format!("Failed to delete record: {}", e)))?;

        tx.commit()
            .map_err(|e| commit_error(format!("Failed to commit record delete: {}", e)))?;
        Ok(())
    }
}

impl SqliteBackend {
    /// Deletes a project with all of its records.
    pub fn drop_project(&self, id: Id) -> StorageResult<()> {
        let mut conn = self.get_connection()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| internal_error(format!("Failed to begin transaction: {}", e)))?;

        self.ensure_project(&tx, id)?;

        for sql in [
            "DELETE FROM records_resource_changes WHERE project_id = ?1",
            "DELETE FROM records WHERE project_id = ?1",
            "DELETE FROM projects WHERE id = ?1",
        ] {
            self.log_query(sql);
            tx.execute(sql, [id])
                .map_err(|e| internal_error(format!("Failed to drop project: {}", e)))?;
        }

        tx.commit()
            .map_err(|e| commit_error(format!("Failed to commit project drop: {}", e)))?;

        tracing::info!(project_id = %id, "Dropped project");
        Ok(())
    }

    fn project_in_tx(&self, tx: &Transaction<'_>, id: Id) -> StorageResult<Project> {
        let sql = format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ?1");
        self.log_query(&sql);
        tx.query_row(&sql, [id], project_from_row)
            .optional()
            .map_err(|e| internal_error(format!("Failed to read project: {}", e)))?
            .ok_or_else(|| StorageError::Resource(ResourceError::ProjectNotFound { id }))
    }

    fn ensure_project(&self, tx: &Transaction<'_>, id: Id) -> StorageResult<()> {
        let sql = "SELECT 1 FROM projects WHERE id = ?1";
        self.log_query(sql);
        let exists = tx
            .query_row(sql, [id], |_| Ok(()))
            .optional()
            .map_err(|e| internal_error(format!("Failed to check project: {}", e)))?
            .is_some();

        if !exists {
            return Err(ResourceError::ProjectNotFound { id }.into());
        }
        Ok(())
    }

    fn read_record(&self, tx: &Transaction<'_>, project_id: Id, id: Id) -> StorageResult<Record> {
        let sql = format!("SELECT {RECORD_COLUMNS} FROM records WHERE project_id = ?1 AND id = ?2");
        self.log_query(&sql);

        let mut record = tx
            .query_row(&sql, params![project_id, id], record_from_row)
            .optional()
            .map_err(|e| internal_error(format!("Failed to read record: {}", e)))?
            .ok_or(StorageError::Resource(ResourceError::RecordNotFound {
                project_id,
                id,
            }))?;

        record.resource.changes = self
            .load_changes(tx, project_id, &[id])?
            .remove(&id)
            .unwrap_or_default();
        Ok(record)
    }

    fn insert_changes(
        &self,
        tx: &Transaction<'_>,
        project_id: Id,
        record_id: Id,
        changes: &[ResourceChange],
    ) -> StorageResult<()> {
        if changes.is_empty() {
            return Ok(());
        }

        let sql = "INSERT INTO records_resource_changes
             (record_id, project_id, position, name, description, old_value, new_value)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)";
        self.log_query(sql);
        let mut stmt = tx
            .prepare_cached(sql)
            .map_err(|e| internal_error(format!("Failed to prepare insert: {}", e)))?;

        for (position, change) in changes.iter().enumerate() {
            stmt.execute(params![
                record_id,
                project_id,
                position as i64,
                change.name,
                change.description,
                change.old_value,
                change.new_value,
            ])
            .map_err(|e| internal_error(format!("Failed to insert resource change: {}", e)))?;
        }

        Ok(())
    }

    fn delete_changes(
        &self,
        tx: &Transaction<'_>,
        project_id: Id,
        record_id: Id,
    ) -> StorageResult<()> {
        let sql = "DELETE FROM records_resource_changes WHERE project_id = ?1 AND record_id = ?2";
        self.log_query(sql);
        tx.execute(sql, params![project_id, record_id])
            .map_err(|e| internal_error(format!("Failed to delete resource changes: {}", e)))?;
        Ok(())
    }

    /// Loads the resource changes of `record_ids`, grouped by record, each
    /// group in stored order.
    fn load_changes(
        &self,
        tx: &Transaction<'_>,
        project_id: Id,
        record_ids: &[Id],
    ) -> StorageResult<HashMap<Id, Vec<ResourceChange>>> {
        let mut grouped: HashMap<Id, Vec<ResourceChange>> = HashMap::new();
        if record_ids.is_empty() {
            return Ok(grouped);
        }

        // One JSON array parameter keeps large pages under the bound variable limit.
        let ids: Vec<String> = record_ids.iter().map(Id::to_string).collect();
        let ids = serde_json::to_string(&ids)
            .map_err(|e| internal_error(format!("Failed to encode record ids: {}", e)))?;

        let sql = "SELECT record_id, name, description, old_value, new_value
             FROM records_resource_changes
             WHERE project_id = ?1 AND record_id IN (SELECT value FROM json_each(?2))
             ORDER BY record_id, position";
        self.log_query(sql);

        let mut stmt = tx
            .prepare(sql)
            .map_err(|e| internal_error(format!("Failed to prepare query: {}", e)))?;
        let rows = stmt
            .query_map(params![project_id, ids], |row| {
                let record_id: Id = row.get(0)?;
                Ok((
                    record_id,
                    ResourceChange {
                        name: row.get(1)?,
                        description: row.get(2)?,
                        old_value: row.get(3)?,
                        new_value: row.get(4)?,
                    },
                ))
            })
            .map_err(|e| internal_error(format!("Failed to load resource changes: {}", e)))?;

        for row in rows {
            let (record_id, change) =
                row.map_err(|e| internal_error(format!("Failed to read change row: {}", e)))?;
            grouped.entry(record_id).or_default().push(change);
        }

        Ok(grouped)
    }
}
