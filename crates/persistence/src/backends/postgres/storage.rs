//! AuditStore implementation for PostgreSQL.

use std::collections::HashMap;

use async_trait::async_trait;
use postgres_types::{Json, ToSql};
use tokio_postgres::Transaction;
use uuid::Uuid;

use crate::core::{AuditStore, Backend, BackendCapability};
use crate::error::{
    BackendError, ResourceError, StorageError, StorageResult, TenantError, TransactionError,
    ValidationError,
};
use crate::types::{
    Id, Project, ProjectCursor, ProjectUpdate, Record, RecordCursor, RecordFilter, RecordUpdate,
    ResourceChange,
};

use super::partition::{self, PARTITIONED_TABLES};
use super::rows::{
    change_from_row, json_map, project_from_row, record_from_row, CHANGE_COLUMNS,
    PROJECT_COLUMNS, RECORD_COLUMNS,
};
use super::PostgresBackend;

fn internal_error(message: String) -> StorageError {
    StorageError::Backend(BackendError::Internal {
        backend_name: "postgres".to_string(),
        message,
        source: None,
    })
}

fn commit_error(message: String) -> StorageError {
    StorageError::Transaction(TransactionError::RolledBack { reason: message })
}

/// Numbered placeholder list for dynamically built statements.
struct PgParams {
    values: Vec<Box<dyn ToSql + Sync + Send>>,
}

impl PgParams {
    fn new() -> Self {
        Self { values: Vec::new() }
    }

    /// Adds a value and returns its placeholder.
    fn push<T: ToSql + Sync + Send + 'static>(&mut self, value: T) -> String {
        self.values.push(Box::new(value));
        format!("${}", self.values.len())
    }

    fn refs(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.values
            .iter()
            .map(|p| p.as_ref() as &(dyn ToSql + Sync))
            .collect()
    }
}

fn uuid(id: Id) -> Uuid {
    *id.as_uuid()
}

#[async_trait]
impl AuditStore for PostgresBackend {
    async fn create_project(&self, project: &Project) -> StorageResult<()> {
        let mut client = self.get_client().await?;
        let tx = client
            .transaction()
            .await
            .map_err(|e| internal_error(format!("Failed to begin transaction: {}", e)))?;

        let sql = "INSERT INTO projects
             (id, create_time, display_name, update_record_enabled, delete_record_enabled)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING partition_number";
        self.log_query(sql);
        let row = tx
            .query_one(
                sql,
                &[
                    &uuid(project.id),
                    &project.create_time,
                    &project.display_name,
                    &project.update_record_enabled.to_option(),
                    &project.delete_record_enabled.to_option(),
                ],
            )
            .await
            .map_err(|e| internal_error(format!("Failed to insert project: {}", e)))?;
        let partition_number: i64 = row
            .try_get(0)
            .map_err(|e| internal_error(format!("Failed to read partition number: {}", e)))?;

        if self.supports(BackendCapability::TenantPartitioning) {
            for table in PARTITIONED_TABLES {
                partition::create_partition(&tx, table, project.id, partition_number).await?;
            }
        }

        tx.commit()
            .await
            .map_err(|e| commit_error(format!("Failed to commit project: {}", e)))?;

        tracing::info!(project_id = %project.id, partition_number, "Created project");
        Ok(())
    }

    async fn get_project(&self, id: Id) -> StorageResult<Project> {
        let client = self.get_client().await?;
        let sql = format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1");
        self.log_query(&sql);

        let row = client
            .query_opt(&sql, &[&uuid(id)])
            .await
            .map_err(|e| internal_error(format!("Failed to read project: {}", e)))?
            .ok_or(StorageError::Resource(ResourceError::ProjectNotFound { id }))?;
        project_from_row(&row)
    }

    async fn list_projects(
        &self,
        limit: u32,
        cursor: &ProjectCursor,
    ) -> StorageResult<Vec<Project>> {
        let client = self.get_client().await?;
        let mut params = PgParams::new();

        let mut sql = format!("SELECT {PROJECT_COLUMNS} FROM projects");
        if let Some(last_id) = cursor.last_id {
            sql.push_str(&format!(" WHERE id < {}", params.push(uuid(last_id))));
        }
        sql.push_str(&format!(
            " ORDER BY id DESC LIMIT {}",
            params.push(i64::from(limit))
        ));
        self.log_query(&sql);

        let rows = client
            .query(&sql, params.refs().as_slice())
            .await
            .map_err(|e| internal_error(format!("Failed to list projects: {}", e)))?;
        rows.iter().map(project_from_row).collect()
    }

    async fn update_project(&self, id: Id, update: &ProjectUpdate) -> StorageResult<Project> {
        if update.is_empty() {
            return Err(ValidationError::NothingToUpdate.into());
        }

        let mut params = PgParams::new();
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
            params.push(uuid(id)),
        );
        self.log_query(&sql);

        let client = self.get_client().await?;
        let row = client
            .query_opt(&sql, params.refs().as_slice())
            .await
            .map_err(|e| internal_error(format!("Failed to update project: {}", e)))?
            .ok_or(StorageError::Resource(ResourceError::ProjectNotFound { id }))?;
        project_from_row(&row)
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

        let mut client = self.get_client().await?;
        let tx = client
            .transaction()
            .await
            .map_err(|e| internal_error(format!("Failed to begin transaction: {}", e)))?;

        self.ensure_project(&tx, project_id).await?;

        let create_time = first.create_time;
        let sql = format!(
            "INSERT INTO records ({RECORD_COLUMNS})
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)"
        );
        self.log_query(&sql);
        let stmt = tx
            .prepare(&sql)
            .await
            .map_err(|e| internal_error(format!("Failed to prepare insert: {}", e)))?;

        for record in records {
            let operation = &record.operation;
            let labels = json_map(&record.labels);
            let resource_metadata = json_map(&record.resource.metadata);
            let operation_metadata = json_map(&operation.metadata);
            let actor_metadata = json_map(&record.actor.metadata);
            tx.execute(
                &stmt,
                &[
                    &uuid(record.id),
                    &uuid(project_id),
                    &create_time,
                    &labels,
                    &record.resource.r#type,
                    &record.resource.id,
                    &resource_metadata,
                    &operation.r#type,
                    &operation.id,
                    &operation.time,
                    &operation_metadata,
                    &operation.trace_context.traceparent,
                    &operation.trace_context.tracestate,
                    &operation.status.as_i32(),
                    &record.actor.r#type,
                    &record.actor.id,
                    &actor_metadata,
                ],
            )
            .await
            .map_err(|e| internal_error(format!("Failed to insert record: {}", e)))?;
        }

        for record in records {
            self.insert_changes(&tx, project_id, record.id, &record.resource.changes)
                .await?;
        }

        tx.commit()
            .await
            .map_err(|e| commit_error(format!("Failed to commit records: {}", e)))?;

        tracing::debug!(project_id = %project_id, count = records.len(), "Created records");
        Ok(())
    }

    async fn get_record(&self, project_id: Id, id: Id) -> StorageResult<Record> {
        let mut client = self.get_client().await?;
        let tx = client
            .transaction()
            .await
            .map_err(|e| internal_error(format!("Failed to begin transaction: {}", e)))?;

        self.ensure_project(&tx, project_id).await?;
        let record = self.read_record(&tx, project_id, id).await?;

        tx.commit()
            .await
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
        let mut params = PgParams::new();
        let mut conditions = vec![format!("project_id = {}", params.push(uuid(project_id)))];

        if !filter.labels.is_empty() {
            conditions.push(format!(
                "labels @> {}",
                params.push(Json(filter.labels.clone()))
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

        if let Some(from) = filter.operation_time_from {
            conditions.push(format!("operation_time >= {}", params.push(from)));
        }
        if let Some(to) = filter.operation_time_to {
            conditions.push(format!("operation_time < {}", params.push(to)));
        }

        if let Some((last_time, last_id)) = cursor.keyset()? {
            conditions.push(format!("operation_time < {}", params.push(last_time)));
            conditions.push(format!("id < {}", params.push(uuid(last_id))));
        }

        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM records WHERE {}
             ORDER BY operation_time DESC, id DESC LIMIT {}",
            conditions.join(" AND "),
            params.push(i64::from(limit)),
        );
        self.log_query(&sql);

        let mut client = self.get_client().await?;
        let tx = client
            .transaction()
            .await
            .map_err(|e| internal_error(format!("Failed to begin transaction: {}", e)))?;

        self.ensure_project(&tx, project_id).await?;

        let rows = tx
            .query(&sql, params.refs().as_slice())
            .await
            .map_err(|e| internal_error(format!("Failed to list records: {}", e)))?;
        let mut records = rows
            .iter()
            .map(record_from_row)
            .collect::<StorageResult<Vec<_>>>()?;

        let ids: Vec<Id> = records.iter().map(|r| r.id).collect();
        let mut changes = self.load_changes(&tx, project_id, &ids).await?;
        for record in &mut records {
            record.resource.changes = changes.remove(&record.id).unwrap_or_default();
        }

        tx.commit()
            .await
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

        let mut params = PgParams::new();
        let mut sets = Vec::new();

        if let Some(labels) = &update.labels {
            sets.push(format!("labels = {}", params.push(json_map(labels))));
        }
        if let Some(resource) = &update.resource {
            sets.push(format!("resource_type = {}", params.push(resource.r#type.clone())));
            sets.push(format!("resource_id = {}", params.push(resource.id.clone())));
            sets.push(format!(
                "resource_metadata = {}",
                params.push(json_map(&resource.metadata))
            ));
        }
        if let Some(operation) = &update.operation {
            sets.push(format!("operation_type = {}", params.push(operation.r#type.clone())));
            sets.push(format!("operation_id = {}", params.push(operation.id.clone())));
            sets.push(format!("operation_time = {}", params.push(operation.time)));
            sets.push(format!(
                "operation_metadata = {}",
                params.push(json_map(&operation.metadata))
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
                params.push(json_map(&actor.metadata))
            ));
        }

        let sql = format!(
            "UPDATE records SET {} WHERE project_id = {} AND id = {}",
            sets.join(", "),
            params.push(uuid(project_id)),
            params.push(uuid(id)),
        );

        let mut client = self.get_client().await?;
        let tx = client
            .transaction()
            .await
            .map_err(|e| internal_error(format!("Failed to begin transaction: {}", e)))?;

        let project = self.project_in_tx(&tx, project_id).await?;
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
            .await
            .map_err(|e| internal_error(format!("Failed to update record: {}", e)))?;
        if updated == 0 {
            return Err(ResourceError::RecordNotFound { project_id, id }.into());
        }

        if let Some(resource) = &update.resource {
            self.delete_changes(&tx, project_id, id).await?;
            self.insert_changes(&tx, project_id, id, &resource.changes)
                .await?;
        }

        let record = self.read_record(&tx, project_id, id).await?;

        tx.commit()
            .await
            .map_err(|e| commit_error(format!("Failed to commit record update: {}", e)))?;
        Ok(record)
    }

    async fn delete_record(&self, project_id: Id, id: Id) -> StorageResult<()> {
        let mut client = self.get_client().await?;
        let tx = client
            .transaction()
            .await
            .map_err(|e| internal_error(format!("Failed to begin transaction: {}", e)))?;

        let project = self.project_in_tx(&tx, project_id).await?;
        if !project.delete_record_enabled.is_true() {
            return Err(TenantError::OperationDisabled {
                project_id,
                operation: "delete record",
            }
            .into());
        }

        self.delete_changes(&tx, project_id, id).await?;

        let sql = "DELETE FROM records WHERE project_id = $1 AND id = $2";
        self.log_query(sql);
        tx.execute(sql, &[&uuid(project_id), &uuid(id)])
            .await
            .map_err(|e| internal_error(format!("Failed to delete record: {}", e)))?;

        tx.commit()
            .await
            .map_err(|e| commit_error(format!("Failed to commit record delete: {}", e)))?;
        Ok(())
    }
}

impl PostgresBackend {
    /// Deletes a project with all of its records.
    ///
    /// With tenant partitioning the project's partitions are dropped;
    /// otherwise its rows are deleted.
    pub async fn drop_project(&self, id: Id) -> StorageResult<()> {
        let mut client = self.get_client().await?;
        let tx = client
            .transaction()
            .await
            .map_err(|e| internal_error(format!("Failed to begin transaction: {}", e)))?;

        let sql = "SELECT partition_number FROM projects WHERE id = $1 FOR UPDATE";
        self.log_query(sql);
        let partition_number: i64 = tx
            .query_opt(sql, &[&uuid(id)])
            .await
            .map_err(|e| internal_error(format!("Failed to read project: {}", e)))?
            .ok_or(StorageError::Resource(ResourceError::ProjectNotFound { id }))?
            .try_get(0)
            .map_err(|e| internal_error(format!("Failed to read partition number: {}", e)))?;

        if self.supports(BackendCapability::TenantPartitioning) {
            for table in PARTITIONED_TABLES {
                partition::drop_partition(&tx, table, partition_number).await?;
            }
        } else {
            for sql in [
                "DELETE FROM records_resource_changes WHERE project_id = $1",
                "DELETE FROM records WHERE project_id = $1",
            ] {
                self.log_query(sql);
                tx.execute(sql, &[&uuid(id)])
                    .await
                    .map_err(|e| internal_error(format!("Failed to drop project: {}", e)))?;
            }
        }

        let sql = "DELETE FROM projects WHERE id = $1";
        self.log_query(sql);
        tx.execute(sql, &[&uuid(id)])
            .await
            .map_err(|e| internal_error(format!("Failed to drop project: {}", e)))?;

        tx.commit()
            .await
            .map_err(|e| commit_error(format!("Failed to commit project drop: {}", e)))?;

        tracing::info!(project_id = %id, partition_number, "Dropped project");
        Ok(())
    }

    async fn project_in_tx(&self, tx: &Transaction<'_>, id: Id) -> StorageResult<Project> {
        let sql = format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1");
        self.log_query(&sql);
        let row = tx
            .query_opt(&sql, &[&uuid(id)])
            .await
            .map_err(|e| internal_error(format!("Failed to read project: {}", e)))?
            .ok_or(StorageError::Resource(ResourceError::ProjectNotFound { id }))?;
        project_from_row(&row)
    }

    async fn ensure_project(&self, tx: &Transaction<'_>, id: Id) -> StorageResult<()> {
        let sql = "SELECT 1 FROM projects WHERE id = $1";
        self.log_query(sql);
        let exists = tx
            .query_opt(sql, &[&uuid(id)])
            .await
            .map_err(|e| internal_error(format!("Failed to check project: {}", e)))?
            .is_some();

        if !exists {
            return Err(ResourceError::ProjectNotFound { id }.into());
        }
        Ok(())
    }

    async fn read_record(
        &self,
        tx: &Transaction<'_>,
        project_id: Id,
        id: Id,
    ) -> StorageResult<Record> {
        let sql = format!("SELECT {RECORD_COLUMNS} FROM records WHERE project_id = $1 AND id = $2");
        self.log_query(&sql);

        let row = tx
            .query_opt(&sql, &[&uuid(project_id), &uuid(id)])
            .await
            .map_err(|e| internal_error(format!("Failed to read record: {}", e)))?
            .ok_or(StorageError::Resource(ResourceError::RecordNotFound {
                project_id,
                id,
            }))?;
        let mut record = record_from_row(&row)?;

        record.resource.changes = self
            .load_changes(tx, project_id, &[id])
            .await?
            .remove(&id)
            .unwrap_or_default();
        Ok(record)
    }

    async fn insert_changes(
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
             VALUES ($1, $2, $3, $4, $5, $6, $7)";
        self.log_query(sql);
        let stmt = tx
            .prepare(sql)
            .await
            .map_err(|e| internal_error(format!("Failed to prepare insert: {}", e)))?;

        for (position, change) in changes.iter().enumerate() {
            let position = position as i32;
            tx.execute(
                &stmt,
                &[
                    &uuid(record_id),
                    &uuid(project_id),
                    &position,
                    &change.name,
                    &change.description,
                    &change.old_value,
                    &change.new_value,
                ],
            )
            .await
            .map_err(|e| internal_error(format!("Failed to insert resource change: {}", e)))?;
        }

        Ok(())
    }

    async fn delete_changes(
        &self,
        tx: &Transaction<'_>,
        project_id: Id,
        record_id: Id,
    ) -> StorageResult<()> {
        let sql = "DELETE FROM records_resource_changes WHERE project_id = $1 AND record_id = $2";
        self.log_query(sql);
        tx.execute(sql, &[&uuid(project_id), &uuid(record_id)])
            .await
            .map_err(|e| internal_error(format!("Failed to delete resource changes: {}", e)))?;
        Ok(())
    }

    /// Loads the resource changes of `record_ids`, grouped by record, each
    /// group in stored order.
    async fn load_changes(
        &self,
        tx: &Transaction<'_>,
        project_id: Id,
        record_ids: &[Id],
    ) -> StorageResult<HashMap<Id, Vec<ResourceChange>>> {
        let mut grouped: HashMap<Id, Vec<ResourceChange>> = HashMap::new();
        if record_ids.is_empty() {
            return Ok(grouped);
        }

        let ids: Vec<Uuid> = record_ids.iter().copied().map(uuid).collect();
        let sql = format!(
            "SELECT {CHANGE_COLUMNS}
             FROM records_resource_changes
             WHERE project_id = $1 AND record_id = ANY($2)
             ORDER BY record_id, position"
        );
        self.log_query(&sql);

        let rows = tx
            .query(&sql, &[&uuid(project_id), &ids])
            .await
            .map_err(|e| internal_error(format!("Failed to load resource changes: {}", e)))?;

        for row in &rows {
            let (record_id, change) = change_from_row(row)?;
            grouped.entry(record_id).or_default().push(change);
        }

        Ok(grouped)
    }
}

