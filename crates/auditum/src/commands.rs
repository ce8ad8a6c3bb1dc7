//! Subcommand execution against an opened store.

use serde_json::{Value, json};
use tracing::info;

use auditum_persistence::{AuditStore, Backend};
use auditum_persistence::restrictions::validate_project_display_name;
use auditum_persistence::types::{
    PageCursor, Project, ProjectCursor, ProjectUpdate, RecordCursor,
};

use crate::config::{Command, ListRecordsArgs, PageArgs, ProjectsCommand, RecordsCommand};
use crate::output;

const DEFAULT_PAGE_SIZE: u32 = 10;
const MAX_PAGE_SIZE: u32 = 100;

/// Resolves a requested page size: 0 selects the default, larger values
/// are capped.
pub fn page_size(requested: u32) -> u32 {
    match requested {
        0 => DEFAULT_PAGE_SIZE,
        n => n.min(MAX_PAGE_SIZE),
    }
}

/// Runs `command` and returns its JSON result.
pub async fn run(command: &Command, store: &dyn AuditStore) -> anyhow::Result<Value> {
    match command {
        Command::Migrate => {
            // Opening the store already migrated it.
            store.health_check().await?;
            let capabilities: Vec<String> =
                store.capabilities().iter().map(ToString::to_string).collect();
            Ok(json!({
                "backend": store.kind().to_string(),
                "capabilities": capabilities,
                "schema": "up to date",
            }))
        }
        Command::Projects(command) => run_projects(command, store).await,
        Command::Records(command) => run_records(command, store).await,
    }
}

async fn run_projects(command: &ProjectsCommand, store: &dyn AuditStore) -> anyhow::Result<Value> {
    match command {
        ProjectsCommand::Create {
            display_name,
            update_record_enabled,
            delete_record_enabled,
        } => {
            validate_project_display_name(display_name)?;
            let project = Project::new(display_name.as_str())
                .with_update_record_enabled(*update_record_enabled)
                .with_delete_record_enabled(*delete_record_enabled);
            store.create_project(&project).await?;
            info!(project_id = %project.id, "Created project");
            Ok(output::project(&project))
        }
        ProjectsCommand::Get { id } => Ok(output::project(&store.get_project(*id).await?)),
        ProjectsCommand::List(page) => list_projects(page, store).await,
        ProjectsCommand::Update {
            id,
            display_name,
            update_record_enabled,
            delete_record_enabled,
        } => {
            let mut update = ProjectUpdate::new();
            if let Some(display_name) = display_name {
                validate_project_display_name(display_name)?;
                update = update.display_name(display_name.as_str());
            }
            if let Some(value) = update_record_enabled {
                update = update.update_record_enabled(*value);
            }
            if let Some(value) = delete_record_enabled {
                update = update.delete_record_enabled(*value);
            }
            let project = store.update_project(*id, &update).await?;
            info!(project_id = %project.id, "Updated project");
            Ok(output::project(&project))
        }
    }
}

async fn list_projects(page: &PageArgs, store: &dyn AuditStore) -> anyhow::Result<Value> {
    let limit = page_size(page.page_size);
    let cursor = ProjectCursor::decode(&page.page_token)?;
    let projects = store.list_projects(limit, &cursor).await?;

    let next = ProjectCursor::next_page(&projects, limit).encode();
    Ok(output::page(
        "projects",
        projects.iter().map(output::project).collect(),
        next,
    ))
}

async fn run_records(command: &RecordsCommand, store: &dyn AuditStore) -> anyhow::Result<Value> {
    match command {
        RecordsCommand::Get { project_id, id } => {
            Ok(output::record(&store.get_record(*project_id, *id).await?))
        }
        RecordsCommand::List(args) => list_records(args, store).await,
    }
}

async fn list_records(args: &ListRecordsArgs, store: &dyn AuditStore) -> anyhow::Result<Value> {
    let limit = page_size(args.page.page_size);
    let cursor = RecordCursor::decode(&args.page.page_token)?;
    let records = store
        .list_records(args.project_id, &args.filter(), limit, &cursor)
        .await?;

    let next = RecordCursor::next_page(&records, limit).encode();
    Ok(output::page(
        "records",
        records.iter().map(output::record).collect(),
        next,
    ))
}
