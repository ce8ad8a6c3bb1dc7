//! JSON rendering of store types.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Value, json};

use auditum_persistence::types::{BoolValue, Project, Record, ResourceChange};

fn time(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn flag(value: BoolValue) -> Value {
    match Option::<bool>::from(value) {
        Some(value) => Value::Bool(value),
        None => Value::Null,
    }
}

fn map(value: &BTreeMap<String, String>) -> Value {
    json!(value)
}

/// Change values are usually JSON text; anything else is shown lossily.
fn bytes(value: &Option<Vec<u8>>) -> Value {
    match value {
        Some(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        None => Value::Null,
    }
}

fn change(change: &ResourceChange) -> Value {
    json!({
        "name": change.name,
        "description": change.description,
        "old_value": bytes(&change.old_value),
        "new_value": bytes(&change.new_value),
    })
}

pub fn project(project: &Project) -> Value {
    json!({
        "id": project.id.to_string(),
        "create_time": time(&project.create_time),
        "display_name": project.display_name,
        "update_record_enabled": flag(project.update_record_enabled),
        "delete_record_enabled": flag(project.delete_record_enabled),
    })
}

pub fn record(record: &Record) -> Value {
    let resource = &record.resource;
    let operation = &record.operation;
    let actor = &record.actor;

    json!({
        "id": record.id.to_string(),
        "project_id": record.project_id.to_string(),
        "create_time": time(&record.create_time),
        "labels": map(&record.labels),
        "resource": {
            "type": resource.r#type,
            "id": resource.id,
            "metadata": map(&resource.metadata),
            "changes": resource.changes.iter().map(change).collect::<Vec<_>>(),
        },
        "operation": {
            "type": operation.r#type,
            "id": operation.id,
            "time": time(&operation.time),
            "metadata": map(&operation.metadata),
            "trace_context": {
                "traceparent": operation.trace_context.traceparent,
                "tracestate": operation.trace_context.tracestate,
            },
            "status": operation.status.to_string(),
        },
        "actor": {
            "type": actor.r#type,
            "id": actor.id,
            "metadata": map(&actor.metadata),
        },
    })
}

/// A page of items with the token for the next one; empty when there is none.
pub fn page(key: &str, items: Vec<Value>, next_page_token: String) -> Value {
    let mut object = serde_json::Map::new();
    object.insert(key.to_string(), Value::Array(items));
    object.insert("next_page_token".to_string(), Value::String(next_page_token));
    Value::Object(object)
}

#[cfg(test)]
mod tests {
    use super::*;

    use auditum_persistence::types::{Actor, Id, Operation, Resource};
    use chrono::TimeZone;

    #[test]
    fn test_project_flags_render_as_nullable_bools() {
        let billing = Project {
            id: Id::from_u128(1),
            create_time: Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap(),
            ..Project::new("Billing")
        }
        .with_delete_record_enabled(true);

        let value = project(&billing);
        assert_eq!(value["id"], "00000000-0000-0000-0000-000000000001");
        assert_eq!(value["create_time"], "2023-01-01T00:00:00Z");
        assert_eq!(value["update_record_enabled"], Value::Null);
        assert_eq!(value["delete_record_enabled"], true);
    }

    #[test]
    fn test_record_rendering() {
        let mut resource = Resource::new("POST", "post-42");
        resource.changes = vec![ResourceChange {
            name: "status".to_string(),
            description: None,
            old_value: None,
            new_value: Some(br#""published""#.to_vec()),
        }];
        let post = Record::new(
            Id::from_u128(2),
            resource,
            Operation::new(
                "CREATE",
                "example.v1.PostService/CreatePost",
                Utc.with_ymd_and_hms(2023, 1, 1, 1, 1, 0).unwrap(),
            ),
            Actor::new("USER", "user-82"),
        )
        .with_label("post_id", "post-42");

        let value = record(&post);
        assert_eq!(value["labels"]["post_id"], "post-42");
        assert_eq!(value["resource"]["changes"][0]["old_value"], Value::Null);
        assert_eq!(
            value["resource"]["changes"][0]["new_value"],
            r#""published""#
        );
        assert_eq!(value["operation"]["time"], "2023-01-01T01:01:00Z");
        assert_eq!(value["operation"]["status"], "unspecified");
        assert_eq!(value["operation"]["trace_context"]["traceparent"], Value::Null);
    }

    #[test]
    fn test_page_rendering() {
        let value = page("projects", vec![json!(1)], String::new());
        assert_eq!(value["projects"][0], 1);
        assert_eq!(value["next_page_token"], "");
    }
}
