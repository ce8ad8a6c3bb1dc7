//! Test fixtures: a seeded project with six records about a blog post and
//! its comments, ordered by operation time.

use chrono::{DateTime, TimeZone, Utc};

use auditum_persistence::types::{
    Actor, Id, Operation, OperationStatus, Project, Record, Resource, ResourceChange,
};

/// Instant on 2023-01-01 at `hour:minute` UTC.
pub fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2023, 1, 1, hour, minute, 0).unwrap()
}

/// Creation time shared by every fixture record.
pub fn fixture_create_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2023, 1, 1, 2, 3, 4).unwrap()
}

/// A project with a fresh id and whole-second creation time.
pub fn test_project(display_name: &str) -> Project {
    Project {
        create_time: Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap(),
        ..Project::new(display_name)
    }
}

fn change(
    name: &str,
    description: Option<&str>,
    old_value: &str,
    new_value: &str,
) -> ResourceChange {
    ResourceChange {
        name: name.to_string(),
        description: description.map(str::to_string),
        old_value: Some(old_value.as_bytes().to_vec()),
        new_value: Some(new_value.as_bytes().to_vec()),
    }
}

fn record(
    project_id: Id,
    n: u128,
    resource: Resource,
    operation: Operation,
    actor: Actor,
    post_label: &str,
) -> Record {
    Record {
        id: Id::from_u128(n),
        create_time: fixture_create_time(),
        ..Record::new(project_id, resource, operation, actor)
    }
    .with_label("post_id", post_label)
}

/// Six records, r1 to r6, with operation times 01:01 to 01:06.
///
/// | record | resource | operation | actor | post_id label |
/// |---|---|---|---|---|
/// | r1 | POST/post-42 | CREATE CreatePost | USER/user-82 | post-42 |
/// | r2 | COMMENT/comment-79 | CREATE CreatePostComment | USER/user-83 | post-42 |
/// | r3 | COMMENT/comment-79 | UPDATE UpdatePostComment | USER/user-83 | post-42 |
/// | r4 | POST/post-55 | UPDATE UpdatePost | USER/user-83 | post-55 |
/// | r5 | POST/post-42 | UPDATE UpdatePost (failed) | USER/user-10 | post-42 |
/// | r6 | POST/post-42 | UPDATE UpdatePost | USER/user-5 | post-42 |
pub fn fixture_records(project_id: Id) -> Vec<Record> {
    let mut r1_resource = Resource::new("POST", "post-42");
    r1_resource
        .metadata
        .insert("category".to_string(), "funny".to_string());
    r1_resource.changes = vec![
        change(
            "text",
            None,
            "null",
            r#""My windows aren't dirty, that's my dog's nose art.""#,
        ),
        change("status", None, "null", r#""published""#),
    ];
    let mut r1_operation = Operation::new("CREATE", "example.v1.PostService/CreatePost", at(1, 1));
    r1_operation.status = OperationStatus::Succeeded;

    let mut r2_resource = Resource::new("COMMENT", "comment-79");
    r2_resource.changes = vec![
        change("text", None, "null", r#""Show us, my fiend!""#),
        change("status", None, "null", r#""published""#),
    ];
    let mut r2_operation = Operation::new(
        "CREATE",
        "example.v1.PostService/CreatePostComment",
        at(1, 2),
    );
    r2_operation.status = OperationStatus::Succeeded;

    let mut r3_resource = Resource::new("COMMENT", "comment-79");
    r3_resource
        .metadata
        .insert("status".to_string(), "published".to_string());
    r3_resource.changes = vec![change(
        "text",
        Some("Edit text"),
        r#""Show us, my fiend!""#,
        r#""Show us, my friend!""#,
    )];
    let mut r3_operation = Operation::new(
        "UPDATE",
        "example.v1.PostService/UpdatePostComment",
        at(1, 3),
    );
    r3_operation.status = OperationStatus::Succeeded;

    let mut r4_resource = Resource::new("POST", "post-55");
    r4_resource
        .metadata
        .insert("status".to_string(), "draft".to_string());
    r4_resource.changes = vec![change(
        "text",
        Some("Edit text"),
        r#""The dog knows the best seat in the house.""#,
        r#""For the best seat in the house, you'll have to move the dog.""#,
    )];
    let mut r4_operation = Operation::new("UPDATE", "example.v1.PostService/UpdatePost", at(1, 4));
    r4_operation.status = OperationStatus::Succeeded;

    let mut r5_resource = Resource::new("POST", "post-42");
    r5_resource
        .metadata
        .insert("category".to_string(), "funny".to_string());
    r5_resource.changes = vec![change(
        "status",
        Some("Unpublish post"),
        r#""published""#,
        r#""draft""#,
    )];
    let mut r5_operation = Operation::new("UPDATE", "example.v1.PostService/UpdatePost", at(1, 5));
    r5_operation
        .metadata
        .insert("failure_reason".to_string(), "Permission Denied".to_string());
    r5_operation.status = OperationStatus::Failed;
    let mut r5_actor = Actor::new("USER", "user-10");
    r5_actor
        .metadata
        .insert("as".to_string(), "reporter".to_string());

    let r6_resource = r5_resource.clone();
    let mut r6_operation = Operation::new("UPDATE", "example.v1.PostService/UpdatePost", at(1, 6));
    r6_operation
        .metadata
        .insert("via".to_string(), "Moderator UI".to_string());
    r6_operation.metadata.insert(
        "reason".to_string(),
        "The post is not fun enough. GIF meme is required!".to_string(),
    );
    r6_operation.status = OperationStatus::Succeeded;
    let mut r6_actor = Actor::new("USER", "user-5");
    r6_actor
        .metadata
        .insert("as".to_string(), "moderator".to_string());

    vec![
        record(
            project_id,
            1,
            r1_resource,
            r1_operation,
            Actor::new("USER", "user-82"),
            "post-42",
        ),
        record(
            project_id,
            2,
            r2_resource,
            r2_operation,
            Actor::new("USER", "user-83"),
            "post-42",
        ),
        record(
            project_id,
            3,
            r3_resource,
            r3_operation,
            Actor::new("USER", "user-83"),
            "post-42",
        ),
        record(
            project_id,
            4,
            r4_resource,
            r4_operation,
            Actor::new("USER", "user-83"),
            "post-55",
        ),
        record(project_id, 5, r5_resource, r5_operation, r5_actor, "post-42"),
        record(project_id, 6, r6_resource, r6_operation, r6_actor, "post-42"),
    ]
}

/// Picks fixture records by their 1-based number, in the given order.
pub fn pick(records: &[Record], numbers: &[usize]) -> Vec<Record> {
    numbers.iter().map(|n| records[n - 1].clone()).collect()
}
