//! Size and shape limits for records and projects.
//!
//! The validators are pure functions over a value and its configured limits.
//! They run before a record reaches a store; the stores themselves do not
//! re-check sizes.
//!
//! Each single-value validator returns the bare rule message (e.g.
//! `"must be at most 256 bytes"`). [`validate_record`] composes them and
//! wraps the first failure in [`ValidationError::InvalidField`] with a field
//! path such as `resource.changes[2].name`.
//!
//! ```
//! use auditum_persistence::restrictions::{validate_record, RecordsRestrictions};
//! use auditum_persistence::types::{Actor, Id, Operation, Record, Resource};
//! use chrono::Utc;
//!
//! let record = Record::new(
//!     Id::new(),
//!     Resource::new("POST", "post-42"),
//!     Operation::new("UPDATE", "UpdatePost", Utc::now()),
//!     Actor::new("USER", "user-82"),
//! )
//! .with_label("post_id", "post-42");
//!
//! assert!(validate_record(&record, &RecordsRestrictions::default()).is_ok());
//!
//! let bad = record.with_label("not a key", "x");
//! let err = validate_record(&bad, &RecordsRestrictions::default()).unwrap_err();
//! assert_eq!(
//!     err.to_string(),
//!     r#"invalid labels: key "not a key" is invalid: must match regexp [a-zA-Z0-9-_]+"#
//! );
//! ```

mod settings;
pub mod tracecontext;

use std::collections::BTreeMap;
use std::sync::LazyLock;

use chrono::{DateTime, Datelike, Utc};
use regex::Regex;

use crate::error::ValidationError;
use crate::types::{Operation, Record, Resource, ResourceChange, TraceContext};

pub use settings::{
    ActorRestrictions, BytesRestrictions, ChangesRestrictions, KeyValueRestrictions,
    OperationRestrictions, RecordsRestrictions, RecordsSettings, ResourceRestrictions, Settings,
    StringRestrictions,
};

const KEY_PATTERN: &str = "[a-zA-Z0-9-_]+";
const TRACESTATE_MAX_LEN: usize = 512;
const DISPLAY_NAME_MIN_CHARS: usize = 3;
const DISPLAY_NAME_MAX_CHARS: usize = 64;

static KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("^{KEY_PATTERN}$")).expect("key pattern is valid"));

/// Result of a single rule: the failure message, if any.
pub type RuleResult = Result<(), String>;

/// Checks a required string against a byte limit.
pub fn validate_string(src: &str, restrictions: &StringRestrictions) -> RuleResult {
    if src.is_empty() {
        return Err("must not be empty".to_string());
    }
    check_max_bytes(src.len(), restrictions.max_size_bytes)
}

/// Checks an optional string against a byte limit. Empty is valid.
pub fn validate_optional_string(src: &str, restrictions: &StringRestrictions) -> RuleResult {
    if src.is_empty() {
        return Ok(());
    }
    check_max_bytes(src.len(), restrictions.max_size_bytes)
}

/// Checks a byte payload against a byte limit.
pub fn validate_bytes(src: &[u8], restrictions: &BytesRestrictions) -> RuleResult {
    check_max_bytes(src.len(), restrictions.max_size_bytes)
}

/// Checks a label or metadata map.
///
/// Entries are checked in key order; the first bad key or value fails the
/// whole map. The total size is the sum of every key and value length.
pub fn validate_key_values(
    src: &BTreeMap<String, String>,
    restrictions: &KeyValueRestrictions,
) -> RuleResult {
    let mut total_size_bytes = 0usize;

    for (key, value) in src {
        validate_key(key, restrictions).map_err(|e| format!("key {key:?} is invalid: {e}"))?;
        validate_value(value, restrictions)
            .map_err(|e| format!("value for key {key:?} is invalid: {e}"))?;
        total_size_bytes += key.len() + value.len();
    }

    if total_size_bytes > restrictions.total_max_size_bytes {
        return Err(format!(
            "total size of all keys and values must be at most {} bytes",
            restrictions.total_max_size_bytes
        ));
    }

    Ok(())
}

fn validate_key(src: &str, restrictions: &KeyValueRestrictions) -> RuleResult {
    if src.is_empty() {
        return Err("must not be empty".to_string());
    }
    if !KEY_RE.is_match(src) {
        return Err(format!("must match regexp {KEY_PATTERN}"));
    }
    check_max_bytes(src.len(), restrictions.key_max_size_bytes)
}

fn validate_value(src: &str, restrictions: &KeyValueRestrictions) -> RuleResult {
    if src.is_empty() {
        return Ok(());
    }
    check_max_bytes(src.len(), restrictions.value_max_size_bytes)
}

/// Checks the number of resource changes.
pub fn validate_changes_count(
    changes: &[ResourceChange],
    restrictions: &ChangesRestrictions,
) -> RuleResult {
    if changes.len() > restrictions.total_max_count {
        return Err(format!(
            "must not exceed the limit of {} changes",
            restrictions.total_max_count
        ));
    }
    Ok(())
}

/// Checks an operation time.
///
/// The Unix epoch is treated as "not set". Times outside years 1 to 9999
/// cannot be represented by clients and are rejected.
pub fn validate_operation_time(time: &DateTime<Utc>) -> RuleResult {
    if time.timestamp() == 0 && time.timestamp_subsec_nanos() == 0 {
        return Err("must not be empty".to_string());
    }
    if !(1..=9999).contains(&time.year()) {
        return Err("must be valid time".to_string());
    }
    Ok(())
}

/// Checks a trace context.
pub fn validate_trace_context(src: &TraceContext) -> RuleResult {
    let traceparent = src.traceparent.as_deref().unwrap_or_default();
    let tracestate = src.tracestate.as_deref().unwrap_or_default();

    if traceparent.is_empty() && !tracestate.is_empty() {
        return Err(r#""tracestate" can be provided only if "traceparent" is provided"#.to_string());
    }

    if !traceparent.is_empty() && !tracecontext::traceparent_valid(traceparent) {
        return Err(r#"invalid "traceparent": must be valid W3C traceparent"#.to_string());
    }

    if !tracestate.is_empty() {
        if tracestate.len() > TRACESTATE_MAX_LEN {
            return Err(format!(
                r#"invalid "tracestate": must not exceed maximum length of {TRACESTATE_MAX_LEN} bytes"#
            ));
        }
        if !tracecontext::tracestate_valid(tracestate) {
            return Err(r#"invalid "tracestate": must be valid W3C tracestate"#.to_string());
        }
    }

    Ok(())
}

/// Checks a project display name: 3 to 64 characters.
pub fn validate_project_display_name(src: &str) -> Result<(), ValidationError> {
    let message = if src.is_empty() {
        "must not be empty".to_string()
    } else {
        let chars = src.chars().count();
        if chars < DISPLAY_NAME_MIN_CHARS {
            format!("must not be shorter than {DISPLAY_NAME_MIN_CHARS} characters")
        } else if chars > DISPLAY_NAME_MAX_CHARS {
            format!("must not be longer than {DISPLAY_NAME_MAX_CHARS} characters")
        } else {
            return Ok(());
        }
    };
    Err(ValidationError::field("display_name", message))
}

/// Checks every free-form part of a record against `restrictions`.
pub fn validate_record(
    record: &Record,
    restrictions: &RecordsRestrictions,
) -> Result<(), ValidationError> {
    validate_key_values(&record.labels, &restrictions.labels)
        .map_err(|m| ValidationError::field("labels", m))?;
    validate_resource(&record.resource, &restrictions.resource)?;
    validate_operation(&record.operation, &restrictions.operation)?;

    let actor = &record.actor;
    let limits = &restrictions.actor;
    validate_string(&actor.r#type, &limits.r#type)
        .map_err(|m| ValidationError::field("actor.type", m))?;
    validate_string(&actor.id, &limits.id).map_err(|m| ValidationError::field("actor.id", m))?;
    validate_key_values(&actor.metadata, &limits.metadata)
        .map_err(|m| ValidationError::field("actor.metadata", m))?;

    Ok(())
}

fn validate_resource(
    resource: &Resource,
    limits: &ResourceRestrictions,
) -> Result<(), ValidationError> {
    validate_string(&resource.r#type, &limits.r#type)
        .map_err(|m| ValidationError::field("resource.type", m))?;
    validate_string(&resource.id, &limits.id)
        .map_err(|m| ValidationError::field("resource.id", m))?;
    validate_key_values(&resource.metadata, &limits.metadata)
        .map_err(|m| ValidationError::field("resource.metadata", m))?;

    let changes = &limits.changes;
    validate_changes_count(&resource.changes, changes)
        .map_err(|m| ValidationError::field("resource.changes", m))?;

    for (i, change) in resource.changes.iter().enumerate() {
        let field = |name: &str| format!("resource.changes[{i}].{name}");

        validate_string(&change.name, &changes.name)
            .map_err(|m| ValidationError::field(field("name"), m))?;
        let description = change.description.as_deref().unwrap_or_default();
        validate_optional_string(description, &changes.description)
            .map_err(|m| ValidationError::field(field("description"), m))?;
        validate_bytes(change.old_value.as_deref().unwrap_or_default(), &changes.old_value)
            .map_err(|m| ValidationError::field(field("old_value"), m))?;
        validate_bytes(change.new_value.as_deref().unwrap_or_default(), &changes.new_value)
            .map_err(|m| ValidationError::field(field("new_value"), m))?;
    }

    Ok(())
}

fn validate_operation(
    operation: &Operation,
    limits: &OperationRestrictions,
) -> Result<(), ValidationError> {
    validate_string(&operation.r#type, &limits.r#type)
        .map_err(|m| ValidationError::field("operation.type", m))?;
    validate_string(&operation.id, &limits.id)
        .map_err(|m| ValidationError::field("operation.id", m))?;
    validate_operation_time(&operation.time)
        .map_err(|m| ValidationError::field("operation.time", m))?;
    validate_key_values(&operation.metadata, &limits.metadata)
        .map_err(|m| ValidationError::field("operation.metadata", m))?;
    validate_trace_context(&operation.trace_context)
        .map_err(|m| ValidationError::field("operation.trace_context", m))?;
    Ok(())
}

fn check_max_bytes(len: usize, max: usize) -> RuleResult {
    if len > max {
        return Err(format!("must be at most {max} bytes"));
    }
    Ok(())
}
