//! Audit records and their parts.

// Metadata maps share the meaning of their parent and stay undocumented.
#![allow(missing_docs)]

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};

use super::Id;

/// One audit entry: who (actor) did what (operation) to which resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Record identifier, generated by the caller.
    pub id: Id,
    /// Owning project. Must exist when the record is written.
    pub project_id: Id,
    /// Creation instant, generated by the caller.
    pub create_time: DateTime<Utc>,
    /// Free-form labels, filterable by exact match.
    pub labels: BTreeMap<String, String>,
    /// The resource acted upon.
    pub resource: Resource,
    /// The operation performed.
    pub operation: Operation,
    /// Who performed the operation.
    pub actor: Actor,
}

impl Record {
    /// Creates a record with a fresh id and the current time.
    pub fn new(project_id: Id, resource: Resource, operation: Operation, actor: Actor) -> Self {
        Self {
            id: Id::new(),
            project_id,
            create_time: Utc::now(),
            labels: BTreeMap::new(),
            resource,
            operation,
            actor,
        }
    }

    /// Adds a label.
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }
}

/// The resource a record is about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resource {
    /// Resource kind, e.g. `POST`.
    pub r#type: String,
    /// Resource identifier within its kind.
    pub id: String,
    pub metadata: BTreeMap<String, String>,
    /// Ordered list of field changes.
    pub changes: Vec<ResourceChange>,
}

impl Resource {
    /// Creates a resource with no metadata or changes.
    pub fn new(r#type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            r#type: r#type.into(),
            id: id.into(),
            ..Default::default()
        }
    }
}

/// A single change to a resource.
///
/// Values are raw JSON payloads kept as opaque bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceChange {
    /// Name of the changed field.
    pub name: String,
    pub description: Option<String>,
    /// Value before the change.
    pub old_value: Option<Vec<u8>>,
    /// Value after the change.
    pub new_value: Option<Vec<u8>>,
}

impl ResourceChange {
    /// Creates a change with only a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// The operation a record describes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    /// Operation kind, e.g. `UPDATE`.
    pub r#type: String,
    /// Operation identifier, e.g. an RPC method name.
    pub id: String,
    /// When the operation happened. Primary sort key of record listings.
    pub time: DateTime<Utc>,
    pub metadata: BTreeMap<String, String>,
    pub trace_context: TraceContext,
    pub status: OperationStatus,
}

impl Operation {
    /// Creates an operation with no metadata, trace context or status.
    pub fn new(r#type: impl Into<String>, id: impl Into<String>, time: DateTime<Utc>) -> Self {
        Self {
            r#type: r#type.into(),
            id: id.into(),
            time,
            metadata: BTreeMap::new(),
            trace_context: TraceContext::default(),
            status: OperationStatus::Unspecified,
        }
    }
}

/// W3C trace context of an operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TraceContext {
    /// `traceparent` header value.
    pub traceparent: Option<String>,
    /// `tracestate` header value. Requires `traceparent`.
    pub tracestate: Option<String>,
}

impl TraceContext {
    /// Returns `true` when neither header is set.
    pub fn is_empty(&self) -> bool {
        self.traceparent.is_none() && self.tracestate.is_none()
    }
}

/// Outcome of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OperationStatus {
    /// Not reported (stored as 0).
    #[default]
    Unspecified,
    /// Stored as 1.
    Succeeded,
    /// Stored as 2.
    Failed,
}

impl OperationStatus {
    /// Returns the stored integer code.
    pub fn as_i32(self) -> i32 {
        match self {
            OperationStatus::Unspecified => 0,
            OperationStatus::Succeeded => 1,
            OperationStatus::Failed => 2,
        }
    }
}

impl TryFrom<i32> for OperationStatus {
    type Error = i32;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(OperationStatus::Unspecified),
            1 => Ok(OperationStatus::Succeeded),
            2 => Ok(OperationStatus::Failed),
            other => Err(other),
        }
    }
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationStatus::Unspecified => write!(f, "unspecified"),
            OperationStatus::Succeeded => write!(f, "succeeded"),
            OperationStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Who performed an operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Actor {
    /// Actor kind, e.g. `USER`.
    pub r#type: String,
    /// Actor identifier within its kind.
    pub id: String,
    pub metadata: BTreeMap<String, String>,
}

impl Actor {
    /// Creates an actor with no metadata.
    pub fn new(r#type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            r#type: r#type.into(),
            id: id.into(),
            metadata: BTreeMap::new(),
        }
    }
}
