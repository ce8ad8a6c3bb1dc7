//! Field-mask updates and record filters.
//!
//! Updates follow the field-mask pattern: every updatable field (or field
//! group) is an `Option`, where `Some` means "write this value" and `None`
//! means "leave the column alone". An update selecting nothing is rejected
//! by the store with [`ValidationError::NothingToUpdate`](crate::error::ValidationError::NothingToUpdate)
//! before any SQL runs.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use super::{Actor, BoolValue, Operation, Resource};

/// Partial update of a project.
///
/// # Examples
///
/// ```
/// use auditum_persistence::types::{BoolValue, ProjectUpdate};
///
/// let update = ProjectUpdate::new()
///     .display_name("Billing")
///     .update_record_enabled(BoolValue::False);
/// assert!(!update.is_empty());
/// assert!(update.delete_record_enabled.is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectUpdate {
    /// New display name.
    pub display_name: Option<String>,
    /// New update gate. `Some(BoolValue::Unset)` clears the flag.
    pub update_record_enabled: Option<BoolValue>,
    /// New delete gate. `Some(BoolValue::Unset)` clears the flag.
    pub delete_record_enabled: Option<BoolValue>,
}

impl ProjectUpdate {
    /// Creates an update that selects nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects the display name.
    pub fn display_name(mut self, value: impl Into<String>) -> Self {
        self.display_name = Some(value.into());
        self
    }

    /// Selects the update gate.
    pub fn update_record_enabled(mut self, value: impl Into<BoolValue>) -> Self {
        self.update_record_enabled = Some(value.into());
        self
    }

    /// Selects the delete gate.
    pub fn delete_record_enabled(mut self, value: impl Into<BoolValue>) -> Self {
        self.delete_record_enabled = Some(value.into());
        self
    }

    /// Returns `true` if no field is selected.
    pub fn is_empty(&self) -> bool {
        self.display_name.is_none()
            && self.update_record_enabled.is_none()
            && self.delete_record_enabled.is_none()
    }
}

/// Partial update of a record, by field group.
///
/// Each group is written as a whole. Selecting `resource` replaces the
/// record's resource changes wholesale; changes are never merged by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordUpdate {
    /// Replacement label map.
    pub labels: Option<BTreeMap<String, String>>,
    /// Type, id, metadata and changes.
    pub resource: Option<Resource>,
    /// Type, id, time, metadata, trace context and status.
    pub operation: Option<Operation>,
    /// Type, id and metadata.
    pub actor: Option<Actor>,
}

impl RecordUpdate {
    /// Creates an update that selects nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects the labels.
    pub fn labels(mut self, labels: BTreeMap<String, String>) -> Self {
        self.labels = Some(labels);
        self
    }

    /// Selects the resource group.
    pub fn resource(mut self, resource: Resource) -> Self {
        self.resource = Some(resource);
        self
    }

    /// Selects the operation group.
    pub fn operation(mut self, operation: Operation) -> Self {
        self.operation = Some(operation);
        self
    }

    /// Selects the actor group.
    pub fn actor(mut self, actor: Actor) -> Self {
        self.actor = Some(actor);
        self
    }

    /// Returns `true` if no group is selected.
    pub fn is_empty(&self) -> bool {
        self.labels.is_none()
            && self.resource.is_none()
            && self.operation.is_none()
            && self.actor.is_none()
    }
}

/// Conditions for listing records. All set conditions must hold.
///
/// An empty string in an exact-match field is treated like `None` and does
/// not restrict the listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    /// Every entry must be present on the record with an equal value.
    pub labels: BTreeMap<String, String>,
    /// Exact resource type.
    pub resource_type: Option<String>,
    /// Exact resource id.
    pub resource_id: Option<String>,
    /// Exact operation type.
    pub operation_type: Option<String>,
    /// Exact operation id.
    pub operation_id: Option<String>,
    /// Inclusive lower bound on the operation time.
    pub operation_time_from: Option<DateTime<Utc>>,
    /// Exclusive upper bound on the operation time.
    pub operation_time_to: Option<DateTime<Utc>>,
    /// Exact actor type.
    pub actor_type: Option<String>,
    /// Exact actor id.
    pub actor_id: Option<String>,
}

impl RecordFilter {
    /// Creates a filter matching every record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requires a label.
    pub fn label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// Requires a resource type and, optionally, id.
    pub fn resource(mut self, r#type: impl Into<String>, id: Option<&str>) -> Self {
        self.resource_type = Some(r#type.into());
        self.resource_id = id.map(str::to_string);
        self
    }

    /// Requires an operation type and, optionally, id.
    pub fn operation(mut self, r#type: impl Into<String>, id: Option<&str>) -> Self {
        self.operation_type = Some(r#type.into());
        self.operation_id = id.map(str::to_string);
        self
    }

    /// Restricts the operation time to `[from, to)`. Either bound may be open.
    pub fn operation_time(
        mut self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Self {
        self.operation_time_from = from;
        self.operation_time_to = to;
        self
    }

    /// Requires an actor type and, optionally, id.
    pub fn actor(mut self, r#type: impl Into<String>, id: Option<&str>) -> Self {
        self.actor_type = Some(r#type.into());
        self.actor_id = id.map(str::to_string);
        self
    }
}
