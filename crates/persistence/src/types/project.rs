//! Projects: the tenants that own records.

use chrono::{DateTime, Utc};

use super::{BoolValue, Id};

/// A tenant owning a set of audit records.
///
/// The caller assigns `id` and `create_time` before handing a project to
/// [`AuditStore::create_project`](crate::core::AuditStore::create_project);
/// [`Project::new`] does both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    /// Immutable identifier.
    pub id: Id,
    /// Creation instant, set once.
    pub create_time: DateTime<Utc>,
    /// Human-readable name (3 to 64 characters).
    pub display_name: String,
    /// Gates record updates: only an explicit `False` blocks them.
    pub update_record_enabled: BoolValue,
    /// Gates record deletes: only an explicit `True` allows them.
    pub delete_record_enabled: BoolValue,
}

impl Project {
    /// Creates a project with a fresh id, the current time and unset flags.
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            id: Id::new(),
            create_time: Utc::now(),
            display_name: display_name.into(),
            update_record_enabled: BoolValue::Unset,
            delete_record_enabled: BoolValue::Unset,
        }
    }

    /// Sets the update gate.
    pub fn with_update_record_enabled(mut self, value: impl Into<BoolValue>) -> Self {
        self.update_record_enabled = value.into();
        self
    }

    /// Sets the delete gate.
    pub fn with_delete_record_enabled(mut self, value: impl Into<BoolValue>) -> Self {
        self.delete_record_enabled = value.into();
        self
    }
}
