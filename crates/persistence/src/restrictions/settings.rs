//! Restriction limits and record settings.
//!
//! All limits are byte sizes or counts with serde defaults, so a partial
//! configuration document only needs the values it changes:
//!
//! ```
//! use auditum_persistence::restrictions::Settings;
//!
//! let settings: Settings = serde_json::from_str(
//!     r#"{"records": {"restrictions": {"labels": {"keyMaxSizeBytes": 32}}}}"#,
//! )
//! .unwrap();
//! assert_eq!(settings.records.restrictions.labels.key_max_size_bytes, 32);
//! assert_eq!(settings.records.restrictions.labels.value_max_size_bytes, 256);
//! ```

use serde::{Deserialize, Serialize};

/// Top-level settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Record settings.
    #[serde(default)]
    pub records: RecordsSettings,
}

/// Settings for records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordsSettings {
    /// Global switch for record updates, checked by the transport before the
    /// per-project flag.
    #[serde(default)]
    pub update_enabled: bool,

    /// Global switch for record deletes.
    #[serde(default)]
    pub delete_enabled: bool,

    /// Size limits.
    #[serde(default)]
    pub restrictions: RecordsRestrictions,
}

/// Size limits for every free-form part of a record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordsRestrictions {
    /// Label map limits.
    #[serde(default)]
    pub labels: KeyValueRestrictions,
    /// Resource limits.
    #[serde(default)]
    pub resource: ResourceRestrictions,
    /// Operation limits.
    #[serde(default)]
    pub operation: OperationRestrictions,
    /// Actor limits.
    #[serde(default)]
    pub actor: ActorRestrictions,
}

/// Limits for a string→string map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyValueRestrictions {
    /// Maximum size of a single key.
    #[serde(default = "default_key_max_size_bytes")]
    pub key_max_size_bytes: usize,
    /// Maximum size of a single value.
    #[serde(default = "default_value_max_size_bytes")]
    pub value_max_size_bytes: usize,
    /// Maximum size of all keys and values together.
    #[serde(default = "default_total_max_size_bytes")]
    pub total_max_size_bytes: usize,
}

/// Limit for a single string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StringRestrictions {
    /// Maximum size in bytes.
    pub max_size_bytes: usize,
}

/// Limit for a byte payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BytesRestrictions {
    /// Maximum size in bytes.
    pub max_size_bytes: usize,
}

/// Limits for the resource part of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRestrictions {
    #[serde(default = "default_256")]
    pub r#type: StringRestrictions,
    #[serde(default = "default_256")]
    pub id: StringRestrictions,
    #[serde(default)]
    pub metadata: KeyValueRestrictions,
    #[serde(default)]
    pub changes: ChangesRestrictions,
}

/// Limits for resource changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangesRestrictions {
    /// Maximum number of changes per record.
    #[serde(default = "default_changes_total_max_count")]
    pub total_max_count: usize,
    #[serde(default = "default_256")]
    pub name: StringRestrictions,
    #[serde(default = "default_1024")]
    pub description: StringRestrictions,
    #[serde(default = "default_value_bytes")]
    pub old_value: BytesRestrictions,
    #[serde(default = "default_value_bytes")]
    pub new_value: BytesRestrictions,
}

/// Limits for the operation part of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationRestrictions {
    #[serde(default = "default_256")]
    pub r#type: StringRestrictions,
    #[serde(default = "default_512")]
    pub id: StringRestrictions,
    #[serde(default)]
    pub metadata: KeyValueRestrictions,
}

/// Limits for the actor part of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorRestrictions {
    #[serde(default = "default_256")]
    pub r#type: StringRestrictions,
    #[serde(default = "default_256")]
    pub id: StringRestrictions,
    #[serde(default)]
    pub metadata: KeyValueRestrictions,
}

fn default_key_max_size_bytes() -> usize {
    64
}

fn default_value_max_size_bytes() -> usize {
    256
}

fn default_total_max_size_bytes() -> usize {
    2048
}

fn default_changes_total_max_count() -> usize {
    20
}

fn default_256() -> StringRestrictions {
    StringRestrictions { max_size_bytes: 256 }
}

fn default_512() -> StringRestrictions {
    StringRestrictions { max_size_bytes: 512 }
}

fn default_1024() -> StringRestrictions {
    StringRestrictions {
        max_size_bytes: 1024,
    }
}

fn default_value_bytes() -> BytesRestrictions {
    BytesRestrictions {
        max_size_bytes: 4096,
    }
}

impl Default for KeyValueRestrictions {
    fn default() -> Self {
        Self {
            key_max_size_bytes: default_key_max_size_bytes(),
            value_max_size_bytes: default_value_max_size_bytes(),
            total_max_size_bytes: default_total_max_size_bytes(),
        }
    }
}

impl Default for ResourceRestrictions {
    fn default() -> Self {
        Self {
            r#type: default_256(),
            id: default_256(),
            metadata: KeyValueRestrictions::default(),
            changes: ChangesRestrictions::default(),
        }
    }
}

impl Default for ChangesRestrictions {
    fn default() -> Self {
        Self {
            total_max_count: default_changes_total_max_count(),
            name: default_256(),
            description: default_1024(),
            old_value: default_value_bytes(),
            new_value: default_value_bytes(),
        }
    }
}

impl Default for OperationRestrictions {
    fn default() -> Self {
        Self {
            r#type: default_256(),
            id: default_512(),
            metadata: KeyValueRestrictions::default(),
        }
    }
}

impl Default for ActorRestrictions {
    fn default() -> Self {
        Self {
            r#type: default_256(),
            id: default_256(),
            metadata: KeyValueRestrictions::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert!(!settings.records.update_enabled);
        assert!(!settings.records.delete_enabled);

        let r = &settings.records.restrictions;
        assert_eq!(r.labels.key_max_size_bytes, 64);
        assert_eq!(r.labels.value_max_size_bytes, 256);
        assert_eq!(r.labels.total_max_size_bytes, 2048);
        assert_eq!(r.resource.r#type.max_size_bytes, 256);
        assert_eq!(r.resource.changes.total_max_count, 20);
        assert_eq!(r.resource.changes.description.max_size_bytes, 1024);
        assert_eq!(r.resource.changes.new_value.max_size_bytes, 4096);
        assert_eq!(r.operation.id.max_size_bytes, 512);
        assert_eq!(r.actor.id.max_size_bytes, 256);
    }

    #[test]
    fn test_empty_document_yields_defaults() {
        let settings: Settings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_partial_document() {
        let settings: Settings = serde_json::from_str(
            r#"{"records": {"deleteEnabled": true, "restrictions": {"operation": {"id": {"maxSizeBytes": 128}}}}}"#,
        )
        .unwrap();
        assert!(settings.records.delete_enabled);
        assert_eq!(settings.records.restrictions.operation.id.max_size_bytes, 128);
        assert_eq!(settings.records.restrictions.operation.r#type.max_size_bytes, 256);
    }

    #[test]
    fn test_negative_limit_rejected() {
        let result: Result<Settings, _> = serde_json::from_str(
            r#"{"records": {"restrictions": {"labels": {"keyMaxSizeBytes": -1}}}}"#,
        );
        assert!(result.is_err());
    }
}
