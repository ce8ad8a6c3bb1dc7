//! Assertion helpers for store results.

use auditum_persistence::error::{ResourceError, StorageError, TenantError, ValidationError};
use auditum_persistence::types::{Id, Record};

/// Asserts that a result is a ResourceError::ProjectNotFound.
pub fn assert_project_not_found<T: std::fmt::Debug>(result: Result<T, StorageError>) {
    match result {
        Err(StorageError::Resource(ResourceError::ProjectNotFound { .. })) => {}
        other => panic!("Expected ProjectNotFound error, got {:?}", other),
    }
}

/// Asserts that a result is a ResourceError::RecordNotFound.
pub fn assert_record_not_found<T: std::fmt::Debug>(result: Result<T, StorageError>) {
    match result {
        Err(StorageError::Resource(ResourceError::RecordNotFound { .. })) => {}
        other => panic!("Expected RecordNotFound error, got {:?}", other),
    }
}

/// Asserts that a result is a TenantError::OperationDisabled.
pub fn assert_disabled<T: std::fmt::Debug>(result: Result<T, StorageError>) {
    match result {
        Err(StorageError::Tenant(TenantError::OperationDisabled { .. })) => {}
        other => panic!("Expected OperationDisabled error, got {:?}", other),
    }
}

/// Asserts that a result is a ValidationError::NothingToUpdate.
pub fn assert_nothing_to_update<T: std::fmt::Debug>(result: Result<T, StorageError>) {
    match result {
        Err(StorageError::Validation(ValidationError::NothingToUpdate)) => {}
        other => panic!("Expected NothingToUpdate error, got {:?}", other),
    }
}

/// Asserts that a page holds exactly the records with `expected` ids, in order.
pub fn assert_record_ids(records: &[Record], expected: &[Id]) {
    let ids: Vec<Id> = records.iter().map(|r| r.id).collect();
    assert_eq!(ids, expected, "Record ids mismatch");
}

/// Ids of fixture records by their 1-based number.
pub fn fixture_ids(numbers: &[u128]) -> Vec<Id> {
    numbers.iter().map(|n| Id::from_u128(*n)).collect()
}
