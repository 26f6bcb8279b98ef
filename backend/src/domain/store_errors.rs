//! Mapping from entity store failures to domain errors.

use serde_json::json;

use super::Error;
use super::ports::EntityStoreError;

/// Request field a duplicate subject such as `username ana` refers to.
fn duplicate_field(subject: &str) -> Option<&'static str> {
    if subject.starts_with("username") {
        Some("username")
    } else if subject.starts_with("cluster name") {
        Some("name")
    } else {
        None
    }
}

/// Conflict for a taken unique value. `subject` names the kind of value
/// first, e.g. `cluster name IELTS-A`.
pub(crate) fn duplicate_conflict(subject: &str) -> Error {
    let details = match duplicate_field(subject) {
        Some(field) => json!({ "field": field, "code": "duplicate" }),
        None => json!({ "code": "duplicate" }),
    };
    Error::conflict(format!("{subject} already exists")).with_details(details)
}

/// Translate a store failure into the domain error reported to callers.
///
/// Connection failures surface as `ServiceUnavailable`, duplicates as
/// `Conflict`, and anything else as a redacted `InternalError`.
pub(crate) fn map_store_error(error: EntityStoreError) -> Error {
    match error {
        EntityStoreError::Connection { message } => {
            Error::service_unavailable(format!("entity store unavailable: {message}"))
        }
        EntityStoreError::Query { message } => {
            Error::internal(format!("entity store error: {message}"))
        }
        EntityStoreError::Duplicate { message } => duplicate_conflict(&message),
    }
}
