//! Diesel and pool error mapping for the entity store.

use tracing::debug;

use crate::domain::ports::EntityStoreError;

use super::pool::PoolError;

/// Map pool errors to entity store connection errors.
pub(crate) fn map_pool_error(error: PoolError) -> EntityStoreError {
    EntityStoreError::connection(error.message())
}

/// Map Diesel errors to entity store errors.
///
/// Unique violations become `Duplicate` naming the violated constraint so
/// the caller can tell a username clash from a cluster name clash.
pub(crate) fn map_diesel_error(error: diesel::result::Error) -> EntityStoreError {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::NotFound => EntityStoreError::query("record not found"),
        DieselError::QueryBuilderError(_) => EntityStoreError::query("database query error"),
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
            EntityStoreError::duplicate(duplicate_label(info.constraint_name()))
        }
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            EntityStoreError::connection("database connection error")
        }
        _ => EntityStoreError::query("database error"),
    }
}

fn duplicate_label(constraint: Option<&str>) -> &'static str {
    match constraint {
        Some("users_username_key") => "username",
        Some("clusters_name_key") => "cluster name",
        _ => "record",
    }
}
