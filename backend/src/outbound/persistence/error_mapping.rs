//! Shared Diesel error classification for the repositories.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

/// Coarse category of a Diesel failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum DieselFailure {
    /// The connection dropped mid-operation.
    Connection(String),
    /// PostgreSQL aborted the transaction (serialization failure or deadlock).
    Contention(String),
    /// A unique constraint rejected the write.
    UniqueViolation(String),
    /// Anything else.
    Other(String),
}

/// PostgreSQL reports deadlocks (SQLSTATE 40P01) without a dedicated Diesel
/// error kind.
fn is_deadlock(message: &str) -> bool {
    message.contains("deadlock detected")
}

/// Classify `error`, logging it at debug level with the `operation` name.
pub(crate) fn classify_diesel_error(error: &DieselError, operation: &str) -> DieselFailure {
    let message = error.to_string();
    debug!(%operation, error_message = %message, "diesel operation failed");

    match error {
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            DieselFailure::Connection(message)
        }
        DieselError::DatabaseError(DatabaseErrorKind::SerializationFailure, _) => {
            DieselFailure::Contention(message)
        }
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            DieselFailure::UniqueViolation(message)
        }
        DieselError::DatabaseError(_, info) if is_deadlock(info.message()) => {
            DieselFailure::Contention(message)
        }
        _ => DieselFailure::Other(message),
    }
}
