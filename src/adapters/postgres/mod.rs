//! PostgreSQL adapters - implementations of the persistence ports.

mod audit_log_store;
mod notification_repository;
mod proposal_repository;
mod user_directory;

pub use audit_log_store::PostgresAuditLogStore;
pub use notification_repository::PostgresNotificationRepository;
pub use proposal_repository::PostgresProposalRepository;
pub use user_directory::PostgresUserDirectory;

use sqlx::postgres::PgRow;
use sqlx::Row;

use crate::domain::foundation::{DomainError, ErrorCode};

/// Maps a storage failure onto the error taxonomy: connection-level
/// failures are transient (retryable), constraint violations are
/// persistent, everything else is a plain database error.
pub(crate) fn storage_error(context: &str, e: sqlx::Error) -> DomainError {
    let code = match &e {
        sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
            ErrorCode::TransientIo
        }
        sqlx::Error::Database(db) if db.constraint().is_some() => ErrorCode::PersistentIo,
        _ => ErrorCode::DatabaseError,
    };
    DomainError::new(code, format!("{}: {}", context, e))
}

/// Reads one column off a row, mapping decode failures to `DomainError`.
pub(crate) fn column<'r, T>(row: &'r PgRow, name: &str) -> Result<T, DomainError>
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    row.try_get(name).map_err(|e| {
        DomainError::new(
            ErrorCode::DatabaseError,
            format!("Failed to get {}: {}", name, e),
        )
    })
}
