//! PostgreSQL implementation of UserDirectory.
//!
//! Read-only lookups against the account tables owned by the external
//! auth/user system.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::foundation::{DomainError, ErrorCode, UserId};
use crate::ports::UserDirectory;

use super::storage_error;

/// PostgreSQL implementation of UserDirectory.
#[derive(Clone)]
pub struct PostgresUserDirectory {
    pool: PgPool,
}

impl PostgresUserDirectory {
    /// Creates a new PostgresUserDirectory.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for PostgresUserDirectory {
    async fn approved_user_ids(&self) -> Result<Vec<UserId>, DomainError> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT id FROM users WHERE account_status = 'approved' ORDER BY id")
                .fetch_all(&self.pool)
                .await
                .map_err(|e| storage_error("Failed to fetch approved users", e))?;

        rows.into_iter()
            .map(|(id,)| {
                UserId::new(id).map_err(|e| {
                    DomainError::new(ErrorCode::DatabaseError, format!("Invalid user id: {}", e))
                })
            })
            .collect()
    }

    async fn submission_inbox(&self) -> Result<Option<UserId>, DomainError> {
        let row: Option<(String,)> = sqlx::query_as(
            "SELECT id FROM users \
             WHERE role = 'admin' AND account_status = 'approved' \
             ORDER BY id LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to fetch submission inbox", e))?;

        row.map(|(id,)| {
            UserId::new(id).map_err(|e| {
                DomainError::new(ErrorCode::DatabaseError, format!("Invalid user id: {}", e))
            })
        })
        .transpose()
    }
}
