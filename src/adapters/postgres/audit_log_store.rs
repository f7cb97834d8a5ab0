//! PostgreSQL implementation of AuditLogStore.
//!
//! Inserts only; audit rows are never updated or deleted here.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::audit::{ActionStats, ActionType, AuditEntry, NewAuditEntry};
use crate::domain::foundation::{DomainError, ErrorCode, Timestamp, UserId};
use crate::ports::AuditLogStore;

use super::{column, storage_error};

/// PostgreSQL implementation of AuditLogStore.
#[derive(Clone)]
pub struct PostgresAuditLogStore {
    pool: PgPool,
}

impl PostgresAuditLogStore {
    /// Creates a new PostgresAuditLogStore.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditLogStore for PostgresAuditLogStore {
    async fn append(&self, entry: NewAuditEntry) -> Result<AuditEntry, DomainError> {
        let created_at = Timestamp::now();
        let row: (i64,) = sqlx::query_as(
            r#"
            INSERT INTO audit_logs (
                proposal_id, action_type, actor_id,
                old_value, new_value, note, metadata, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(entry.proposal_id)
        .bind(entry.action.as_str())
        .bind(entry.actor_id.as_str())
        .bind(&entry.old_value)
        .bind(&entry.new_value)
        .bind(&entry.note)
        .bind(&entry.metadata)
        .bind(created_at.as_datetime())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to append audit entry", e))?;

        Ok(AuditEntry {
            id: row.0,
            proposal_id: entry.proposal_id,
            action: entry.action,
            actor_id: entry.actor_id,
            old_value: entry.old_value,
            new_value: entry.new_value,
            note: entry.note,
            metadata: entry.metadata,
            created_at,
        })
    }

    async fn list_for_proposal(
        &self,
        proposal_id: i64,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<AuditEntry>, DomainError> {
        let rows = sqlx::query(
            r#"
            SELECT id, proposal_id, action_type, actor_id,
                   old_value, new_value, note, metadata, created_at
            FROM audit_logs
            WHERE proposal_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(proposal_id)
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to list audit entries", e))?;

        rows.into_iter().map(row_to_entry).collect()
    }

    async fn stats_for_proposal(&self, proposal_id: i64) -> Result<Vec<ActionStats>, DomainError> {
        let rows = sqlx::query(
            r#"
            SELECT action_type,
                   COUNT(*) AS count,
                   MIN(created_at) AS first_at,
                   MAX(created_at) AS last_at
            FROM audit_logs
            WHERE proposal_id = $1
            GROUP BY action_type
            ORDER BY action_type
            "#,
        )
        .bind(proposal_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to compute audit stats", e))?;

        rows.into_iter()
            .map(|row| {
                let action: String = column(&row, "action_type")?;
                let count: i64 = column(&row, "count")?;
                let first_at: chrono::DateTime<chrono::Utc> = column(&row, "first_at")?;
                let last_at: chrono::DateTime<chrono::Utc> = column(&row, "last_at")?;

                Ok(ActionStats {
                    action: parse_action(&action)?,
                    count: count as u64,
                    first_at: Timestamp::from_datetime(first_at),
                    last_at: Timestamp::from_datetime(last_at),
                })
            })
            .collect()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Helper functions
// ════════════════════════════════════════════════════════════════════════════

fn parse_action(s: &str) -> Result<ActionType, DomainError> {
    ActionType::parse(s).ok_or_else(|| {
        DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid action type: {}", s),
        )
    })
}

fn row_to_entry(row: sqlx::postgres::PgRow) -> Result<AuditEntry, DomainError> {
    let action: String = column(&row, "action_type")?;
    let actor_id: String = column(&row, "actor_id")?;
    let created_at: chrono::DateTime<chrono::Utc> = column(&row, "created_at")?;

    Ok(AuditEntry {
        id: column(&row, "id")?,
        proposal_id: column(&row, "proposal_id")?,
        action: parse_action(&action)?,
        actor_id: UserId::new(actor_id)
            .map_err(|e| DomainError::new(ErrorCode::DatabaseError, format!("Invalid actor_id: {}", e)))?,
        old_value: column(&row, "old_value")?,
        new_value: column(&row, "new_value")?,
        note: column(&row, "note")?,
        metadata: column(&row, "metadata")?,
        created_at: Timestamp::from_datetime(created_at),
    })
}
