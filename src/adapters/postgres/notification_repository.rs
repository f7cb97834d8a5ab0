//! PostgreSQL implementation of NotificationRepository.
//!
//! Listing orders by priority rank (urgent > high > normal > low) then
//! recency. Expiry exclusion and the cleanup phases are plain predicates,
//! so concurrent sweeps and reads do not interfere.

use async_trait::async_trait;
use sqlx::{PgPool, QueryBuilder};

use crate::domain::foundation::{
    DomainError, ErrorCode, NotificationId, ProposalId, Timestamp, UserId,
};
use crate::domain::notification::{
    ChannelSettings, Frequency, NewNotification, Notification, NotificationFilter,
    NotificationKind, NotificationPreference, NotificationStatus, Priority,
};
use crate::ports::NotificationRepository;

use super::{column, storage_error};

/// PostgreSQL implementation of NotificationRepository.
#[derive(Clone)]
pub struct PostgresNotificationRepository {
    pool: PgPool,
}

impl PostgresNotificationRepository {
    /// Creates a new PostgresNotificationRepository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const PRIORITY_RANK_SQL: &str =
    "CASE priority WHEN 'urgent' THEN 3 WHEN 'high' THEN 2 WHEN 'normal' THEN 1 ELSE 0 END";

#[async_trait]
impl NotificationRepository for PostgresNotificationRepository {
    async fn insert(&self, input: NewNotification) -> Result<Notification, DomainError> {
        let uuid = NotificationId::new();
        let created_at = Timestamp::now();
        let row: (i64,) = sqlx::query_as(
            r#"
            INSERT INTO notifications (
                uuid, recipient_id, sender_id, kind, title, message,
                priority, status, related_proposal_id, related_proposal_uuid,
                metadata, tags, expires_at, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, 'pending', $8, $9, $10, $11, $12, $13)
            RETURNING id
            "#,
        )
        .bind(uuid.as_uuid())
        .bind(input.recipient_id.as_str())
        .bind(input.sender_id.as_ref().map(|u| u.as_str()))
        .bind(input.kind.as_str())
        .bind(&input.title)
        .bind(&input.message)
        .bind(input.priority.as_str())
        .bind(input.related_proposal_id)
        .bind(input.related_proposal_uuid.as_ref().map(|p| *p.as_uuid()))
        .bind(&input.metadata)
        .bind(&input.tags)
        .bind(input.expires_at.map(|t| *t.as_datetime()))
        .bind(created_at.as_datetime())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to insert notification", e))?;

        Ok(Notification::reconstitute(
            row.0,
            uuid,
            input.recipient_id,
            input.sender_id,
            input.kind,
            input.title,
            input.message,
            input.priority,
            NotificationStatus::Pending,
            input.related_proposal_id,
            input.related_proposal_uuid,
            input.metadata,
            input.tags,
            input.expires_at,
            None,
            None,
            created_at,
        ))
    }

    async fn mark_delivered(&self, id: i64, at: Timestamp) -> Result<(), DomainError> {
        let result = sqlx::query(
            "UPDATE notifications SET status = 'delivered', delivered_at = $2 \
             WHERE id = $1 AND status = 'pending'",
        )
        .bind(id)
        .bind(at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to mark notification delivered", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::NotificationNotFound,
                format!("Pending notification not found: {}", id),
            ));
        }

        Ok(())
    }

    async fn list_for_user(
        &self,
        user: &UserId,
        filter: &NotificationFilter,
        now: Timestamp,
    ) -> Result<Vec<Notification>, DomainError> {
        let mut builder: QueryBuilder<sqlx::Postgres> = QueryBuilder::new(
            "SELECT id, uuid, recipient_id, sender_id, kind, title, message, \
                    priority, status, related_proposal_id, related_proposal_uuid, \
                    metadata, tags, expires_at, delivered_at, read_at, created_at \
             FROM notifications WHERE recipient_id = ",
        );
        builder.push_bind(user.as_str());
        builder.push(" AND status != 'expired' AND (expires_at IS NULL OR expires_at > ");
        builder.push_bind(*now.as_datetime());
        builder.push(")");

        if filter.unread_only {
            builder.push(" AND status != 'read'");
        }
        if let Some(priority) = filter.priority {
            builder.push(" AND priority = ");
            builder.push_bind(priority.as_str());
        }
        if let Some(status) = filter.status {
            builder.push(" AND status = ");
            builder.push_bind(status.as_str());
        }
        if let Some(kind) = filter.kind {
            builder.push(" AND kind = ");
            builder.push_bind(kind.as_str());
        }

        builder.push(format!(
            " ORDER BY {} DESC, created_at DESC, id DESC LIMIT ",
            PRIORITY_RANK_SQL
        ));
        builder.push_bind(filter.effective_limit() as i64);
        builder.push(" OFFSET ");
        builder.push_bind(filter.offset() as i64);

        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| storage_error("Failed to list notifications", e))?;

        rows.into_iter().map(row_to_notification).collect()
    }

    async fn unread_count(&self, user: &UserId, now: Timestamp) -> Result<u64, DomainError> {
        let result: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM notifications \
             WHERE recipient_id = $1 AND status != 'read' AND status != 'expired' \
               AND (expires_at IS NULL OR expires_at > $2)",
        )
        .bind(user.as_str())
        .bind(now.as_datetime())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to count unread notifications", e))?;

        Ok(result.0 as u64)
    }

    async fn mark_read(
        &self,
        user: &UserId,
        ids: Option<&[NotificationId]>,
        at: Timestamp,
    ) -> Result<u64, DomainError> {
        let result = match ids {
            Some(ids) => {
                let uuids: Vec<uuid::Uuid> = ids.iter().map(|id| *id.as_uuid()).collect();
                sqlx::query(
                    "UPDATE notifications SET status = 'read', read_at = $2 \
                     WHERE recipient_id = $1 AND status = 'delivered' AND uuid = ANY($3)",
                )
                .bind(user.as_str())
                .bind(at.as_datetime())
                .bind(&uuids)
                .execute(&self.pool)
                .await
            }
            None => {
                sqlx::query(
                    "UPDATE notifications SET status = 'read', read_at = $2 \
                     WHERE recipient_id = $1 AND status = 'delivered'",
                )
                .bind(user.as_str())
                .bind(at.as_datetime())
                .execute(&self.pool)
                .await
            }
        }
        .map_err(|e| storage_error("Failed to mark notifications read", e))?;

        Ok(result.rows_affected())
    }

    async fn archive(&self, user: &UserId, ids: &[NotificationId]) -> Result<u64, DomainError> {
        let uuids: Vec<uuid::Uuid> = ids.iter().map(|id| *id.as_uuid()).collect();
        let result = sqlx::query(
            "UPDATE notifications SET status = 'archived' \
             WHERE recipient_id = $1 AND uuid = ANY($2) AND status IN ('delivered', 'read')",
        )
        .bind(user.as_str())
        .bind(&uuids)
        .execute(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to archive notifications", e))?;

        Ok(result.rows_affected())
    }

    async fn expire_due(&self, now: Timestamp) -> Result<u64, DomainError> {
        let result = sqlx::query(
            "UPDATE notifications SET status = 'expired' \
             WHERE expires_at IS NOT NULL AND expires_at <= $1 AND status != 'expired'",
        )
        .bind(now.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to expire notifications", e))?;

        Ok(result.rows_affected())
    }

    async fn delete_expired_before(&self, cutoff: Timestamp) -> Result<u64, DomainError> {
        let result = sqlx::query(
            "DELETE FROM notifications WHERE status = 'expired' AND expires_at <= $1",
        )
        .bind(cutoff.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to delete expired notifications", e))?;

        Ok(result.rows_affected())
    }

    async fn upsert_preference(&self, pref: &NotificationPreference) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO notification_preferences (
                user_id, kind, in_app, email, sms, push, frequency, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (user_id, kind) DO UPDATE SET
                in_app = EXCLUDED.in_app,
                email = EXCLUDED.email,
                sms = EXCLUDED.sms,
                push = EXCLUDED.push,
                frequency = EXCLUDED.frequency,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(pref.user_id.as_str())
        .bind(pref.kind.as_str())
        .bind(pref.channels.in_app)
        .bind(pref.channels.email)
        .bind(pref.channels.sms)
        .bind(pref.channels.push)
        .bind(pref.frequency.as_str())
        .bind(pref.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to upsert notification preference", e))?;

        Ok(())
    }

    async fn preferences_for_user(
        &self,
        user: &UserId,
    ) -> Result<Vec<NotificationPreference>, DomainError> {
        let rows = sqlx::query(
            "SELECT user_id, kind, in_app, email, sms, push, frequency, updated_at \
             FROM notification_preferences WHERE user_id = $1 ORDER BY kind",
        )
        .bind(user.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to fetch notification preferences", e))?;

        rows.into_iter().map(row_to_preference).collect()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Helper functions
// ════════════════════════════════════════════════════════════════════════════

fn invalid(field: &str, detail: impl std::fmt::Display) -> DomainError {
    DomainError::new(
        ErrorCode::DatabaseError,
        format!("Invalid {}: {}", field, detail),
    )
}

fn row_to_notification(row: sqlx::postgres::PgRow) -> Result<Notification, DomainError> {
    let recipient_id: String = column(&row, "recipient_id")?;
    let sender_id: Option<String> = column(&row, "sender_id")?;
    let kind: String = column(&row, "kind")?;
    let priority: String = column(&row, "priority")?;
    let status: String = column(&row, "status")?;
    let related_proposal_uuid: Option<uuid::Uuid> = column(&row, "related_proposal_uuid")?;
    let expires_at: Option<chrono::DateTime<chrono::Utc>> = column(&row, "expires_at")?;
    let delivered_at: Option<chrono::DateTime<chrono::Utc>> = column(&row, "delivered_at")?;
    let read_at: Option<chrono::DateTime<chrono::Utc>> = column(&row, "read_at")?;
    let created_at: chrono::DateTime<chrono::Utc> = column(&row, "created_at")?;

    Ok(Notification::reconstitute(
        column(&row, "id")?,
        NotificationId::from_uuid(column(&row, "uuid")?),
        UserId::new(recipient_id).map_err(|e| invalid("recipient_id", e))?,
        sender_id
            .map(UserId::new)
            .transpose()
            .map_err(|e| invalid("sender_id", e))?,
        NotificationKind::parse(&kind).ok_or_else(|| invalid("kind", &kind))?,
        column(&row, "title")?,
        column(&row, "message")?,
        Priority::parse(&priority).ok_or_else(|| invalid("priority", &priority))?,
        NotificationStatus::parse(&status)?,
        column(&row, "related_proposal_id")?,
        related_proposal_uuid.map(ProposalId::from_uuid),
        column(&row, "metadata")?,
        column(&row, "tags")?,
        expires_at.map(Timestamp::from_datetime),
        delivered_at.map(Timestamp::from_datetime),
        read_at.map(Timestamp::from_datetime),
        Timestamp::from_datetime(created_at),
    ))
}

fn row_to_preference(row: sqlx::postgres::PgRow) -> Result<NotificationPreference, DomainError> {
    let user_id: String = column(&row, "user_id")?;
    let kind: String = column(&row, "kind")?;
    let frequency: String = column(&row, "frequency")?;
    let updated_at: chrono::DateTime<chrono::Utc> = column(&row, "updated_at")?;

    Ok(NotificationPreference {
        user_id: UserId::new(user_id).map_err(|e| invalid("user_id", e))?,
        kind: NotificationKind::parse(&kind).ok_or_else(|| invalid("kind", &kind))?,
        channels: ChannelSettings {
            in_app: column(&row, "in_app")?,
            email: column(&row, "email")?,
            sms: column(&row, "sms")?,
            push: column(&row, "push")?,
        },
        frequency: Frequency::parse_or_default(&frequency),
        updated_at: Timestamp::from_datetime(updated_at),
    })
}
