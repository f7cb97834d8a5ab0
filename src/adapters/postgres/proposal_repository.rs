//! PostgreSQL implementation of ProposalRepository.
//!
//! The status write is a conditional update keyed on the expected prior
//! status; zero rows affected means a concurrent writer got there first.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::foundation::{DomainError, ErrorCode, ProposalId, Timestamp, UserId};
use crate::domain::proposal::{EventStatus, Proposal, ProposalStatus, ReportStatus};
use crate::ports::ProposalRepository;

use super::{column, storage_error};

/// PostgreSQL implementation of ProposalRepository.
#[derive(Clone)]
pub struct PostgresProposalRepository {
    pool: PgPool,
}

impl PostgresProposalRepository {
    /// Creates a new PostgresProposalRepository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProposalRepository for PostgresProposalRepository {
    async fn save(&self, proposal: &Proposal) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO proposals (
                uuid, title, submitter_id, details,
                proposal_status, report_status, event_status,
                submitted_at, reviewed_at, approved_at,
                reviewer_id, admin_comments, deleted,
                created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(proposal.uuid().as_uuid())
        .bind(proposal.title())
        .bind(proposal.submitter_id().as_str())
        .bind(proposal.details())
        .bind(proposal.proposal_status().as_str())
        .bind(proposal.report_status().as_str())
        .bind(proposal.event_status().as_str())
        .bind(proposal.submitted_at().map(|t| *t.as_datetime()))
        .bind(proposal.reviewed_at().map(|t| *t.as_datetime()))
        .bind(proposal.approved_at().map(|t| *t.as_datetime()))
        .bind(proposal.reviewer_id().map(|u| u.as_str()))
        .bind(proposal.admin_comments())
        .bind(proposal.is_deleted())
        .bind(proposal.created_at().as_datetime())
        .bind(proposal.updated_at().as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to insert proposal", e))?;

        Ok(())
    }

    async fn find_by_uuid(&self, uuid: &ProposalId) -> Result<Option<Proposal>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT id, uuid, title, submitter_id, details,
                   proposal_status, report_status, event_status,
                   submitted_at, reviewed_at, approved_at,
                   reviewer_id, admin_comments, deleted,
                   created_at, updated_at
            FROM proposals
            WHERE uuid = $1 AND deleted = FALSE
            "#,
        )
        .bind(uuid.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to fetch proposal", e))?;

        match row {
            Some(row) => Ok(Some(row_to_proposal(row)?)),
            None => Ok(None),
        }
    }

    async fn resolve_internal_id(&self, uuid: &ProposalId) -> Result<Option<i64>, DomainError> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM proposals WHERE uuid = $1")
            .bind(uuid.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| storage_error("Failed to resolve proposal id", e))?;

        Ok(row.map(|(id,)| id))
    }

    async fn update_status(
        &self,
        proposal: &Proposal,
        expected: ProposalStatus,
    ) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE proposals SET
                proposal_status = $2,
                submitted_at = $3,
                reviewed_at = $4,
                approved_at = $5,
                reviewer_id = $6,
                admin_comments = $7,
                updated_at = $8
            WHERE uuid = $1 AND proposal_status = $9 AND deleted = FALSE
            "#,
        )
        .bind(proposal.uuid().as_uuid())
        .bind(proposal.proposal_status().as_str())
        .bind(proposal.submitted_at().map(|t| *t.as_datetime()))
        .bind(proposal.reviewed_at().map(|t| *t.as_datetime()))
        .bind(proposal.approved_at().map(|t| *t.as_datetime()))
        .bind(proposal.reviewer_id().map(|u| u.as_str()))
        .bind(proposal.admin_comments())
        .bind(proposal.updated_at().as_datetime())
        .bind(expected.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to update proposal status", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_details(&self, proposal: &Proposal) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE proposals SET
                title = $2,
                details = $3,
                updated_at = $4
            WHERE uuid = $1 AND deleted = FALSE
            "#,
        )
        .bind(proposal.uuid().as_uuid())
        .bind(proposal.title())
        .bind(proposal.details())
        .bind(proposal.updated_at().as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to update proposal details", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::ProposalNotFound,
                format!("Proposal not found: {}", proposal.uuid()),
            ));
        }

        Ok(())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Helper functions
// ════════════════════════════════════════════════════════════════════════════

fn row_to_proposal(row: sqlx::postgres::PgRow) -> Result<Proposal, DomainError> {
    let proposal_status: String = column(&row, "proposal_status")?;
    let report_status: String = column(&row, "report_status")?;
    let event_status: String = column(&row, "event_status")?;
    let submitter_id: String = column(&row, "submitter_id")?;
    let reviewer_id: Option<String> = column(&row, "reviewer_id")?;
    let submitted_at: Option<chrono::DateTime<chrono::Utc>> = column(&row, "submitted_at")?;
    let reviewed_at: Option<chrono::DateTime<chrono::Utc>> = column(&row, "reviewed_at")?;
    let approved_at: Option<chrono::DateTime<chrono::Utc>> = column(&row, "approved_at")?;
    let created_at: chrono::DateTime<chrono::Utc> = column(&row, "created_at")?;
    let updated_at: chrono::DateTime<chrono::Utc> = column(&row, "updated_at")?;

    Ok(Proposal::reconstitute(
        column(&row, "id")?,
        ProposalId::from_uuid(column(&row, "uuid")?),
        column(&row, "title")?,
        UserId::new(submitter_id)
            .map_err(|e| DomainError::new(ErrorCode::DatabaseError, format!("Invalid submitter_id: {}", e)))?,
        column(&row, "details")?,
        ProposalStatus::parse(&proposal_status)?,
        ReportStatus::parse(&report_status)?,
        EventStatus::parse(&event_status)?,
        submitted_at.map(Timestamp::from_datetime),
        reviewed_at.map(Timestamp::from_datetime),
        approved_at.map(Timestamp::from_datetime),
        reviewer_id
            .map(UserId::new)
            .transpose()
            .map_err(|e| DomainError::new(ErrorCode::DatabaseError, format!("Invalid reviewer_id: {}", e)))?,
        column(&row, "admin_comments")?,
        column(&row, "deleted")?,
        Timestamp::from_datetime(created_at),
        Timestamp::from_datetime(updated_at),
    ))
}
