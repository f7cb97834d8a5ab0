//! AuditRecorder - append-only trail service.
//!
//! `record` is a best-effort side effect: a broken audit pipe must never
//! block or fail the operation that triggered it, so every failure path is
//! caught here, logged, and surfaced as `None` only.

use std::sync::Arc;

use crate::domain::audit::{
    ActionStats, ActionType, AuditEntry, AuditExport, ExportSnapshot, NewAuditEntry,
    EXPORT_FORMAT_VERSION,
};
use crate::domain::foundation::{DomainError, ErrorCode, ProposalId, Timestamp, UserId};
use crate::ports::{AuditLogStore, ProposalRepository};

/// Upper bound on entries included in one export bundle.
pub const EXPORT_MAX_ENTRIES: u32 = 10_000;

/// Optional before/after values and free-form metadata for a record call.
#[derive(Debug, Clone, Default)]
pub struct RecordDetails {
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

/// Service for writing and reading the audit trail.
pub struct AuditRecorder {
    proposals: Arc<dyn ProposalRepository>,
    store: Arc<dyn AuditLogStore>,
}

impl AuditRecorder {
    pub fn new(proposals: Arc<dyn ProposalRepository>, store: Arc<dyn AuditLogStore>) -> Self {
        Self { proposals, store }
    }

    /// Append one entry for an action against a proposal.
    ///
    /// Never returns an error: an unresolved proposal UUID or a storage
    /// failure is logged and yields `None`. The loose `action` name is
    /// mapped onto the closed [`ActionType`] enum; unmapped names are
    /// recorded as `Update` with a warning.
    pub async fn record(
        &self,
        proposal_uuid: &ProposalId,
        action: &str,
        actor: &UserId,
        note: Option<String>,
        details: RecordDetails,
    ) -> Option<AuditEntry> {
        let proposal_id = match self.proposals.resolve_internal_id(proposal_uuid).await {
            Ok(Some(id)) => id,
            Ok(None) => {
                tracing::warn!(
                    proposal = %proposal_uuid,
                    action,
                    "audit record skipped, proposal uuid did not resolve"
                );
                return None;
            }
            Err(err) => {
                tracing::warn!(
                    proposal = %proposal_uuid,
                    action,
                    error = %err,
                    "audit record skipped, uuid resolution failed"
                );
                return None;
            }
        };

        let entry = NewAuditEntry {
            proposal_id,
            action: ActionType::from_event_name(action),
            actor_id: actor.clone(),
            old_value: details.old_value,
            new_value: details.new_value,
            note,
            metadata: details.metadata,
        };

        match self.store.append(entry).await {
            Ok(entry) => Some(entry),
            Err(err) => {
                tracing::warn!(
                    proposal = %proposal_uuid,
                    action,
                    error = %err,
                    "audit append failed, entry dropped"
                );
                None
            }
        }
    }

    /// Entries for a proposal, newest first.
    ///
    /// # Errors
    ///
    /// - `ProposalNotFound` if the UUID does not resolve
    /// - `DatabaseError` on storage failure
    pub async fn list(
        &self,
        proposal_uuid: &ProposalId,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<AuditEntry>, DomainError> {
        let proposal_id = self.resolve(proposal_uuid).await?;
        self.store
            .list_for_proposal(proposal_id, limit, offset)
            .await
    }

    /// Per-action count and first/last occurrence for a proposal.
    pub async fn stats(&self, proposal_uuid: &ProposalId) -> Result<Vec<ActionStats>, DomainError> {
        let proposal_id = self.resolve(proposal_uuid).await?;
        self.store.stats_for_proposal(proposal_id).await
    }

    /// Bundle the full trail, stats, and a snapshot summary for downstream
    /// tooling, stamped with [`EXPORT_FORMAT_VERSION`].
    pub async fn export(&self, proposal_uuid: &ProposalId) -> Result<AuditExport, DomainError> {
        let proposal_id = self.resolve(proposal_uuid).await?;
        let entries = self
            .store
            .list_for_proposal(proposal_id, EXPORT_MAX_ENTRIES, 0)
            .await?;
        let stats = self.store.stats_for_proposal(proposal_id).await?;

        let snapshot = ExportSnapshot {
            total_entries: stats.iter().map(|s| s.count).sum(),
            distinct_actions: stats.len() as u64,
            first_at: stats.iter().map(|s| s.first_at).min(),
            last_at: stats.iter().map(|s| s.last_at).max(),
        };

        Ok(AuditExport {
            format_version: EXPORT_FORMAT_VERSION.to_string(),
            proposal_uuid: *proposal_uuid,
            generated_at: Timestamp::now(),
            entries,
            stats,
            snapshot,
        })
    }

    async fn resolve(&self, proposal_uuid: &ProposalId) -> Result<i64, DomainError> {
        self.proposals
            .resolve_internal_id(proposal_uuid)
            .await?
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::ProposalNotFound,
                    format!("Proposal not found: {}", proposal_uuid),
                )
            })
    }
}
