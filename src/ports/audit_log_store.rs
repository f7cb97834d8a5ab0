//! Audit log storage port.
//!
//! One storage-agnostic contract for the append-only trail; swapping the
//! backend (postgres, in-memory) must not change recorder behavior.

use async_trait::async_trait;

use crate::domain::audit::{ActionStats, AuditEntry, NewAuditEntry};
use crate::domain::foundation::DomainError;

/// Storage backend for the append-only audit trail.
#[async_trait]
pub trait AuditLogStore: Send + Sync {
    /// Append one immutable entry.
    ///
    /// # Errors
    ///
    /// - `DatabaseError` on persistence failure (the recorder catches this;
    ///   it never reaches workflow callers)
    async fn append(&self, entry: NewAuditEntry) -> Result<AuditEntry, DomainError>;

    /// Entries for a proposal, newest first.
    async fn list_for_proposal(
        &self,
        proposal_id: i64,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<AuditEntry>, DomainError>;

    /// Per-action count and first/last occurrence for a proposal.
    async fn stats_for_proposal(&self, proposal_id: i64) -> Result<Vec<ActionStats>, DomainError>;
}
