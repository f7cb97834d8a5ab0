//! Proposal repository port (write side).
//!
//! Defines the contract for persisting and retrieving Proposal aggregates.
//! Implementations handle the actual database operations.
//!
//! # Design
//!
//! - **Conditional status writes**: the status update is a compare-and-swap
//!   keyed on the expected prior status, so concurrent reviewers cannot
//!   silently overwrite each other
//! - **Soft deletes only**: proposals are never removed, only flagged

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, ProposalId};
use crate::domain::proposal::{Proposal, ProposalStatus};

/// Repository port for Proposal aggregate persistence.
#[async_trait]
pub trait ProposalRepository: Send + Sync {
    /// Save a new draft proposal.
    ///
    /// # Errors
    ///
    /// - `DatabaseError` on persistence failure
    async fn save(&self, proposal: &Proposal) -> Result<(), DomainError>;

    /// Find a proposal by its external identifier.
    ///
    /// Returns `None` if not found or soft-deleted.
    async fn find_by_uuid(&self, uuid: &ProposalId) -> Result<Option<Proposal>, DomainError>;

    /// Resolve the external identifier to the internal numeric id.
    ///
    /// Returns `None` if the identifier is unknown.
    async fn resolve_internal_id(&self, uuid: &ProposalId) -> Result<Option<i64>, DomainError>;

    /// Persist a status transition, conditioned on the expected prior status.
    ///
    /// Writes the aggregate's status, edge timestamps, reviewer, and comments
    /// only where the stored `proposal_status` still equals `expected`.
    /// Returns `false` when zero rows matched - the caller lost a race and
    /// must not treat the transition as applied.
    ///
    /// # Errors
    ///
    /// - `DatabaseError` on persistence failure
    async fn update_status(
        &self,
        proposal: &Proposal,
        expected: ProposalStatus,
    ) -> Result<bool, DomainError>;

    /// Persist edited draft content (title/details/updated_at).
    ///
    /// # Errors
    ///
    /// - `ProposalNotFound` if the proposal doesn't exist
    /// - `DatabaseError` on persistence failure
    async fn update_details(&self, proposal: &Proposal) -> Result<(), DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Trait object safety test
    #[test]
    fn proposal_repository_is_object_safe() {
        fn _accepts_dyn(_repo: &dyn ProposalRepository) {}
    }
}
