//! In-memory proposal repository for testing.
//!
//! # Security Note
//!
//! This adapter is for **testing only** and should not be used in
//! production. It uses `.expect()` on lock operations which will panic if
//! locks are poisoned. Production code should use the postgres adapter.

use async_trait::async_trait;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::RwLock;

use crate::domain::foundation::{DomainError, ErrorCode, ProposalId};
use crate::domain::proposal::{Proposal, ProposalStatus};
use crate::ports::ProposalRepository;

/// In-memory proposal store with the same compare-and-swap semantics as the
/// postgres adapter: the status write holds the write lock for the whole
/// check-and-replace, so exactly one racing writer can win.
pub struct InMemoryProposalRepository {
    proposals: RwLock<Vec<Proposal>>,
    next_id: AtomicI64,
}

impl InMemoryProposalRepository {
    /// Creates an empty repository.
    pub fn new() -> Self {
        Self {
            proposals: RwLock::new(Vec::new()),
            next_id: AtomicI64::new(1),
        }
    }

    /// Returns all stored proposals (for test assertions).
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn all(&self) -> Vec<Proposal> {
        self.proposals
            .read()
            .expect("InMemoryProposalRepository: lock poisoned")
            .clone()
    }
}

impl Default for InMemoryProposalRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProposalRepository for InMemoryProposalRepository {
    async fn save(&self, proposal: &Proposal) -> Result<(), DomainError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let stored = Proposal::reconstitute(
            id,
            *proposal.uuid(),
            proposal.title().to_string(),
            proposal.submitter_id().clone(),
            proposal.details().clone(),
            proposal.proposal_status(),
            proposal.report_status(),
            proposal.event_status(),
            proposal.submitted_at().copied(),
            proposal.reviewed_at().copied(),
            proposal.approved_at().copied(),
            proposal.reviewer_id().cloned(),
            proposal.admin_comments().map(str::to_string),
            proposal.is_deleted(),
            *proposal.created_at(),
            *proposal.updated_at(),
        );
        self.proposals
            .write()
            .expect("InMemoryProposalRepository: lock poisoned")
            .push(stored);
        Ok(())
    }

    async fn find_by_uuid(&self, uuid: &ProposalId) -> Result<Option<Proposal>, DomainError> {
        Ok(self
            .proposals
            .read()
            .expect("InMemoryProposalRepository: lock poisoned")
            .iter()
            .find(|p| p.uuid() == uuid && !p.is_deleted())
            .cloned())
    }

    async fn resolve_internal_id(&self, uuid: &ProposalId) -> Result<Option<i64>, DomainError> {
        Ok(self
            .proposals
            .read()
            .expect("InMemoryProposalRepository: lock poisoned")
            .iter()
            .find(|p| p.uuid() == uuid)
            .map(|p| p.id()))
    }

    async fn update_status(
        &self,
        proposal: &Proposal,
        expected: ProposalStatus,
    ) -> Result<bool, DomainError> {
        let mut proposals = self
            .proposals
            .write()
            .expect("InMemoryProposalRepository: lock poisoned");

        match proposals
            .iter_mut()
            .find(|p| p.uuid() == proposal.uuid() && !p.is_deleted())
        {
            Some(stored) if stored.proposal_status() == expected => {
                let id = stored.id();
                *stored = Proposal::reconstitute(
                    id,
                    *proposal.uuid(),
                    proposal.title().to_string(),
                    proposal.submitter_id().clone(),
                    proposal.details().clone(),
                    proposal.proposal_status(),
                    proposal.report_status(),
                    proposal.event_status(),
                    proposal.submitted_at().copied(),
                    proposal.reviewed_at().copied(),
                    proposal.approved_at().copied(),
                    proposal.reviewer_id().cloned(),
                    proposal.admin_comments().map(str::to_string),
                    proposal.is_deleted(),
                    *proposal.created_at(),
                    *proposal.updated_at(),
                );
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn update_details(&self, proposal: &Proposal) -> Result<(), DomainError> {
        let mut proposals = self
            .proposals
            .write()
            .expect("InMemoryProposalRepository: lock poisoned");

        match proposals
            .iter_mut()
            .find(|p| p.uuid() == proposal.uuid() && !p.is_deleted())
        {
            Some(stored) => {
                let id = stored.id();
                *stored = Proposal::reconstitute(
                    id,
                    *proposal.uuid(),
                    proposal.title().to_string(),
                    proposal.submitter_id().clone(),
                    proposal.details().clone(),
                    stored.proposal_status(),
                    stored.report_status(),
                    stored.event_status(),
                    stored.submitted_at().copied(),
                    stored.reviewed_at().copied(),
                    stored.approved_at().copied(),
                    stored.reviewer_id().cloned(),
                    stored.admin_comments().map(str::to_string),
                    stored.is_deleted(),
                    *stored.created_at(),
                    *proposal.updated_at(),
                );
                Ok(())
            }
            None => Err(DomainError::new(
                ErrorCode::ProposalNotFound,
                format!("Proposal not found: {}", proposal.uuid()),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::UserId;

    fn draft(uuid: ProposalId) -> Proposal {
        Proposal::new(
            0,
            uuid,
            "Test".to_string(),
            UserId::new("student-1").unwrap(),
            serde_json::Value::Null,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn save_assigns_sequential_internal_ids() {
        let repo = InMemoryProposalRepository::new();
        let (a, b) = (ProposalId::new(), ProposalId::new());
        repo.save(&draft(a)).await.unwrap();
        repo.save(&draft(b)).await.unwrap();

        assert_eq!(repo.resolve_internal_id(&a).await.unwrap(), Some(1));
        assert_eq!(repo.resolve_internal_id(&b).await.unwrap(), Some(2));
    }

    #[tokio::test]
    async fn update_status_rejects_wrong_expected_status() {
        let repo = InMemoryProposalRepository::new();
        let uuid = ProposalId::new();
        repo.save(&draft(uuid)).await.unwrap();

        let mut loaded = repo.find_by_uuid(&uuid).await.unwrap().unwrap();
        loaded
            .apply_transition(
                ProposalStatus::Pending,
                &UserId::new("student-1").unwrap(),
                None,
            )
            .unwrap();

        // CAS keyed on the actual prior status succeeds
        assert!(repo
            .update_status(&loaded, ProposalStatus::Draft)
            .await
            .unwrap());
        // replaying the same expectation now fails
        assert!(!repo
            .update_status(&loaded, ProposalStatus::Draft)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn find_by_uuid_hides_deleted_proposals() {
        let repo = InMemoryProposalRepository::new();
        let uuid = ProposalId::new();
        let mut proposal = draft(uuid);
        proposal.mark_deleted();
        repo.save(&proposal).await.unwrap();

        assert!(repo.find_by_uuid(&uuid).await.unwrap().is_none());
        // the internal id still resolves for the audit trail
        assert_eq!(repo.resolve_internal_id(&uuid).await.unwrap(), Some(1));
    }
}
