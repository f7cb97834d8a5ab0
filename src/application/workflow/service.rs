//! ProposalWorkflow - validated status transitions with audited,
//! notified side effects.
//!
//! The status write is the authoritative operation and is conditioned on
//! the expected prior status (compare-and-swap), so two reviewers racing
//! on the same proposal cannot both win. Audit and notification calls run
//! after the committed write and are best-effort: their failures are
//! logged and never roll back or fail the transition.

use std::sync::Arc;

use crate::application::audit::{AuditRecorder, RecordDetails};
use crate::application::notification::{NotificationDispatcher, ProposalEvent};
use crate::domain::foundation::{ErrorCode, ProposalId, UserId};
use crate::domain::proposal::{Proposal, ProposalStatus, WorkflowError};
use crate::ports::{ProposalRepository, UserDirectory};

/// Service driving the proposal approval state machine.
pub struct ProposalWorkflow {
    proposals: Arc<dyn ProposalRepository>,
    recorder: Arc<AuditRecorder>,
    dispatcher: Arc<NotificationDispatcher>,
    directory: Arc<dyn UserDirectory>,
}

impl ProposalWorkflow {
    pub fn new(
        proposals: Arc<dyn ProposalRepository>,
        recorder: Arc<AuditRecorder>,
        dispatcher: Arc<NotificationDispatcher>,
        directory: Arc<dyn UserDirectory>,
    ) -> Self {
        Self {
            proposals,
            recorder,
            dispatcher,
            directory,
        }
    }

    /// Apply one validated status transition.
    ///
    /// On success the new status and its edge timestamps are persisted,
    /// then one audit entry and the event's notification set are produced
    /// best-effort.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the UUID does not resolve (or the proposal is
    ///   soft-deleted)
    /// - `InvalidTransition` if the edge is not in the table; the stored
    ///   status is untouched
    /// - `Conflict` if a concurrent writer moved the proposal first; no
    ///   side effects were applied for this caller
    /// - `Infrastructure` on storage failure
    pub async fn transition(
        &self,
        uuid: &ProposalId,
        target: ProposalStatus,
        actor: &UserId,
        comment: Option<String>,
    ) -> Result<Proposal, WorkflowError> {
        let mut proposal = self
            .proposals
            .find_by_uuid(uuid)
            .await
            .map_err(|e| WorkflowError::from_domain(e, uuid))?
            .ok_or(WorkflowError::NotFound(*uuid))?;

        let prior = proposal.proposal_status();
        proposal
            .apply_transition(target, actor, comment.clone())
            .map_err(|e| match e.code {
                ErrorCode::InvalidStateTransition => WorkflowError::invalid_transition(prior, target),
                _ => WorkflowError::from_domain(e, uuid),
            })?;

        let applied = self
            .proposals
            .update_status(&proposal, prior)
            .await
            .map_err(|e| WorkflowError::from_domain(e, uuid))?;
        if !applied {
            return Err(WorkflowError::conflict(prior));
        }

        tracing::info!(
            proposal = %uuid,
            from = prior.as_str(),
            to = target.as_str(),
            actor = %actor,
            "proposal transition applied"
        );

        self.run_side_effects(&proposal, prior, target, actor, comment)
            .await;

        Ok(proposal)
    }

    /// Submit a proposal for review.
    ///
    /// Idempotent keyed by the proposal UUID: a duplicate submit of an
    /// already-pending proposal is a no-op success with no second audit row
    /// or notification. This tolerates a retried client attempt whose
    /// timed-out predecessor completed server-side.
    pub async fn submit(
        &self,
        uuid: &ProposalId,
        actor: &UserId,
    ) -> Result<Proposal, WorkflowError> {
        let proposal = self
            .proposals
            .find_by_uuid(uuid)
            .await
            .map_err(|e| WorkflowError::from_domain(e, uuid))?
            .ok_or(WorkflowError::NotFound(*uuid))?;

        if proposal.proposal_status() == ProposalStatus::Pending {
            tracing::info!(proposal = %uuid, "duplicate submit ignored, already pending");
            return Ok(proposal);
        }

        self.transition(uuid, ProposalStatus::Pending, actor, None)
            .await
    }

    /// Persist edited draft content without submitting.
    ///
    /// Only allowed while the submitter still owns the content, i.e. in
    /// `Draft` or `RevisionRequested`.
    pub async fn save_draft(
        &self,
        uuid: &ProposalId,
        actor: &UserId,
        details: serde_json::Value,
    ) -> Result<Proposal, WorkflowError> {
        let mut proposal = self
            .proposals
            .find_by_uuid(uuid)
            .await
            .map_err(|e| WorkflowError::from_domain(e, uuid))?
            .ok_or(WorkflowError::NotFound(*uuid))?;

        let status = proposal.proposal_status();
        proposal.update_details(details).map_err(|e| match e.code {
            ErrorCode::InvalidStateTransition => WorkflowError::validation(
                "proposal_status",
                format!("Cannot edit a proposal in status {}", status.as_str()),
            ),
            _ => WorkflowError::from_domain(e, uuid),
        })?;

        self.proposals
            .update_details(&proposal)
            .await
            .map_err(|e| WorkflowError::from_domain(e, uuid))?;

        self.recorder
            .record(uuid, "proposal_updated", actor, None, RecordDetails::default())
            .await;

        Ok(proposal)
    }

    /// Best-effort side effects after a committed transition.
    ///
    /// Audit and notification run independently; a failure in either is
    /// logged and does not reach the caller or affect the other.
    async fn run_side_effects(
        &self,
        proposal: &Proposal,
        prior: ProposalStatus,
        target: ProposalStatus,
        actor: &UserId,
        comment: Option<String>,
    ) {
        let event_name = match (prior, target) {
            (ProposalStatus::Draft, ProposalStatus::Pending) => "proposal_submitted",
            (ProposalStatus::RevisionRequested, ProposalStatus::Pending) => "proposal_resubmitted",
            (ProposalStatus::Pending, ProposalStatus::Approved) => "proposal_approved",
            (ProposalStatus::Pending, ProposalStatus::Denied) => "proposal_rejected",
            (ProposalStatus::Pending, ProposalStatus::RevisionRequested) => "revision_requested",
            // the transition table admits no other edge
            _ => "proposal_updated",
        };

        self.recorder
            .record(
                proposal.uuid(),
                event_name,
                actor,
                comment,
                RecordDetails {
                    old_value: Some(prior.as_str().to_string()),
                    new_value: Some(target.as_str().to_string()),
                    metadata: None,
                },
            )
            .await;

        let event = match target {
            ProposalStatus::Pending => Some(ProposalEvent::Submitted),
            ProposalStatus::Approved => Some(ProposalEvent::Approved),
            ProposalStatus::Denied => Some(ProposalEvent::Rejected),
            // revision requests surface through the audit trail only
            _ => None,
        };
        let Some(event) = event else {
            return;
        };

        let result = match event {
            ProposalEvent::Submitted => match self.directory.submission_inbox().await {
                Ok(Some(admin)) => self
                    .dispatcher
                    .on_proposal_event(event, proposal, &admin, actor)
                    .await
                    .map(|_| ()),
                Ok(None) => {
                    tracing::warn!(
                        proposal = %proposal.uuid(),
                        "no submission inbox configured, submit notification skipped"
                    );
                    Ok(())
                }
                Err(err) => Err(err),
            },
            ProposalEvent::Approved | ProposalEvent::Rejected => self
                .dispatcher
                .on_proposal_event(event, proposal, actor, proposal.submitter_id())
                .await
                .map(|_| ()),
        };

        if let Err(err) = result {
            tracing::warn!(
                proposal = %proposal.uuid(),
                error = %err,
                "transition notification failed, status change stands"
            );
        }
    }
}
