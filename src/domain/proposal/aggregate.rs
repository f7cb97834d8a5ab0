//! Proposal aggregate entity.
//!
//! A proposal is created in `Draft`, mutated only through validated
//! transitions, and never hard-deleted - removal is a soft flag.
//!
//! # Invariants
//!
//! - `proposal_status` only changes through the transition table
//! - `submitted_at` is set exactly once, on the first `Draft -> Pending` edge
//! - `reviewed_at` / `approved_at` are set only on reviewer-driven edges

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    DomainError, ErrorCode, ProposalId, StateMachine, Timestamp, UserId,
};

use super::status::{EventStatus, ProposalStatus, ReportStatus};

/// Maximum length for the proposal title.
pub const MAX_TITLE_LENGTH: usize = 500;

/// Event proposal aggregate.
///
/// The organization/contact payload is opaque to the workflow core and
/// carried as raw JSON in `details`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    /// Internal numeric id assigned by the store.
    id: i64,

    /// External identifier.
    uuid: ProposalId,

    /// Proposal title.
    title: String,

    /// User who created and submits the proposal.
    submitter_id: UserId,

    /// Organization/contact payload (opaque to this core).
    details: serde_json::Value,

    /// Approval workflow status.
    proposal_status: ProposalStatus,

    /// Post-event report status (independent track).
    report_status: ReportStatus,

    /// Scheduling state of the event itself.
    event_status: EventStatus,

    /// Set exactly once, on the first submit.
    submitted_at: Option<Timestamp>,

    /// Set on every reviewer-driven edge.
    reviewed_at: Option<Timestamp>,

    /// Set only on approval.
    approved_at: Option<Timestamp>,

    /// Reviewer who produced the latest review outcome.
    reviewer_id: Option<UserId>,

    /// Reviewer feedback attached to the latest review outcome.
    admin_comments: Option<String>,

    /// Soft-delete flag. Deleted proposals reject all transitions.
    deleted: bool,

    /// When the proposal was created.
    created_at: Timestamp,

    /// When the proposal was last updated.
    updated_at: Timestamp,
}

impl Proposal {
    /// Create a new draft proposal.
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` if title is empty or too long
    pub fn new(
        id: i64,
        uuid: ProposalId,
        title: String,
        submitter_id: UserId,
        details: serde_json::Value,
    ) -> Result<Self, DomainError> {
        Self::validate_title(&title)?;

        let now = Timestamp::now();
        Ok(Self {
            id,
            uuid,
            title,
            submitter_id,
            details,
            proposal_status: ProposalStatus::Draft,
            report_status: ReportStatus::NotApplicable,
            event_status: EventStatus::Scheduled,
            submitted_at: None,
            reviewed_at: None,
            approved_at: None,
            reviewer_id: None,
            admin_comments: None,
            deleted: false,
            created_at: now,
            updated_at: now,
        })
    }

    /// Reconstitute a proposal from persistence (no validation).
    #[allow(clippy::too_many_arguments)]
    pub fn reconstitute(
        id: i64,
        uuid: ProposalId,
        title: String,
        submitter_id: UserId,
        details: serde_json::Value,
        proposal_status: ProposalStatus,
        report_status: ReportStatus,
        event_status: EventStatus,
        submitted_at: Option<Timestamp>,
        reviewed_at: Option<Timestamp>,
        approved_at: Option<Timestamp>,
        reviewer_id: Option<UserId>,
        admin_comments: Option<String>,
        deleted: bool,
        created_at: Timestamp,
        updated_at: Timestamp,
    ) -> Self {
        Self {
            id,
            uuid,
            title,
            submitter_id,
            details,
            proposal_status,
            report_status,
            event_status,
            submitted_at,
            reviewed_at,
            approved_at,
            reviewer_id,
            admin_comments,
            deleted,
            created_at,
            updated_at,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    /// Returns the internal numeric id.
    pub fn id(&self) -> i64 {
        self.id
    }

    /// Returns the external identifier.
    pub fn uuid(&self) -> &ProposalId {
        &self.uuid
    }

    /// Returns the proposal title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the submitter's user id.
    pub fn submitter_id(&self) -> &UserId {
        &self.submitter_id
    }

    /// Returns the opaque organization/contact payload.
    pub fn details(&self) -> &serde_json::Value {
        &self.details
    }

    /// Returns the approval workflow status.
    pub fn proposal_status(&self) -> ProposalStatus {
        self.proposal_status
    }

    /// Returns the report status.
    pub fn report_status(&self) -> ReportStatus {
        self.report_status
    }

    /// Returns the event scheduling status.
    pub fn event_status(&self) -> EventStatus {
        self.event_status
    }

    /// Returns when the proposal was first submitted.
    pub fn submitted_at(&self) -> Option<&Timestamp> {
        self.submitted_at.as_ref()
    }

    /// Returns when the latest review happened.
    pub fn reviewed_at(&self) -> Option<&Timestamp> {
        self.reviewed_at.as_ref()
    }

    /// Returns when the proposal was approved.
    pub fn approved_at(&self) -> Option<&Timestamp> {
        self.approved_at.as_ref()
    }

    /// Returns the latest reviewer.
    pub fn reviewer_id(&self) -> Option<&UserId> {
        self.reviewer_id.as_ref()
    }

    /// Returns the latest reviewer feedback.
    pub fn admin_comments(&self) -> Option<&str> {
        self.admin_comments.as_deref()
    }

    /// Returns true if the proposal is soft-deleted.
    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    /// Returns when the proposal was created.
    pub fn created_at(&self) -> &Timestamp {
        &self.created_at
    }

    /// Returns when the proposal was last updated.
    pub fn updated_at(&self) -> &Timestamp {
        &self.updated_at
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Mutations
    // ─────────────────────────────────────────────────────────────────────────

    /// Apply a validated status transition.
    ///
    /// Sets the timestamp appropriate to the edge: `submitted_at` on the
    /// first submit, `reviewed_at` on every review edge, `approved_at` on
    /// approval. Review edges also record the reviewer and their comments.
    ///
    /// # Errors
    ///
    /// - `ProposalDeleted` if the proposal is soft-deleted
    /// - `InvalidStateTransition` if the edge is not in the table
    pub fn apply_transition(
        &mut self,
        target: ProposalStatus,
        actor: &UserId,
        comment: Option<String>,
    ) -> Result<(), DomainError> {
        self.ensure_not_deleted()?;

        if !self.proposal_status.can_transition_to(&target) {
            return Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!(
                    "Cannot transition proposal from {} to {}",
                    self.proposal_status.as_str(),
                    target.as_str()
                ),
            ));
        }

        let now = Timestamp::now();
        match (self.proposal_status, target) {
            (ProposalStatus::Draft, ProposalStatus::Pending) => {
                if self.submitted_at.is_none() {
                    self.submitted_at = Some(now);
                }
            }
            (ProposalStatus::RevisionRequested, ProposalStatus::Pending) => {
                // submitted_at stays as set by the first submit
            }
            (ProposalStatus::Pending, outcome) => {
                self.reviewed_at = Some(now);
                if outcome == ProposalStatus::Approved {
                    self.approved_at = Some(now);
                }
                self.reviewer_id = Some(actor.clone());
                self.admin_comments = comment;
            }
            // unreachable while the transition table holds
            _ => {}
        }

        self.proposal_status = target;
        self.updated_at = now;
        Ok(())
    }

    /// Replace the draft payload.
    ///
    /// Only allowed while the submitter still owns the content, i.e. in
    /// `Draft` or `RevisionRequested`.
    ///
    /// # Errors
    ///
    /// - `ProposalDeleted` if the proposal is soft-deleted
    /// - `InvalidStateTransition` if the proposal is under or past review
    pub fn update_details(&mut self, details: serde_json::Value) -> Result<(), DomainError> {
        self.ensure_not_deleted()?;

        if !matches!(
            self.proposal_status,
            ProposalStatus::Draft | ProposalStatus::RevisionRequested
        ) {
            return Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!(
                    "Cannot edit a proposal in status {}",
                    self.proposal_status.as_str()
                ),
            ));
        }

        self.details = details;
        self.updated_at = Timestamp::now();
        Ok(())
    }

    /// Soft-delete the proposal.
    pub fn mark_deleted(&mut self) {
        self.deleted = true;
        self.updated_at = Timestamp::now();
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Private helpers
    // ─────────────────────────────────────────────────────────────────────────

    fn ensure_not_deleted(&self) -> Result<(), DomainError> {
        if self.deleted {
            Err(DomainError::new(
                ErrorCode::ProposalDeleted,
                format!("Proposal {} has been removed", self.uuid),
            ))
        } else {
            Ok(())
        }
    }

    fn validate_title(title: &str) -> Result<(), DomainError> {
        let trimmed = title.trim();
        if trimmed.is_empty() {
            return Err(DomainError::validation("title", "Title cannot be empty"));
        }
        if trimmed.len() > MAX_TITLE_LENGTH {
            return Err(DomainError::validation(
                "title",
                format!("Title must be {} characters or less", MAX_TITLE_LENGTH),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submitter() -> UserId {
        UserId::new("student-1").unwrap()
    }

    fn reviewer() -> UserId {
        UserId::new("admin-1").unwrap()
    }

    fn draft_proposal() -> Proposal {
        Proposal::new(
            1,
            ProposalId::new(),
            "Science Fair".to_string(),
            submitter(),
            serde_json::json!({"organization": "Physics Club"}),
        )
        .unwrap()
    }

    // Construction tests

    #[test]
    fn new_proposal_starts_in_draft() {
        let proposal = draft_proposal();
        assert_eq!(proposal.proposal_status(), ProposalStatus::Draft);
        assert_eq!(proposal.report_status(), ReportStatus::NotApplicable);
        assert!(proposal.submitted_at().is_none());
        assert!(!proposal.is_deleted());
    }

    #[test]
    fn new_proposal_rejects_empty_title() {
        let result = Proposal::new(
            1,
            ProposalId::new(),
            "   ".to_string(),
            submitter(),
            serde_json::Value::Null,
        );
        assert!(result.is_err());
    }

    #[test]
    fn new_proposal_rejects_too_long_title() {
        let result = Proposal::new(
            1,
            ProposalId::new(),
            "x".repeat(MAX_TITLE_LENGTH + 1),
            submitter(),
            serde_json::Value::Null,
        );
        assert!(result.is_err());
    }

    // Transition tests

    #[test]
    fn submit_sets_submitted_at() {
        let mut proposal = draft_proposal();
        proposal
            .apply_transition(ProposalStatus::Pending, &submitter(), None)
            .unwrap();

        assert_eq!(proposal.proposal_status(), ProposalStatus::Pending);
        assert!(proposal.submitted_at().is_some());
        assert!(proposal.reviewed_at().is_none());
    }

    #[test]
    fn approve_sets_review_fields() {
        let mut proposal = draft_proposal();
        proposal
            .apply_transition(ProposalStatus::Pending, &submitter(), None)
            .unwrap();
        proposal
            .apply_transition(
                ProposalStatus::Approved,
                &reviewer(),
                Some("Looks good".to_string()),
            )
            .unwrap();

        assert_eq!(proposal.proposal_status(), ProposalStatus::Approved);
        assert!(proposal.reviewed_at().is_some());
        assert!(proposal.approved_at().is_some());
        assert_eq!(proposal.reviewer_id(), Some(&reviewer()));
        assert_eq!(proposal.admin_comments(), Some("Looks good"));
    }

    #[test]
    fn deny_does_not_set_approved_at() {
        let mut proposal = draft_proposal();
        proposal
            .apply_transition(ProposalStatus::Pending, &submitter(), None)
            .unwrap();
        proposal
            .apply_transition(
                ProposalStatus::Denied,
                &reviewer(),
                Some("Insufficient budget detail".to_string()),
            )
            .unwrap();

        assert_eq!(proposal.proposal_status(), ProposalStatus::Denied);
        assert!(proposal.reviewed_at().is_some());
        assert!(proposal.approved_at().is_none());
    }

    #[test]
    fn resubmit_keeps_original_submitted_at() {
        let mut proposal = draft_proposal();
        proposal
            .apply_transition(ProposalStatus::Pending, &submitter(), None)
            .unwrap();
        let first_submit = *proposal.submitted_at().unwrap();

        proposal
            .apply_transition(
                ProposalStatus::RevisionRequested,
                &reviewer(),
                Some("Add a venue".to_string()),
            )
            .unwrap();
        proposal
            .apply_transition(ProposalStatus::Pending, &submitter(), None)
            .unwrap();

        assert_eq!(proposal.submitted_at(), Some(&first_submit));
    }

    #[test]
    fn invalid_edge_leaves_status_unchanged() {
        let mut proposal = draft_proposal();
        let result = proposal.apply_transition(ProposalStatus::Approved, &reviewer(), None);

        assert!(result.is_err());
        assert_eq!(proposal.proposal_status(), ProposalStatus::Draft);
        assert!(proposal.reviewed_at().is_none());
    }

    #[test]
    fn deleted_proposal_rejects_transitions() {
        let mut proposal = draft_proposal();
        proposal.mark_deleted();

        let result = proposal.apply_transition(ProposalStatus::Pending, &submitter(), None);
        assert!(result.is_err());
        assert_eq!(
            result.unwrap_err().code,
            crate::domain::foundation::ErrorCode::ProposalDeleted
        );
    }

    // Draft editing tests

    #[test]
    fn update_details_allowed_in_draft() {
        let mut proposal = draft_proposal();
        proposal
            .update_details(serde_json::json!({"organization": "Chem Club"}))
            .unwrap();
        assert_eq!(proposal.details()["organization"], "Chem Club");
    }

    #[test]
    fn update_details_allowed_after_revision_request() {
        let mut proposal = draft_proposal();
        proposal
            .apply_transition(ProposalStatus::Pending, &submitter(), None)
            .unwrap();
        proposal
            .apply_transition(ProposalStatus::RevisionRequested, &reviewer(), None)
            .unwrap();

        assert!(proposal
            .update_details(serde_json::json!({"venue": "Main hall"}))
            .is_ok());
    }

    #[test]
    fn update_details_rejected_while_pending() {
        let mut proposal = draft_proposal();
        proposal
            .apply_transition(ProposalStatus::Pending, &submitter(), None)
            .unwrap();

        assert!(proposal.update_details(serde_json::Value::Null).is_err());
    }
}
