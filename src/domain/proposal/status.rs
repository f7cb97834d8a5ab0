//! Proposal lifecycle statuses.
//!
//! Defines the three orthogonal status tracks a proposal carries and the
//! validated transition table for the approval workflow.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{DomainError, ErrorCode, StateMachine};

/// Lifecycle stage of an event proposal in the approval workflow.
///
/// Only changes through a validated transition:
/// submit (`Draft -> Pending`), review (`Pending -> Approved | Denied |
/// RevisionRequested`), resubmit (`RevisionRequested -> Pending`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalStatus {
    /// Being edited by the submitter. Not yet visible to reviewers.
    Draft,

    /// Submitted and awaiting review.
    Pending,

    /// Accepted by a reviewer. Terminal.
    Approved,

    /// Rejected by a reviewer. Terminal.
    Denied,

    /// Sent back to the submitter for changes.
    RevisionRequested,
}

impl ProposalStatus {
    /// Canonical storage representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProposalStatus::Draft => "draft",
            ProposalStatus::Pending => "pending",
            ProposalStatus::Approved => "approved",
            ProposalStatus::Denied => "denied",
            ProposalStatus::RevisionRequested => "revision_requested",
        }
    }

    /// Parses the storage representation.
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        match s {
            "draft" => Ok(ProposalStatus::Draft),
            "pending" => Ok(ProposalStatus::Pending),
            "approved" => Ok(ProposalStatus::Approved),
            "denied" => Ok(ProposalStatus::Denied),
            "revision_requested" => Ok(ProposalStatus::RevisionRequested),
            _ => Err(DomainError::new(
                ErrorCode::InvalidFormat,
                format!("Invalid proposal status: {}", s),
            )),
        }
    }

    /// Returns true when a reviewer drives the edge into this status.
    pub fn is_review_outcome(&self) -> bool {
        matches!(
            self,
            ProposalStatus::Approved | ProposalStatus::Denied | ProposalStatus::RevisionRequested
        )
    }
}

impl StateMachine for ProposalStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use ProposalStatus::*;
        matches!(
            (self, target),
            // submit
            (Draft, Pending)
            // review
                | (Pending, Approved)
                | (Pending, Denied)
                | (Pending, RevisionRequested)
            // resubmit
                | (RevisionRequested, Pending)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use ProposalStatus::*;
        match self {
            Draft => vec![Pending],
            Pending => vec![Approved, Denied, RevisionRequested],
            Approved => vec![],
            Denied => vec![],
            RevisionRequested => vec![Pending],
        }
    }
}

/// Lifecycle stage of the post-event accomplishment report.
///
/// Independent of the proposal status track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Draft,
    Pending,
    Approved,
    Denied,
    NotApplicable,
}

impl ReportStatus {
    /// Canonical storage representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Draft => "draft",
            ReportStatus::Pending => "pending",
            ReportStatus::Approved => "approved",
            ReportStatus::Denied => "denied",
            ReportStatus::NotApplicable => "not_applicable",
        }
    }

    /// Parses the storage representation.
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        match s {
            "draft" => Ok(ReportStatus::Draft),
            "pending" => Ok(ReportStatus::Pending),
            "approved" => Ok(ReportStatus::Approved),
            "denied" => Ok(ReportStatus::Denied),
            "not_applicable" => Ok(ReportStatus::NotApplicable),
            _ => Err(DomainError::new(
                ErrorCode::InvalidFormat,
                format!("Invalid report status: {}", s),
            )),
        }
    }
}

/// Scheduling state of the event itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Scheduled,
    Ongoing,
    Completed,
    Cancelled,
    Postponed,
}

impl EventStatus {
    /// Canonical storage representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Scheduled => "scheduled",
            EventStatus::Ongoing => "ongoing",
            EventStatus::Completed => "completed",
            EventStatus::Cancelled => "cancelled",
            EventStatus::Postponed => "postponed",
        }
    }

    /// Parses the storage representation.
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        match s {
            "scheduled" => Ok(EventStatus::Scheduled),
            "ongoing" => Ok(EventStatus::Ongoing),
            "completed" => Ok(EventStatus::Completed),
            "cancelled" => Ok(EventStatus::Cancelled),
            "postponed" => Ok(EventStatus::Postponed),
            _ => Err(DomainError::new(
                ErrorCode::InvalidFormat,
                format!("Invalid event status: {}", s),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const ALL: [ProposalStatus; 5] = [
        ProposalStatus::Draft,
        ProposalStatus::Pending,
        ProposalStatus::Approved,
        ProposalStatus::Denied,
        ProposalStatus::RevisionRequested,
    ];

    #[test]
    fn draft_can_only_go_pending() {
        assert_eq!(
            ProposalStatus::Draft.valid_transitions(),
            vec![ProposalStatus::Pending]
        );
    }

    #[test]
    fn pending_has_three_review_outcomes() {
        let targets = ProposalStatus::Pending.valid_transitions();
        assert_eq!(targets.len(), 3);
        assert!(targets.iter().all(|t| t.is_review_outcome()));
    }

    #[test]
    fn approved_and_denied_are_terminal() {
        assert!(ProposalStatus::Approved.is_terminal());
        assert!(ProposalStatus::Denied.is_terminal());
    }

    #[test]
    fn revision_requested_allows_resubmit() {
        assert!(ProposalStatus::RevisionRequested.can_transition_to(&ProposalStatus::Pending));
        let result = ProposalStatus::RevisionRequested.transition_to(ProposalStatus::Pending);
        assert_eq!(result, Ok(ProposalStatus::Pending));
    }

    #[test]
    fn draft_cannot_skip_review() {
        assert!(!ProposalStatus::Draft.can_transition_to(&ProposalStatus::Approved));
        assert!(!ProposalStatus::Draft.can_transition_to(&ProposalStatus::Denied));
    }

    #[test]
    fn proposal_status_roundtrips_through_str() {
        for status in ALL {
            assert_eq!(ProposalStatus::parse(status.as_str()).unwrap(), status);
        }
    }

    #[test]
    fn proposal_status_parse_rejects_unknown() {
        assert!(ProposalStatus::parse("in_review").is_err());
    }

    #[test]
    fn report_status_roundtrips_through_str() {
        for status in [
            ReportStatus::Draft,
            ReportStatus::Pending,
            ReportStatus::Approved,
            ReportStatus::Denied,
            ReportStatus::NotApplicable,
        ] {
            assert_eq!(ReportStatus::parse(status.as_str()).unwrap(), status);
        }
    }

    #[test]
    fn event_status_roundtrips_through_str() {
        for status in [
            EventStatus::Scheduled,
            EventStatus::Ongoing,
            EventStatus::Completed,
            EventStatus::Cancelled,
            EventStatus::Postponed,
        ] {
            assert_eq!(EventStatus::parse(status.as_str()).unwrap(), status);
        }
    }

    #[test]
    fn serde_uses_snake_case() {
        let json = serde_json::to_string(&ProposalStatus::RevisionRequested).unwrap();
        assert_eq!(json, "\"revision_requested\"");
    }

    proptest! {
        // Every pair outside the explicit table must be rejected.
        #[test]
        fn off_table_edges_are_rejected(from in 0usize..5, to in 0usize..5) {
            let (from, to) = (ALL[from], ALL[to]);
            let in_table = matches!(
                (from, to),
                (ProposalStatus::Draft, ProposalStatus::Pending)
                    | (ProposalStatus::Pending, ProposalStatus::Approved)
                    | (ProposalStatus::Pending, ProposalStatus::Denied)
                    | (ProposalStatus::Pending, ProposalStatus::RevisionRequested)
                    | (ProposalStatus::RevisionRequested, ProposalStatus::Pending)
            );
            prop_assert_eq!(from.transition_to(to).is_ok(), in_table);
        }
    }
}
