//! Workflow-specific error types.

use crate::domain::foundation::{DomainError, ErrorCode, ProposalId};

use super::status::ProposalStatus;

/// Errors surfaced by the proposal workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    /// Proposal was not found (or is soft-deleted).
    NotFound(ProposalId),
    /// The requested edge is not in the transition table.
    InvalidTransition {
        from: ProposalStatus,
        to: ProposalStatus,
    },
    /// A concurrent writer moved the proposal first.
    Conflict { expected: ProposalStatus },
    /// Validation failed.
    ValidationFailed { field: String, message: String },
    /// Infrastructure error.
    Infrastructure(String),
}

impl WorkflowError {
    pub fn not_found(id: ProposalId) -> Self {
        WorkflowError::NotFound(id)
    }

    pub fn invalid_transition(from: ProposalStatus, to: ProposalStatus) -> Self {
        WorkflowError::InvalidTransition { from, to }
    }

    pub fn conflict(expected: ProposalStatus) -> Self {
        WorkflowError::Conflict { expected }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        WorkflowError::ValidationFailed {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn infrastructure(message: impl Into<String>) -> Self {
        WorkflowError::Infrastructure(message.into())
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            WorkflowError::NotFound(_) => ErrorCode::ProposalNotFound,
            WorkflowError::InvalidTransition { .. } => ErrorCode::InvalidStateTransition,
            WorkflowError::Conflict { .. } => ErrorCode::TransitionConflict,
            WorkflowError::ValidationFailed { .. } => ErrorCode::ValidationFailed,
            WorkflowError::Infrastructure(_) => ErrorCode::DatabaseError,
        }
    }

    pub fn message(&self) -> String {
        match self {
            WorkflowError::NotFound(id) => format!("Proposal not found: {}", id),
            WorkflowError::InvalidTransition { from, to } => format!(
                "Cannot transition proposal from {} to {}",
                from.as_str(),
                to.as_str()
            ),
            WorkflowError::Conflict { expected } => format!(
                "Proposal is no longer {}; another reviewer acted first",
                expected.as_str()
            ),
            WorkflowError::ValidationFailed { field, message } => {
                format!("Validation failed for '{}': {}", field, message)
            }
            WorkflowError::Infrastructure(msg) => format!("Error: {}", msg),
        }
    }
}

impl std::fmt::Display for WorkflowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for WorkflowError {}

impl WorkflowError {
    /// Maps a storage-layer error, attributing not-found codes to the
    /// proposal being acted on.
    pub fn from_domain(err: DomainError, id: &ProposalId) -> Self {
        match err.code {
            ErrorCode::ProposalNotFound | ErrorCode::ProposalDeleted => {
                WorkflowError::NotFound(*id)
            }
            ErrorCode::ValidationFailed => WorkflowError::ValidationFailed {
                field: err
                    .details
                    .get("field")
                    .cloned()
                    .unwrap_or_else(|| "unknown".to_string()),
                message: err.message,
            },
            _ => WorkflowError::Infrastructure(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_maps_to_transition_conflict_code() {
        let err = WorkflowError::conflict(ProposalStatus::Pending);
        assert_eq!(err.code(), ErrorCode::TransitionConflict);
        assert!(err.message().contains("another reviewer"));
    }

    #[test]
    fn invalid_transition_names_both_statuses() {
        let err =
            WorkflowError::invalid_transition(ProposalStatus::Draft, ProposalStatus::Approved);
        assert_eq!(err.code(), ErrorCode::InvalidStateTransition);
        assert!(err.message().contains("draft"));
        assert!(err.message().contains("approved"));
    }

    #[test]
    fn deleted_proposals_surface_as_not_found() {
        let id = ProposalId::new();
        let err = WorkflowError::from_domain(
            DomainError::new(ErrorCode::ProposalDeleted, "removed"),
            &id,
        );
        assert_eq!(err, WorkflowError::NotFound(id));
    }
}
