//! Proposal gateway port - the client side of the network boundary.
//!
//! The retry driver calls the workflow's submit/save entry points through
//! this port. Implementations translate transport failures into the closed
//! [`GatewayError`] classification; raw transport strings must never leak
//! to end users.

use async_trait::async_trait;

use crate::domain::foundation::ProposalId;
use crate::domain::proposal::ProposalStatus;

/// Client-side access to the workflow's submission entry points.
#[async_trait]
pub trait ProposalGateway: Send + Sync {
    /// Submit the proposal for review.
    ///
    /// Submission is idempotent keyed by the proposal UUID: the server
    /// treats a duplicate submit of an already-pending proposal as a no-op
    /// success, so a retried attempt whose predecessor completed late cannot
    /// double-transition.
    async fn submit(&self, proposal: &ProposalId) -> Result<SubmitReceipt, GatewayError>;

    /// Save edited draft content without submitting.
    async fn save_draft(
        &self,
        proposal: &ProposalId,
        details: &serde_json::Value,
    ) -> Result<(), GatewayError>;
}

/// Server acknowledgement of a submit call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitReceipt {
    pub proposal: ProposalId,
    pub status: ProposalStatus,
    /// True when the proposal was already pending and nothing changed.
    pub already_pending: bool,
}

/// Classified failure from a gateway attempt.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The attempt did not complete within the per-attempt deadline.
    /// The underlying request may still finish server-side.
    #[error("attempt timed out after {timeout_secs}s")]
    Timeout {
        /// Configured per-attempt deadline.
        timeout_secs: u64,
    },

    /// Credentials are no longer valid.
    #[error("authentication expired")]
    AuthExpired,

    /// Connection-level failure before a response arrived.
    #[error("network error: {0}")]
    Network(String),

    /// The proposal does not exist server-side.
    #[error("proposal not found")]
    NotFound,

    /// The server rejected the request as malformed.
    #[error("validation rejected: {0}")]
    Validation(String),

    /// The server failed while handling the request.
    #[error("server error: status {status}")]
    Server {
        /// HTTP status code.
        status: u16,
    },
}

impl GatewayError {
    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Returns true if a retry might succeed.
    ///
    /// Timeouts, connection failures, and 5xx responses are transient;
    /// validation rejections and expired credentials are not.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GatewayError::Timeout { .. } | GatewayError::Network(_) | GatewayError::Server { .. }
        )
    }

    /// Human-readable message bucketed by cause.
    ///
    /// This is the only text shown to submitters; transport detail stays in
    /// the logs.
    pub fn user_message(&self) -> String {
        match self {
            GatewayError::Timeout { .. } => {
                "The submission timed out. Please try again.".to_string()
            }
            GatewayError::AuthExpired => {
                "Your session has expired. Please sign in again and resubmit.".to_string()
            }
            GatewayError::Network(_) => {
                "A network problem interrupted the submission. Check your connection and try again."
                    .to_string()
            }
            GatewayError::NotFound => "The proposal could not be found.".to_string(),
            GatewayError::Validation(_) => {
                "The proposal could not be submitted as entered. Please review the form and try again."
                    .to_string()
            }
            GatewayError::Server { .. } => {
                "The service is temporarily unavailable. Please try again shortly.".to_string()
            }
        }
    }
}
