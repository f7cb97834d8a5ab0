//! Submission retry driver.
//!
//! Runs a gateway operation with bounded retries: each attempt races a
//! per-attempt deadline, failures are classified through
//! [`GatewayError::is_retryable`], and attempts are spaced by a
//! configurable backoff. The deadline cancels the *wait*, not the in-flight
//! request - the server may still complete a timed-out attempt, which is
//! why submission is idempotent keyed by the proposal UUID.

use std::sync::Arc;
use std::time::Duration;

use crate::domain::foundation::ProposalId;
use crate::ports::{GatewayError, ProposalGateway, SubmitReceipt};

/// Delay policy between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// `step`, `2*step`, `3*step`, ...
    Linear { step: Duration },
    /// `base`, `2*base`, `4*base`, ...
    Exponential { base: Duration },
}

impl Backoff {
    /// Delay to sleep after `completed_attempts` failed attempts.
    pub fn delay_after(&self, completed_attempts: u32) -> Duration {
        match self {
            Backoff::Linear { step } => *step * completed_attempts,
            Backoff::Exponential { base } => {
                *base * 2u32.saturating_pow(completed_attempts.saturating_sub(1))
            }
        }
    }
}

/// Bounds for one retried operation.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first.
    pub max_attempts: u32,
    /// Deadline raced against each attempt.
    pub attempt_timeout: Duration,
    /// Delay policy between attempts.
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            attempt_timeout: Duration::from_secs(10),
            backoff: Backoff::Linear {
                step: Duration::from_millis(500),
            },
        }
    }
}

/// Run `operation` under the policy's attempt and timeout bounds.
///
/// A timed-out attempt counts as a retryable failure. A non-retryable
/// classification returns immediately with no further attempts. Exhausting
/// the attempt budget returns the last error.
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, mut operation: F) -> Result<T, GatewayError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, GatewayError>>,
{
    let attempts = policy.max_attempts.max(1);
    let mut last_err: Option<GatewayError> = None;

    for attempt in 1..=attempts {
        match tokio::time::timeout(policy.attempt_timeout, operation()).await {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(err)) if !err.is_retryable() => return Err(err),
            Ok(Err(err)) => {
                tracing::warn!(attempt, error = %err, "attempt failed, will retry");
                last_err = Some(err);
            }
            Err(_) => {
                tracing::warn!(attempt, "attempt timed out, will retry");
                last_err = Some(GatewayError::Timeout {
                    timeout_secs: policy.attempt_timeout.as_secs(),
                });
            }
        }

        if attempt < attempts {
            tokio::time::sleep(policy.backoff.delay_after(attempt)).await;
        }
    }

    Err(last_err.unwrap_or(GatewayError::Timeout {
        timeout_secs: policy.attempt_timeout.as_secs(),
    }))
}

/// Client-facing submission driver.
///
/// Wraps a [`ProposalGateway`] with the retry policy and surfaces only
/// classified errors; callers render [`GatewayError::user_message`].
pub struct SubmissionClient {
    gateway: Arc<dyn ProposalGateway>,
    policy: RetryPolicy,
}

impl SubmissionClient {
    pub fn new(gateway: Arc<dyn ProposalGateway>, policy: RetryPolicy) -> Self {
        Self { gateway, policy }
    }

    /// Submit the proposal, retrying transient failures.
    pub async fn submit(&self, proposal: &ProposalId) -> Result<SubmitReceipt, GatewayError> {
        with_retry(&self.policy, || self.gateway.submit(proposal)).await
    }

    /// Save edited draft content, retrying transient failures.
    pub async fn save_draft(
        &self,
        proposal: &ProposalId,
        details: &serde_json::Value,
    ) -> Result<(), GatewayError> {
        with_retry(&self.policy, || self.gateway.save_draft(proposal, details)).await
    }
}
