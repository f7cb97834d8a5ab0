//! Submission retry configuration

use serde::Deserialize;
use std::time::Duration;

use crate::application::retry::{Backoff, RetryPolicy};

use super::error::ValidationError;

/// Retry driver configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    /// Total attempts per operation, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Per-attempt deadline in seconds
    #[serde(default = "default_attempt_timeout")]
    pub attempt_timeout_secs: u64,

    /// Backoff shape: "linear" or "exponential"
    #[serde(default = "default_backoff_kind")]
    pub backoff: String,

    /// Base delay between attempts in milliseconds
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
}

impl RetryConfig {
    /// Validate retry configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(1..=10).contains(&self.max_attempts) {
            return Err(ValidationError::InvalidRetryAttempts);
        }
        if !(1..=300).contains(&self.attempt_timeout_secs) {
            return Err(ValidationError::InvalidAttemptTimeout);
        }
        if self.backoff != "linear" && self.backoff != "exponential" {
            return Err(ValidationError::InvalidBackoffKind);
        }
        Ok(())
    }

    /// Build the runtime policy from this configuration.
    pub fn policy(&self) -> RetryPolicy {
        let delay = Duration::from_millis(self.base_delay_ms);
        RetryPolicy {
            max_attempts: self.max_attempts,
            attempt_timeout: Duration::from_secs(self.attempt_timeout_secs),
            backoff: match self.backoff.as_str() {
                "exponential" => Backoff::Exponential { base: delay },
                _ => Backoff::Linear { step: delay },
            },
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            attempt_timeout_secs: default_attempt_timeout(),
            backoff: default_backoff_kind(),
            base_delay_ms: default_base_delay_ms(),
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_attempt_timeout() -> u64 {
    10
}

fn default_backoff_kind() -> String {
    "linear".to_string()
}

fn default_base_delay_ms() -> u64 {
    500
}
