//! Notification subsystem configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Notification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationsConfig {
    /// Days an expired notification is retained before the cleanup sweep
    /// hard-deletes it
    #[serde(default = "default_retention_days")]
    pub expired_retention_days: i64,
}

impl NotificationsConfig {
    /// Validate notification configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(1..=365).contains(&self.expired_retention_days) {
            return Err(ValidationError::InvalidRetentionWindow);
        }
        Ok(())
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            expired_retention_days: default_retention_days(),
        }
    }
}

fn default_retention_days() -> i64 {
    30
}
