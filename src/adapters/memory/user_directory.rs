//! In-memory user directory for testing.
//!
//! # Security Note
//!
//! This adapter is for **testing only** and should not be used in
//! production. It uses `.expect()` on lock operations which will panic if
//! locks are poisoned.

use async_trait::async_trait;
use std::sync::RwLock;

use crate::domain::foundation::{DomainError, UserId};
use crate::ports::UserDirectory;

/// In-memory stand-in for the external account system.
pub struct InMemoryUserDirectory {
    approved: RwLock<Vec<UserId>>,
    submission_inbox: RwLock<Option<UserId>>,
}

impl InMemoryUserDirectory {
    /// Creates an empty directory with no inbox configured.
    pub fn new() -> Self {
        Self {
            approved: RwLock::new(Vec::new()),
            submission_inbox: RwLock::new(None),
        }
    }

    /// Registers an approved user.
    pub fn add_approved(&self, user: UserId) {
        self.approved
            .write()
            .expect("InMemoryUserDirectory: lock poisoned")
            .push(user);
    }

    /// Configures the admin inbox for new submissions.
    pub fn set_submission_inbox(&self, admin: UserId) {
        *self
            .submission_inbox
            .write()
            .expect("InMemoryUserDirectory: lock poisoned") = Some(admin);
    }

    /// Removes the configured admin inbox.
    pub fn clear_submission_inbox(&self) {
        *self
            .submission_inbox
            .write()
            .expect("InMemoryUserDirectory: lock poisoned") = None;
    }
}

impl Default for InMemoryUserDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn approved_user_ids(&self) -> Result<Vec<UserId>, DomainError> {
        Ok(self
            .approved
            .read()
            .expect("InMemoryUserDirectory: lock poisoned")
            .clone())
    }

    async fn submission_inbox(&self) -> Result<Option<UserId>, DomainError> {
        Ok(self
            .submission_inbox
            .read()
            .expect("InMemoryUserDirectory: lock poisoned")
            .clone())
    }
}
