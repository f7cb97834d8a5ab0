//! User directory port - identity lookups the core does not own.
//!
//! Authentication and account management live outside this crate; the
//! workflow only needs two read-side lookups from them.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, UserId};

/// Read-side lookups against the external account system.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Users currently approved to receive broadcast notifications.
    async fn approved_user_ids(&self) -> Result<Vec<UserId>, DomainError>;

    /// The admin inbox that receives new-submission notifications.
    ///
    /// Returns `None` when no inbox is configured; the workflow logs and
    /// skips the submit notification in that case.
    async fn submission_inbox(&self) -> Result<Option<UserId>, DomainError>;
}
