//! Notification repository port.
//!
//! All mutations are predicate-guarded (time- or status-based), so the
//! cleanup sweep is safe to run concurrently with reads and creates.
//! Methods that depend on lazy expiry take the reference instant explicitly.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, NotificationId, Timestamp, UserId};
use crate::domain::notification::{
    NewNotification, Notification, NotificationFilter, NotificationPreference,
};

/// Repository port for notification persistence.
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// Insert a new notification with `status = pending`, assigning its id.
    async fn insert(&self, input: NewNotification) -> Result<Notification, DomainError>;

    /// Flip a pending notification to `delivered` at the given instant.
    async fn mark_delivered(&self, id: i64, at: Timestamp) -> Result<(), DomainError>;

    /// A user's notifications, excluding expired rows and rows past their
    /// `expires_at`, ordered by priority rank descending then `created_at`
    /// descending, paginated by the filter.
    async fn list_for_user(
        &self,
        user: &UserId,
        filter: &NotificationFilter,
        now: Timestamp,
    ) -> Result<Vec<Notification>, DomainError>;

    /// Count of rows with `status != read`, same exclusions as listing.
    async fn unread_count(&self, user: &UserId, now: Timestamp) -> Result<u64, DomainError>;

    /// Mark notifications read. With ids, only those belonging to the user;
    /// without, every unread row for the user. Returns the number updated.
    async fn mark_read(
        &self,
        user: &UserId,
        ids: Option<&[NotificationId]>,
        at: Timestamp,
    ) -> Result<u64, DomainError>;

    /// Archive read notifications belonging to the user. Returns the number
    /// updated.
    async fn archive(&self, user: &UserId, ids: &[NotificationId]) -> Result<u64, DomainError>;

    /// Phase 1 of cleanup: set `status = expired` on rows past `expires_at`
    /// that are not already expired. Returns the number updated.
    async fn expire_due(&self, now: Timestamp) -> Result<u64, DomainError>;

    /// Phase 2 of cleanup: hard-delete expired rows whose `expires_at` is
    /// older than the cutoff. Returns the number deleted.
    async fn delete_expired_before(&self, cutoff: Timestamp) -> Result<u64, DomainError>;

    /// Insert or replace the preference row for `(user, kind)`.
    async fn upsert_preference(&self, pref: &NotificationPreference) -> Result<(), DomainError>;

    /// All preference rows for a user.
    async fn preferences_for_user(
        &self,
        user: &UserId,
    ) -> Result<Vec<NotificationPreference>, DomainError>;
}
