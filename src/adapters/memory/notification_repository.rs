//! In-memory notification repository for testing.
//!
//! # Security Note
//!
//! This adapter is for **testing only** and should not be used in
//! production. It uses `.expect()` on lock operations which will panic if
//! locks are poisoned. Production code should use the postgres adapter.

use async_trait::async_trait;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::RwLock;

use crate::domain::foundation::{DomainError, ErrorCode, NotificationId, Timestamp, UserId};
use crate::domain::notification::{
    NewNotification, Notification, NotificationFilter, NotificationPreference, NotificationStatus,
};
use crate::ports::NotificationRepository;

/// In-memory notification store with per-recipient failure injection for
/// exercising the dispatcher's partial-failure tolerance.
pub struct InMemoryNotificationRepository {
    rows: RwLock<Vec<Notification>>,
    preferences: RwLock<Vec<NotificationPreference>>,
    failing_recipients: RwLock<Vec<UserId>>,
    next_id: AtomicI64,
}

impl InMemoryNotificationRepository {
    /// Creates an empty repository.
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(Vec::new()),
            preferences: RwLock::new(Vec::new()),
            failing_recipients: RwLock::new(Vec::new()),
            next_id: AtomicI64::new(1),
        }
    }

    /// Makes inserts for the given recipient fail (for test assertions).
    pub fn fail_for(&self, recipient: UserId) {
        self.failing_recipients
            .write()
            .expect("InMemoryNotificationRepository: lock poisoned")
            .push(recipient);
    }

    /// Returns all rows in insertion order (for test assertions).
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn all(&self) -> Vec<Notification> {
        self.rows
            .read()
            .expect("InMemoryNotificationRepository: lock poisoned")
            .clone()
    }

    fn matches_filter(n: &Notification, filter: &NotificationFilter) -> bool {
        if filter.unread_only && !n.is_unread() {
            return false;
        }
        if let Some(priority) = filter.priority {
            if n.priority() != priority {
                return false;
            }
        }
        if let Some(status) = filter.status {
            if n.status() != status {
                return false;
            }
        }
        if let Some(kind) = filter.kind {
            if n.kind() != kind {
                return false;
            }
        }
        true
    }
}

impl Default for InMemoryNotificationRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NotificationRepository for InMemoryNotificationRepository {
    async fn insert(&self, input: NewNotification) -> Result<Notification, DomainError> {
        if self
            .failing_recipients
            .read()
            .expect("InMemoryNotificationRepository: lock poisoned")
            .contains(&input.recipient_id)
        {
            return Err(DomainError::new(
                ErrorCode::DatabaseError,
                "Simulated insert failure",
            ));
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let notification = Notification::new(id, input);
        self.rows
            .write()
            .expect("InMemoryNotificationRepository: lock poisoned")
            .push(notification.clone());
        Ok(notification)
    }

    async fn mark_delivered(&self, id: i64, at: Timestamp) -> Result<(), DomainError> {
        let mut rows = self
            .rows
            .write()
            .expect("InMemoryNotificationRepository: lock poisoned");
        match rows.iter_mut().find(|n| n.id() == id) {
            Some(n) => n.deliver(at),
            None => Err(DomainError::new(
                ErrorCode::NotificationNotFound,
                format!("Notification not found: {}", id),
            )),
        }
    }

    async fn list_for_user(
        &self,
        user: &UserId,
        filter: &NotificationFilter,
        now: Timestamp,
    ) -> Result<Vec<Notification>, DomainError> {
        let mut matching: Vec<Notification> = self
            .rows
            .read()
            .expect("InMemoryNotificationRepository: lock poisoned")
            .iter()
            .filter(|n| n.recipient_id() == user)
            .filter(|n| !n.is_expired_by(&now))
            .filter(|n| Self::matches_filter(n, filter))
            .cloned()
            .collect();

        matching.sort_by(|a, b| {
            b.priority()
                .rank()
                .cmp(&a.priority().rank())
                .then(b.created_at().cmp(a.created_at()))
                .then(b.id().cmp(&a.id()))
        });

        Ok(matching
            .into_iter()
            .skip(filter.offset() as usize)
            .take(filter.effective_limit() as usize)
            .collect())
    }

    async fn unread_count(&self, user: &UserId, now: Timestamp) -> Result<u64, DomainError> {
        Ok(self
            .rows
            .read()
            .expect("InMemoryNotificationRepository: lock poisoned")
            .iter()
            .filter(|n| n.recipient_id() == user)
            .filter(|n| !n.is_expired_by(&now))
            .filter(|n| n.is_unread())
            .count() as u64)
    }

    async fn mark_read(
        &self,
        user: &UserId,
        ids: Option<&[NotificationId]>,
        at: Timestamp,
    ) -> Result<u64, DomainError> {
        let mut rows = self
            .rows
            .write()
            .expect("InMemoryNotificationRepository: lock poisoned");

        let mut updated = 0u64;
        for n in rows.iter_mut().filter(|n| n.recipient_id() == user) {
            if let Some(ids) = ids {
                if !ids.contains(n.uuid()) {
                    continue;
                }
            }
            if n.status() == NotificationStatus::Delivered && n.mark_read(at).is_ok() {
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn archive(&self, user: &UserId, ids: &[NotificationId]) -> Result<u64, DomainError> {
        let mut rows = self
            .rows
            .write()
            .expect("InMemoryNotificationRepository: lock poisoned");

        let mut updated = 0u64;
        for n in rows
            .iter_mut()
            .filter(|n| n.recipient_id() == user && ids.contains(n.uuid()))
        {
            if n.archive().is_ok() {
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn expire_due(&self, now: Timestamp) -> Result<u64, DomainError> {
        let mut rows = self
            .rows
            .write()
            .expect("InMemoryNotificationRepository: lock poisoned");

        let mut updated = 0u64;
        for n in rows.iter_mut() {
            if n.status() != NotificationStatus::Expired
                && n.is_expired_by(&now)
                && n.expire().is_ok()
            {
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn delete_expired_before(&self, cutoff: Timestamp) -> Result<u64, DomainError> {
        let mut rows = self
            .rows
            .write()
            .expect("InMemoryNotificationRepository: lock poisoned");

        let before = rows.len();
        rows.retain(|n| {
            !(n.status() == NotificationStatus::Expired
                && n.expires_at().map(|at| at <= &cutoff).unwrap_or(false))
        });
        Ok((before - rows.len()) as u64)
    }

    async fn upsert_preference(&self, pref: &NotificationPreference) -> Result<(), DomainError> {
        let mut preferences = self
            .preferences
            .write()
            .expect("InMemoryNotificationRepository: lock poisoned");

        preferences.retain(|p| !(p.user_id == pref.user_id && p.kind == pref.kind));
        preferences.push(pref.clone());
        Ok(())
    }

    async fn preferences_for_user(
        &self,
        user: &UserId,
    ) -> Result<Vec<NotificationPreference>, DomainError> {
        Ok(self
            .preferences
            .read()
            .expect("InMemoryNotificationRepository: lock poisoned")
            .iter()
            .filter(|p| &p.user_id == user)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::notification::{NotificationKind, Priority};

    fn user() -> UserId {
        UserId::new("student-1").unwrap()
    }

    async fn delivered(repo: &InMemoryNotificationRepository, priority: Priority) -> Notification {
        let n = repo
            .insert(
                NewNotification::new(user(), NotificationKind::System, "t", "m")
                    .with_priority(priority),
            )
            .await
            .unwrap();
        repo.mark_delivered(n.id(), Timestamp::now()).await.unwrap();
        n
    }

    #[tokio::test]
    async fn insert_assigns_ids_and_starts_pending() {
        let repo = InMemoryNotificationRepository::new();
        let n = repo
            .insert(NewNotification::new(user(), NotificationKind::System, "t", "m"))
            .await
            .unwrap();

        assert_eq!(n.id(), 1);
        assert_eq!(n.status(), NotificationStatus::Pending);
    }

    #[tokio::test]
    async fn pagination_slices_after_ordering() {
        let repo = InMemoryNotificationRepository::new();
        for priority in [Priority::Low, Priority::Urgent, Priority::Normal, Priority::High] {
            delivered(&repo, priority).await;
        }

        let filter = NotificationFilter {
            page: 2,
            limit: 2,
            ..Default::default()
        };
        let page = repo
            .list_for_user(&user(), &filter, Timestamp::now())
            .await
            .unwrap();

        let priorities: Vec<Priority> = page.iter().map(|n| n.priority()).collect();
        assert_eq!(priorities, vec![Priority::Normal, Priority::Low]);
    }

    #[tokio::test]
    async fn unread_only_filter_hides_read_rows() {
        let repo = InMemoryNotificationRepository::new();
        let n = delivered(&repo, Priority::Normal).await;
        delivered(&repo, Priority::Normal).await;

        repo.mark_read(&user(), Some(&[*n.uuid()]), Timestamp::now())
            .await
            .unwrap();

        let filter = NotificationFilter {
            unread_only: true,
            ..Default::default()
        };
        let unread = repo
            .list_for_user(&user(), &filter, Timestamp::now())
            .await
            .unwrap();
        assert_eq!(unread.len(), 1);
    }

    #[tokio::test]
    async fn archive_requires_delivered_or_read() {
        let repo = InMemoryNotificationRepository::new();
        // still pending, not archivable
        let pending = repo
            .insert(NewNotification::new(user(), NotificationKind::System, "t", "m"))
            .await
            .unwrap();
        let read = delivered(&repo, Priority::Normal).await;
        repo.mark_read(&user(), Some(&[*read.uuid()]), Timestamp::now())
            .await
            .unwrap();

        let archived = repo
            .archive(&user(), &[*pending.uuid(), *read.uuid()])
            .await
            .unwrap();
        assert_eq!(archived, 1);
    }

    #[tokio::test]
    async fn expired_rows_never_transition_back() {
        let repo = InMemoryNotificationRepository::new();
        let now = Timestamp::now();
        let n = repo
            .insert(
                NewNotification::new(user(), NotificationKind::System, "t", "m")
                    .with_expires_at(now.minus_days(1)),
            )
            .await
            .unwrap();

        assert_eq!(repo.expire_due(now).await.unwrap(), 1);
        // mark_read must not resurrect the row
        let updated = repo
            .mark_read(&user(), Some(&[*n.uuid()]), now)
            .await
            .unwrap();
        assert_eq!(updated, 0);
        assert_eq!(repo.all()[0].status(), NotificationStatus::Expired);
    }
}
