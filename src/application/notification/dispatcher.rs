//! NotificationDispatcher - creates, queries, and ages out notifications.
//!
//! In-app delivery is local and synchronous: a created notification is
//! flipped to `delivered` immediately. Expiry is lazy - list and count
//! queries exclude rows past `expires_at`, and the periodic cleanup sweep
//! makes the expiry durable before eventually deleting old rows.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, NotificationId, Timestamp, UserId};
use crate::domain::notification::{
    NewNotification, Notification, NotificationFilter, NotificationKind, NotificationPreference,
    Priority,
};
use crate::domain::proposal::Proposal;
use crate::ports::{NotificationRepository, UserDirectory};

/// Proposal lifecycle events that fan out notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProposalEvent {
    Submitted,
    Approved,
    Rejected,
}

/// Recipient set for a broadcast.
#[derive(Debug, Clone)]
pub enum BroadcastAudience {
    /// Every currently-approved user.
    All,
    /// An explicit recipient list.
    Users(Vec<UserId>),
}

/// Result of one cleanup sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CleanupReport {
    /// Rows newly marked expired.
    pub expired: u64,
    /// Expired rows hard-deleted past the retention window.
    pub deleted: u64,
}

/// Service for per-user notification lifecycle and fan-out.
pub struct NotificationDispatcher {
    repo: Arc<dyn NotificationRepository>,
    directory: Arc<dyn UserDirectory>,
    /// Days an expired row is retained before the cleanup sweep deletes it.
    retention_days: i64,
}

impl NotificationDispatcher {
    pub fn new(
        repo: Arc<dyn NotificationRepository>,
        directory: Arc<dyn UserDirectory>,
        retention_days: i64,
    ) -> Self {
        Self {
            repo,
            directory,
            retention_days,
        }
    }

    /// Create a notification and deliver it in-app.
    ///
    /// The row is inserted as `pending` and immediately flipped to
    /// `delivered`; there is no external transport in this core.
    pub async fn create(&self, input: NewNotification) -> Result<Notification, DomainError> {
        let now = Timestamp::now();
        let mut notification = self.repo.insert(input).await?;
        self.repo.mark_delivered(notification.id(), now).await?;
        notification.deliver(now)?;
        Ok(notification)
    }

    /// A user's notifications, filtered, ordered by priority then recency.
    pub async fn list(
        &self,
        user: &UserId,
        filter: &NotificationFilter,
    ) -> Result<Vec<Notification>, DomainError> {
        self.repo.list_for_user(user, filter, Timestamp::now()).await
    }

    /// Count of a user's not-yet-read notifications.
    pub async fn unread_count(&self, user: &UserId) -> Result<u64, DomainError> {
        self.repo.unread_count(user, Timestamp::now()).await
    }

    /// Mark notifications read. With ids, only those belonging to the user;
    /// without, every unread notification for the user.
    pub async fn mark_as_read(
        &self,
        user: &UserId,
        ids: Option<&[NotificationId]>,
    ) -> Result<u64, DomainError> {
        self.repo.mark_read(user, ids, Timestamp::now()).await
    }

    /// Archive read notifications belonging to the user.
    pub async fn archive(&self, user: &UserId, ids: &[NotificationId]) -> Result<u64, DomainError> {
        self.repo.archive(user, ids).await
    }

    /// Run the two-phase cleanup sweep at the current instant.
    ///
    /// Safe to invoke concurrently with itself and with reads/creates:
    /// both phases are predicate-guarded, so overlapping sweeps simply find
    /// nothing left to do.
    pub async fn cleanup(&self) -> Result<CleanupReport, DomainError> {
        self.cleanup_at(Timestamp::now()).await
    }

    /// Run the cleanup sweep relative to the given reference instant.
    pub async fn cleanup_at(&self, now: Timestamp) -> Result<CleanupReport, DomainError> {
        let expired = self.repo.expire_due(now).await?;
        let cutoff = now.minus_days(self.retention_days);
        let deleted = self.repo.delete_expired_before(cutoff).await?;

        tracing::info!(expired, deleted, "notification cleanup sweep finished");
        Ok(CleanupReport { expired, deleted })
    }

    /// Fan out the notification for one proposal lifecycle event.
    ///
    /// `submitted` notifies the admin inbox; `approved` and `rejected`
    /// notify the submitter, rejection at high priority with a pointer to
    /// the reviewer feedback.
    pub async fn on_proposal_event(
        &self,
        event: ProposalEvent,
        proposal: &Proposal,
        admin: &UserId,
        submitter: &UserId,
    ) -> Result<Notification, DomainError> {
        let input = match event {
            ProposalEvent::Submitted => NewNotification::new(
                admin.clone(),
                NotificationKind::Proposal,
                "New Proposal Submitted",
                format!(
                    "\"{}\" was submitted and is waiting for review.",
                    proposal.title()
                ),
            )
            .with_sender(submitter.clone())
            .with_priority(Priority::Normal),
            ProposalEvent::Approved => NewNotification::new(
                submitter.clone(),
                NotificationKind::Proposal,
                "Proposal Approved",
                format!("Your proposal \"{}\" has been approved.", proposal.title()),
            )
            .with_sender(admin.clone())
            .with_priority(Priority::Normal),
            ProposalEvent::Rejected => NewNotification::new(
                submitter.clone(),
                NotificationKind::Proposal,
                "Proposal Not Approved",
                format!(
                    "Your proposal \"{}\" was not approved. See the reviewer feedback for what needs to change.",
                    proposal.title()
                ),
            )
            .with_sender(admin.clone())
            .with_priority(Priority::High),
        };

        let input = input.with_related_proposal(proposal.id(), *proposal.uuid());
        self.create(input).await
    }

    /// Create one notification per recipient.
    ///
    /// Not all-or-nothing: a failure for one recipient is logged and
    /// skipped, and the batch continues. Returns the number of
    /// notifications actually created so callers can reconcile.
    pub async fn broadcast(
        &self,
        audience: BroadcastAudience,
        title: &str,
        message: &str,
        priority: Priority,
        expires_at: Option<Timestamp>,
    ) -> Result<u64, DomainError> {
        let recipients = match audience {
            BroadcastAudience::All => self.directory.approved_user_ids().await?,
            BroadcastAudience::Users(users) => users,
        };

        let mut created = 0u64;
        for recipient in recipients {
            let mut input = NewNotification::new(
                recipient.clone(),
                NotificationKind::Broadcast,
                title,
                message,
            )
            .with_priority(priority);
            if let Some(expires_at) = expires_at {
                input = input.with_expires_at(expires_at);
            }

            match self.create(input).await {
                Ok(_) => created += 1,
                Err(err) => {
                    tracing::warn!(
                        recipient = %recipient,
                        error = %err,
                        "broadcast recipient skipped"
                    );
                }
            }
        }

        Ok(created)
    }

    /// Insert or replace the preference row for `(user, kind)`.
    pub async fn upsert_preference(
        &self,
        pref: &NotificationPreference,
    ) -> Result<(), DomainError> {
        self.repo.upsert_preference(pref).await
    }

    /// All preference rows for a user.
    pub async fn preferences(
        &self,
        user: &UserId,
    ) -> Result<Vec<NotificationPreference>, DomainError> {
        self.repo.preferences_for_user(user).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemoryNotificationRepository, InMemoryUserDirectory};
    use crate::domain::foundation::ProposalId;
    use crate::domain::notification::NotificationStatus;

    fn recipient() -> UserId {
        UserId::new("student-1").unwrap()
    }

    fn admin() -> UserId {
        UserId::new("admin-1").unwrap()
    }

    fn dispatcher_with(
        repo: Arc<InMemoryNotificationRepository>,
        directory: Arc<InMemoryUserDirectory>,
    ) -> NotificationDispatcher {
        NotificationDispatcher::new(repo, directory, 30)
    }

    fn proposal() -> Proposal {
        Proposal::new(
            1,
            ProposalId::new(),
            "Science Fair".to_string(),
            recipient(),
            serde_json::Value::Null,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn create_delivers_immediately() {
        let repo = Arc::new(InMemoryNotificationRepository::new());
        let directory = Arc::new(InMemoryUserDirectory::new());
        let dispatcher = dispatcher_with(repo.clone(), directory);

        let n = dispatcher
            .create(NewNotification::new(
                recipient(),
                NotificationKind::System,
                "Maintenance",
                "Scheduled downtime tonight",
            ))
            .await
            .unwrap();

        assert_eq!(n.status(), NotificationStatus::Delivered);
        assert!(n.delivered_at().is_some());

        let stored = repo.all();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].status(), NotificationStatus::Delivered);
    }

    #[tokio::test]
    async fn list_orders_by_priority_then_recency() {
        let repo = Arc::new(InMemoryNotificationRepository::new());
        let directory = Arc::new(InMemoryUserDirectory::new());
        let dispatcher = dispatcher_with(repo, directory);

        for priority in [Priority::Low, Priority::High, Priority::Normal, Priority::Urgent] {
            dispatcher
                .create(
                    NewNotification::new(
                        recipient(),
                        NotificationKind::System,
                        format!("{:?}", priority),
                        "ordering test",
                    )
                    .with_priority(priority),
                )
                .await
                .unwrap();
        }

        let listed = dispatcher
            .list(&recipient(), &NotificationFilter::default())
            .await
            .unwrap();

        let priorities: Vec<Priority> = listed.iter().map(|n| n.priority()).collect();
        assert_eq!(
            priorities,
            vec![Priority::Urgent, Priority::High, Priority::Normal, Priority::Low]
        );
    }

    #[tokio::test]
    async fn list_breaks_priority_ties_newest_first() {
        let repo = Arc::new(InMemoryNotificationRepository::new());
        let directory = Arc::new(InMemoryUserDirectory::new());
        let dispatcher = dispatcher_with(repo, directory);

        for title in ["first", "second", "third"] {
            dispatcher
                .create(NewNotification::new(
                    recipient(),
                    NotificationKind::System,
                    title,
                    "tie break test",
                ))
                .await
                .unwrap();
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }

        let listed = dispatcher
            .list(&recipient(), &NotificationFilter::default())
            .await
            .unwrap();
        let titles: Vec<&str> = listed.iter().map(|n| n.title()).collect();
        assert_eq!(titles, vec!["third", "second", "first"]);
    }

    #[tokio::test]
    async fn expired_rows_are_excluded_from_list_and_count() {
        let repo = Arc::new(InMemoryNotificationRepository::new());
        let directory = Arc::new(InMemoryUserDirectory::new());
        let dispatcher = dispatcher_with(repo, directory);

        dispatcher
            .create(
                NewNotification::new(
                    recipient(),
                    NotificationKind::System,
                    "Stale",
                    "already past expiry",
                )
                .with_expires_at(Timestamp::now().minus_days(1)),
            )
            .await
            .unwrap();
        dispatcher
            .create(NewNotification::new(
                recipient(),
                NotificationKind::System,
                "Fresh",
                "still valid",
            ))
            .await
            .unwrap();

        let listed = dispatcher
            .list(&recipient(), &NotificationFilter::default())
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].title(), "Fresh");

        assert_eq!(dispatcher.unread_count(&recipient()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn mark_as_read_with_ids_only_touches_owned_rows() {
        let repo = Arc::new(InMemoryNotificationRepository::new());
        let directory = Arc::new(InMemoryUserDirectory::new());
        let dispatcher = dispatcher_with(repo, directory);

        let mine = dispatcher
            .create(NewNotification::new(
                recipient(),
                NotificationKind::System,
                "Mine",
                "for me",
            ))
            .await
            .unwrap();
        let theirs = dispatcher
            .create(NewNotification::new(
                UserId::new("someone-else").unwrap(),
                NotificationKind::System,
                "Theirs",
                "not for me",
            ))
            .await
            .unwrap();

        let updated = dispatcher
            .mark_as_read(&recipient(), Some(&[*mine.uuid(), *theirs.uuid()]))
            .await
            .unwrap();

        assert_eq!(updated, 1);
    }

    #[tokio::test]
    async fn mark_as_read_without_ids_reads_everything() {
        let repo = Arc::new(InMemoryNotificationRepository::new());
        let directory = Arc::new(InMemoryUserDirectory::new());
        let dispatcher = dispatcher_with(repo, directory);

        for i in 0..3 {
            dispatcher
                .create(NewNotification::new(
                    recipient(),
                    NotificationKind::System,
                    format!("n{}", i),
                    "bulk read test",
                ))
                .await
                .unwrap();
        }

        let updated = dispatcher.mark_as_read(&recipient(), None).await.unwrap();
        assert_eq!(updated, 3);
        assert_eq!(dispatcher.unread_count(&recipient()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn cleanup_expires_then_later_deletes() {
        let repo = Arc::new(InMemoryNotificationRepository::new());
        let directory = Arc::new(InMemoryUserDirectory::new());
        let dispatcher = dispatcher_with(repo.clone(), directory);

        let now = Timestamp::now();
        dispatcher
            .create(
                NewNotification::new(
                    recipient(),
                    NotificationKind::System,
                    "Ephemeral",
                    "expires fast",
                )
                .with_expires_at(now.minus_days(1)),
            )
            .await
            .unwrap();

        let first = dispatcher.cleanup_at(now).await.unwrap();
        assert_eq!(first.expired, 1);
        assert_eq!(first.deleted, 0);
        assert_eq!(
            repo.all()[0].status(),
            NotificationStatus::Expired
        );

        // a second sweep right away finds nothing new
        let again = dispatcher.cleanup_at(now).await.unwrap();
        assert_eq!(again.expired, 0);
        assert_eq!(again.deleted, 0);

        // 31 days later the retention window has passed
        let later = dispatcher.cleanup_at(now.add_days(31)).await.unwrap();
        assert_eq!(later.deleted, 1);
        assert!(repo.all().is_empty());
    }

    #[tokio::test]
    async fn submitted_event_notifies_admin() {
        let repo = Arc::new(InMemoryNotificationRepository::new());
        let directory = Arc::new(InMemoryUserDirectory::new());
        let dispatcher = dispatcher_with(repo, directory);

        let p = proposal();
        let n = dispatcher
            .on_proposal_event(ProposalEvent::Submitted, &p, &admin(), &recipient())
            .await
            .unwrap();

        assert_eq!(n.recipient_id(), &admin());
        assert_eq!(n.title(), "New Proposal Submitted");
        assert_eq!(n.priority(), Priority::Normal);
        assert_eq!(n.related_proposal_uuid(), Some(p.uuid()));
    }

    #[tokio::test]
    async fn rejected_event_notifies_submitter_at_high_priority() {
        let repo = Arc::new(InMemoryNotificationRepository::new());
        let directory = Arc::new(InMemoryUserDirectory::new());
        let dispatcher = dispatcher_with(repo, directory);

        let p = proposal();
        let n = dispatcher
            .on_proposal_event(ProposalEvent::Rejected, &p, &admin(), &recipient())
            .await
            .unwrap();

        assert_eq!(n.recipient_id(), &recipient());
        assert_eq!(n.priority(), Priority::High);
        assert!(n.message().contains("not approved"));
        assert!(n.message().contains("feedback"));
    }

    #[tokio::test]
    async fn broadcast_to_all_resolves_approved_users() {
        let repo = Arc::new(InMemoryNotificationRepository::new());
        let directory = Arc::new(InMemoryUserDirectory::new());
        directory.add_approved(UserId::new("u1").unwrap());
        directory.add_approved(UserId::new("u2").unwrap());
        directory.add_approved(UserId::new("u3").unwrap());
        let dispatcher = dispatcher_with(repo.clone(), directory);

        let created = dispatcher
            .broadcast(
                BroadcastAudience::All,
                "Semester deadline",
                "Proposals close Friday",
                Priority::Urgent,
                None,
            )
            .await
            .unwrap();

        assert_eq!(created, 3);
        assert_eq!(repo.all().len(), 3);
    }

    #[tokio::test]
    async fn broadcast_skips_failed_recipients_and_continues() {
        let repo = Arc::new(InMemoryNotificationRepository::new());
        repo.fail_for(UserId::new("u2").unwrap());
        let directory = Arc::new(InMemoryUserDirectory::new());
        let dispatcher = dispatcher_with(repo.clone(), directory);

        let users = vec![
            UserId::new("u1").unwrap(),
            UserId::new("u2").unwrap(),
            UserId::new("u3").unwrap(),
        ];
        let created = dispatcher
            .broadcast(
                BroadcastAudience::Users(users),
                "Heads up",
                "partial failure test",
                Priority::Normal,
                None,
            )
            .await
            .unwrap();

        assert_eq!(created, 2);
        assert_eq!(repo.all().len(), 2);
    }

    #[tokio::test]
    async fn preference_upsert_replaces_existing_row() {
        let repo = Arc::new(InMemoryNotificationRepository::new());
        let directory = Arc::new(InMemoryUserDirectory::new());
        let dispatcher = dispatcher_with(repo, directory);

        let pref = NotificationPreference::new(recipient(), NotificationKind::Proposal);
        dispatcher.upsert_preference(&pref).await.unwrap();

        let updated = pref.clone().with_channels(crate::domain::notification::ChannelSettings {
            in_app: true,
            email: true,
            sms: false,
            push: false,
        });
        dispatcher.upsert_preference(&updated).await.unwrap();

        let prefs = dispatcher.preferences(&recipient()).await.unwrap();
        assert_eq!(prefs.len(), 1);
        assert!(prefs[0].channels.email);
    }
}
