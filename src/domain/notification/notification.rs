//! Notification entity and its lifecycle.
//!
//! A notification progresses `pending -> delivered -> read -> archived`.
//! Orthogonally, any non-terminal state moves to `expired` once past
//! `expires_at`; expiry is checked lazily on read and cleanup, never by a
//! timer. `expired` is terminal.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    DomainError, ErrorCode, NotificationId, ProposalId, StateMachine, Timestamp, UserId,
};

/// Maximum page size accepted by list queries.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Notification urgency tier. Controls list ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Normal,
    High,
    Urgent,
}

impl Priority {
    /// Ordering rank: urgent > high > normal > low.
    pub fn rank(&self) -> i16 {
        match self {
            Priority::Low => 0,
            Priority::Normal => 1,
            Priority::High => 2,
            Priority::Urgent => 3,
        }
    }

    /// Canonical storage representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Normal => "normal",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }

    /// Parses the storage representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "low" => Some(Priority::Low),
            "normal" => Some(Priority::Normal),
            "high" => Some(Priority::High),
            "urgent" => Some(Priority::Urgent),
            _ => None,
        }
    }

    /// Lenient parse for caller-supplied values: missing or malformed
    /// priorities become `Normal` rather than failing the create. Malformed
    /// values are logged.
    pub fn parse_or_default(s: Option<&str>) -> Self {
        match s {
            None => Priority::Normal,
            Some(raw) => Priority::parse(raw).unwrap_or_else(|| {
                tracing::warn!(priority = raw, "unknown notification priority, using normal");
                Priority::Normal
            }),
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Normal
    }
}

/// Category of a notification, used for preference lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Proposal,
    System,
    Broadcast,
    Reminder,
}

impl NotificationKind {
    /// Canonical storage representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Proposal => "proposal",
            NotificationKind::System => "system",
            NotificationKind::Broadcast => "broadcast",
            NotificationKind::Reminder => "reminder",
        }
    }

    /// Parses the storage representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "proposal" => Some(NotificationKind::Proposal),
            "system" => Some(NotificationKind::System),
            "broadcast" => Some(NotificationKind::Broadcast),
            "reminder" => Some(NotificationKind::Reminder),
            _ => None,
        }
    }

    /// Lenient parse: unknown kinds become `System` with a logged warning.
    pub fn parse_or_default(s: Option<&str>) -> Self {
        match s {
            None => NotificationKind::System,
            Some(raw) => NotificationKind::parse(raw).unwrap_or_else(|| {
                tracing::warn!(kind = raw, "unknown notification kind, using system");
                NotificationKind::System
            }),
        }
    }
}

/// Delivery lifecycle state of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationStatus {
    Pending,
    Delivered,
    Read,
    Archived,
    Expired,
}

impl NotificationStatus {
    /// Canonical storage representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationStatus::Pending => "pending",
            NotificationStatus::Delivered => "delivered",
            NotificationStatus::Read => "read",
            NotificationStatus::Archived => "archived",
            NotificationStatus::Expired => "expired",
        }
    }

    /// Parses the storage representation.
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        match s {
            "pending" => Ok(NotificationStatus::Pending),
            "delivered" => Ok(NotificationStatus::Delivered),
            "read" => Ok(NotificationStatus::Read),
            "archived" => Ok(NotificationStatus::Archived),
            "expired" => Ok(NotificationStatus::Expired),
            _ => Err(DomainError::new(
                ErrorCode::InvalidFormat,
                format!("Invalid notification status: {}", s),
            )),
        }
    }
}

impl StateMachine for NotificationStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use NotificationStatus::*;
        matches!(
            (self, target),
            (Pending, Delivered)
                | (Delivered, Read)
                | (Delivered, Archived)
                | (Read, Archived)
            // lazy expiry from any non-terminal state
                | (Pending, Expired)
                | (Delivered, Expired)
                | (Read, Expired)
                | (Archived, Expired)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use NotificationStatus::*;
        match self {
            Pending => vec![Delivered, Expired],
            Delivered => vec![Read, Archived, Expired],
            Read => vec![Archived, Expired],
            Archived => vec![Expired],
            Expired => vec![],
        }
    }
}

/// Per-user notification tied to a proposal event or a direct system call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    id: i64,
    uuid: NotificationId,
    recipient_id: UserId,
    sender_id: Option<UserId>,
    kind: NotificationKind,
    title: String,
    message: String,
    priority: Priority,
    status: NotificationStatus,
    related_proposal_id: Option<i64>,
    related_proposal_uuid: Option<ProposalId>,
    metadata: serde_json::Value,
    tags: Vec<String>,
    expires_at: Option<Timestamp>,
    delivered_at: Option<Timestamp>,
    read_at: Option<Timestamp>,
    created_at: Timestamp,
}

impl Notification {
    /// Creates a pending notification from an accepted input.
    pub fn new(id: i64, input: NewNotification) -> Self {
        Self {
            id,
            uuid: NotificationId::new(),
            recipient_id: input.recipient_id,
            sender_id: input.sender_id,
            kind: input.kind,
            title: input.title,
            message: input.message,
            priority: input.priority,
            status: NotificationStatus::Pending,
            related_proposal_id: input.related_proposal_id,
            related_proposal_uuid: input.related_proposal_uuid,
            metadata: input.metadata,
            tags: input.tags,
            expires_at: input.expires_at,
            delivered_at: None,
            read_at: None,
            created_at: Timestamp::now(),
        }
    }

    /// Reconstitute from persistence (no validation).
    #[allow(clippy::too_many_arguments)]
    pub fn reconstitute(
        id: i64,
        uuid: NotificationId,
        recipient_id: UserId,
        sender_id: Option<UserId>,
        kind: NotificationKind,
        title: String,
        message: String,
        priority: Priority,
        status: NotificationStatus,
        related_proposal_id: Option<i64>,
        related_proposal_uuid: Option<ProposalId>,
        metadata: serde_json::Value,
        tags: Vec<String>,
        expires_at: Option<Timestamp>,
        delivered_at: Option<Timestamp>,
        read_at: Option<Timestamp>,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id,
            uuid,
            recipient_id,
            sender_id,
            kind,
            title,
            message,
            priority,
            status,
            related_proposal_id,
            related_proposal_uuid,
            metadata,
            tags,
            expires_at,
            delivered_at,
            read_at,
            created_at,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn uuid(&self) -> &NotificationId {
        &self.uuid
    }

    pub fn recipient_id(&self) -> &UserId {
        &self.recipient_id
    }

    pub fn sender_id(&self) -> Option<&UserId> {
        self.sender_id.as_ref()
    }

    pub fn kind(&self) -> NotificationKind {
        self.kind
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn status(&self) -> NotificationStatus {
        self.status
    }

    pub fn related_proposal_id(&self) -> Option<i64> {
        self.related_proposal_id
    }

    pub fn related_proposal_uuid(&self) -> Option<&ProposalId> {
        self.related_proposal_uuid.as_ref()
    }

    pub fn metadata(&self) -> &serde_json::Value {
        &self.metadata
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn expires_at(&self) -> Option<&Timestamp> {
        self.expires_at.as_ref()
    }

    pub fn delivered_at(&self) -> Option<&Timestamp> {
        self.delivered_at.as_ref()
    }

    pub fn read_at(&self) -> Option<&Timestamp> {
        self.read_at.as_ref()
    }

    pub fn created_at(&self) -> &Timestamp {
        &self.created_at
    }

    /// Returns true once `expires_at` has passed at the given instant.
    pub fn is_expired_by(&self, now: &Timestamp) -> bool {
        self.status == NotificationStatus::Expired
            || self.expires_at.map(|at| &at <= now).unwrap_or(false)
    }

    /// Returns true if the recipient has not read this notification.
    pub fn is_unread(&self) -> bool {
        self.status != NotificationStatus::Read
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Mutations
    // ─────────────────────────────────────────────────────────────────────────

    /// Mark as delivered (in-app delivery is local and synchronous).
    pub fn deliver(&mut self, at: Timestamp) -> Result<(), DomainError> {
        self.status = self.transition(NotificationStatus::Delivered)?;
        self.delivered_at = Some(at);
        Ok(())
    }

    /// Mark as read by the recipient.
    pub fn mark_read(&mut self, at: Timestamp) -> Result<(), DomainError> {
        self.status = self.transition(NotificationStatus::Read)?;
        self.read_at = Some(at);
        Ok(())
    }

    /// Archive the notification.
    pub fn archive(&mut self) -> Result<(), DomainError> {
        self.status = self.transition(NotificationStatus::Archived)?;
        Ok(())
    }

    /// Move to `expired`. Terminal; never transitions back.
    pub fn expire(&mut self) -> Result<(), DomainError> {
        self.status = self.transition(NotificationStatus::Expired)?;
        Ok(())
    }

    fn transition(&self, target: NotificationStatus) -> Result<NotificationStatus, DomainError> {
        self.status.transition_to(target).map_err(|_| {
            DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!(
                    "Cannot move notification from {} to {}",
                    self.status.as_str(),
                    target.as_str()
                ),
            )
        })
    }
}

/// Input for creating a notification.
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub recipient_id: UserId,
    pub sender_id: Option<UserId>,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub priority: Priority,
    pub related_proposal_id: Option<i64>,
    pub related_proposal_uuid: Option<ProposalId>,
    pub metadata: serde_json::Value,
    pub tags: Vec<String>,
    pub expires_at: Option<Timestamp>,
}

impl NewNotification {
    /// Minimal input: everything else defaults.
    pub fn new(
        recipient_id: UserId,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            recipient_id,
            sender_id: None,
            kind,
            title: title.into(),
            message: message.into(),
            priority: Priority::Normal,
            related_proposal_id: None,
            related_proposal_uuid: None,
            metadata: serde_json::Value::Null,
            tags: Vec::new(),
            expires_at: None,
        }
    }

    pub fn with_sender(mut self, sender: UserId) -> Self {
        self.sender_id = Some(sender);
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_related_proposal(mut self, id: i64, uuid: ProposalId) -> Self {
        self.related_proposal_id = Some(id);
        self.related_proposal_uuid = Some(uuid);
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_expires_at(mut self, expires_at: Timestamp) -> Self {
        self.expires_at = Some(expires_at);
        self
    }
}

/// Query filter for listing a user's notifications.
#[derive(Debug, Clone)]
pub struct NotificationFilter {
    /// 1-based page number.
    pub page: u32,
    /// Page size; clamped to [`MAX_PAGE_SIZE`].
    pub limit: u32,
    pub unread_only: bool,
    pub priority: Option<Priority>,
    pub status: Option<NotificationStatus>,
    pub kind: Option<NotificationKind>,
}

impl Default for NotificationFilter {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 20,
            unread_only: false,
            priority: None,
            status: None,
            kind: None,
        }
    }
}

impl NotificationFilter {
    /// Effective page size after clamping.
    pub fn effective_limit(&self) -> u32 {
        self.limit.clamp(1, MAX_PAGE_SIZE)
    }

    /// Row offset for the requested page.
    pub fn offset(&self) -> u32 {
        self.page.saturating_sub(1) * self.effective_limit()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recipient() -> UserId {
        UserId::new("student-1").unwrap()
    }

    fn pending_notification() -> Notification {
        Notification::new(
            1,
            NewNotification::new(
                recipient(),
                NotificationKind::Proposal,
                "New Proposal Submitted",
                "A proposal is waiting for review",
            ),
        )
    }

    // Priority tests

    #[test]
    fn priority_ranks_order_urgent_first() {
        assert!(Priority::Urgent.rank() > Priority::High.rank());
        assert!(Priority::High.rank() > Priority::Normal.rank());
        assert!(Priority::Normal.rank() > Priority::Low.rank());
    }

    #[test]
    fn priority_parse_or_default_handles_missing() {
        assert_eq!(Priority::parse_or_default(None), Priority::Normal);
    }

    #[test]
    fn priority_parse_or_default_handles_malformed() {
        assert_eq!(Priority::parse_or_default(Some("shouty")), Priority::Normal);
    }

    #[test]
    fn priority_parse_or_default_accepts_valid() {
        assert_eq!(Priority::parse_or_default(Some("urgent")), Priority::Urgent);
    }

    #[test]
    fn kind_parse_or_default_falls_back_to_system() {
        assert_eq!(
            NotificationKind::parse_or_default(Some("smoke_signal")),
            NotificationKind::System
        );
    }

    // Status state machine tests

    #[test]
    fn lifecycle_progresses_to_archived() {
        let mut n = pending_notification();
        n.deliver(Timestamp::now()).unwrap();
        assert_eq!(n.status(), NotificationStatus::Delivered);
        assert!(n.delivered_at().is_some());

        n.mark_read(Timestamp::now()).unwrap();
        assert_eq!(n.status(), NotificationStatus::Read);
        assert!(n.read_at().is_some());

        n.archive().unwrap();
        assert_eq!(n.status(), NotificationStatus::Archived);
    }

    #[test]
    fn pending_cannot_be_read_before_delivery() {
        let mut n = pending_notification();
        assert!(n.mark_read(Timestamp::now()).is_err());
    }

    #[test]
    fn every_non_terminal_state_can_expire() {
        for status in [
            NotificationStatus::Pending,
            NotificationStatus::Delivered,
            NotificationStatus::Read,
            NotificationStatus::Archived,
        ] {
            assert!(status.can_transition_to(&NotificationStatus::Expired));
        }
    }

    #[test]
    fn expired_is_terminal() {
        assert!(NotificationStatus::Expired.is_terminal());
    }

    #[test]
    fn expire_twice_fails() {
        let mut n = pending_notification();
        n.expire().unwrap();
        assert!(n.expire().is_err());
        assert!(n.mark_read(Timestamp::now()).is_err());
    }

    // Expiry predicate tests

    #[test]
    fn is_expired_by_uses_expires_at() {
        let now = Timestamp::now();
        let mut input = NewNotification::new(
            recipient(),
            NotificationKind::System,
            "Maintenance",
            "Scheduled downtime",
        );
        input.expires_at = Some(now.minus_days(1));
        let n = Notification::new(1, input);

        assert!(n.is_expired_by(&now));
    }

    #[test]
    fn notification_without_expiry_never_expires_lazily() {
        let n = pending_notification();
        assert!(!n.is_expired_by(&Timestamp::now().add_days(3650)));
    }

    // Filter tests

    #[test]
    fn filter_defaults_to_first_page_of_twenty() {
        let filter = NotificationFilter::default();
        assert_eq!(filter.page, 1);
        assert_eq!(filter.effective_limit(), 20);
        assert_eq!(filter.offset(), 0);
    }

    #[test]
    fn filter_offset_uses_page_minus_one() {
        let filter = NotificationFilter {
            page: 3,
            limit: 10,
            ..Default::default()
        };
        assert_eq!(filter.offset(), 20);
    }

    #[test]
    fn filter_clamps_oversized_limit() {
        let filter = NotificationFilter {
            limit: 5000,
            ..Default::default()
        };
        assert_eq!(filter.effective_limit(), MAX_PAGE_SIZE);
    }
}
