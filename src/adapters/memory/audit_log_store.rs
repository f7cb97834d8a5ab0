//! In-memory audit log store for testing.
//!
//! # Security Note
//!
//! This adapter is for **testing only** and should not be used in
//! production. It uses `.expect()` on lock operations which will panic if
//! locks are poisoned. Production code should use the postgres adapter.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use crate::domain::audit::{ActionStats, AuditEntry, NewAuditEntry};
use crate::domain::foundation::{DomainError, ErrorCode, Timestamp};
use crate::ports::AuditLogStore;

/// In-memory append-only audit trail with failure injection for exercising
/// the recorder's never-fail contract.
pub struct InMemoryAuditLogStore {
    entries: RwLock<Vec<AuditEntry>>,
    fail_appends: AtomicBool,
}

impl InMemoryAuditLogStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            fail_appends: AtomicBool::new(false),
        }
    }

    /// Makes every subsequent append fail (for test assertions).
    pub fn fail_appends(&self) {
        self.fail_appends.store(true, Ordering::SeqCst);
    }

    /// Returns all entries in insertion order (for test assertions).
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries
            .read()
            .expect("InMemoryAuditLogStore: lock poisoned")
            .clone()
    }
}

impl Default for InMemoryAuditLogStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuditLogStore for InMemoryAuditLogStore {
    async fn append(&self, entry: NewAuditEntry) -> Result<AuditEntry, DomainError> {
        if self.fail_appends.load(Ordering::SeqCst) {
            return Err(DomainError::new(
                ErrorCode::DatabaseError,
                "Simulated audit storage failure",
            ));
        }

        let mut entries = self
            .entries
            .write()
            .expect("InMemoryAuditLogStore: lock poisoned");
        let stored = AuditEntry {
            id: entries.len() as i64 + 1,
            proposal_id: entry.proposal_id,
            action: entry.action,
            actor_id: entry.actor_id,
            old_value: entry.old_value,
            new_value: entry.new_value,
            note: entry.note,
            metadata: entry.metadata,
            created_at: Timestamp::now(),
        };
        entries.push(stored.clone());
        Ok(stored)
    }

    async fn list_for_proposal(
        &self,
        proposal_id: i64,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<AuditEntry>, DomainError> {
        let mut matching: Vec<AuditEntry> = self
            .entries
            .read()
            .expect("InMemoryAuditLogStore: lock poisoned")
            .iter()
            .filter(|e| e.proposal_id == proposal_id)
            .cloned()
            .collect();

        // newest first; id breaks same-instant ties
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        Ok(matching
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn stats_for_proposal(&self, proposal_id: i64) -> Result<Vec<ActionStats>, DomainError> {
        let entries = self
            .entries
            .read()
            .expect("InMemoryAuditLogStore: lock poisoned");

        let mut grouped: BTreeMap<&'static str, ActionStats> = BTreeMap::new();
        for entry in entries.iter().filter(|e| e.proposal_id == proposal_id) {
            grouped
                .entry(entry.action.as_str())
                .and_modify(|stats| {
                    stats.count += 1;
                    stats.first_at = stats.first_at.min(entry.created_at);
                    stats.last_at = stats.last_at.max(entry.created_at);
                })
                .or_insert(ActionStats {
                    action: entry.action,
                    count: 1,
                    first_at: entry.created_at,
                    last_at: entry.created_at,
                });
        }

        Ok(grouped.into_values().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::audit::ActionType;
    use crate::domain::foundation::UserId;

    fn entry_for(proposal_id: i64, action: ActionType) -> NewAuditEntry {
        NewAuditEntry {
            proposal_id,
            action,
            actor_id: UserId::new("admin-1").unwrap(),
            old_value: None,
            new_value: None,
            note: None,
            metadata: None,
        }
    }

    #[tokio::test]
    async fn list_returns_newest_first() {
        let store = InMemoryAuditLogStore::new();
        store.append(entry_for(1, ActionType::Create)).await.unwrap();
        store.append(entry_for(1, ActionType::Update)).await.unwrap();
        store.append(entry_for(1, ActionType::Approve)).await.unwrap();

        let listed = store.list_for_proposal(1, 10, 0).await.unwrap();
        let actions: Vec<ActionType> = listed.iter().map(|e| e.action).collect();
        assert_eq!(
            actions,
            vec![ActionType::Approve, ActionType::Update, ActionType::Create]
        );
    }

    #[tokio::test]
    async fn list_honors_limit_and_offset() {
        let store = InMemoryAuditLogStore::new();
        for _ in 0..5 {
            store.append(entry_for(1, ActionType::Update)).await.unwrap();
        }

        let page = store.list_for_proposal(1, 2, 2).await.unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].id, 3);
    }

    #[tokio::test]
    async fn stats_group_by_action_with_counts() {
        let store = InMemoryAuditLogStore::new();
        store.append(entry_for(1, ActionType::Update)).await.unwrap();
        store.append(entry_for(1, ActionType::Update)).await.unwrap();
        store.append(entry_for(1, ActionType::Approve)).await.unwrap();
        store.append(entry_for(2, ActionType::Reject)).await.unwrap();

        let stats = store.stats_for_proposal(1).await.unwrap();
        assert_eq!(stats.len(), 2);

        let update = stats.iter().find(|s| s.action == ActionType::Update).unwrap();
        assert_eq!(update.count, 2);
        assert!(update.first_at <= update.last_at);
    }

    #[tokio::test]
    async fn fail_appends_rejects_writes() {
        let store = InMemoryAuditLogStore::new();
        store.fail_appends();
        assert!(store.append(entry_for(1, ActionType::Update)).await.is_err());
        assert!(store.entries().is_empty());
    }
}
