//! Audit trail records.
//!
//! Entries are append-only: created once per triggering event, never
//! mutated or deleted by this core. Retention is an external concern.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::domain::foundation::{ProposalId, Timestamp, UserId};

/// Version tag stamped on every export bundle so downstream tooling can
/// detect format changes.
pub const EXPORT_FORMAT_VERSION: &str = "1.0";

/// Closed set of auditable action kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionType {
    Create,
    Update,
    Delete,
    Approve,
    Reject,
    Login,
    Logout,
    View,
    Export,
}

impl ActionType {
    /// Canonical storage representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::Create => "CREATE",
            ActionType::Update => "UPDATE",
            ActionType::Delete => "DELETE",
            ActionType::Approve => "APPROVE",
            ActionType::Reject => "REJECT",
            ActionType::Login => "LOGIN",
            ActionType::Logout => "LOGOUT",
            ActionType::View => "VIEW",
            ActionType::Export => "EXPORT",
        }
    }

    /// Parses the storage representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "CREATE" => Some(ActionType::Create),
            "UPDATE" => Some(ActionType::Update),
            "DELETE" => Some(ActionType::Delete),
            "APPROVE" => Some(ActionType::Approve),
            "REJECT" => Some(ActionType::Reject),
            "LOGIN" => Some(ActionType::Login),
            "LOGOUT" => Some(ActionType::Logout),
            "VIEW" => Some(ActionType::View),
            "EXPORT" => Some(ActionType::Export),
            _ => None,
        }
    }

    /// Maps a loosely-named action string from callers ("proposal_submitted",
    /// "report_approved", ...) onto the closed enum.
    ///
    /// Unmapped names fall back to `Update` so callers never lose an audit
    /// row, but every fallback is logged with the offending name.
    pub fn from_event_name(name: &str) -> Self {
        match EVENT_NAME_TABLE.get(name) {
            Some(action) => *action,
            None => {
                tracing::warn!(action = name, "unmapped audit action name, recording as UPDATE");
                ActionType::Update
            }
        }
    }
}

static EVENT_NAME_TABLE: Lazy<HashMap<&'static str, ActionType>> = Lazy::new(|| {
    HashMap::from([
        ("proposal_created", ActionType::Create),
        ("proposal_updated", ActionType::Update),
        ("proposal_submitted", ActionType::Update),
        ("proposal_resubmitted", ActionType::Update),
        ("proposal_approved", ActionType::Approve),
        ("proposal_rejected", ActionType::Reject),
        ("proposal_denied", ActionType::Reject),
        ("revision_requested", ActionType::Update),
        ("proposal_deleted", ActionType::Delete),
        ("proposal_viewed", ActionType::View),
        ("report_submitted", ActionType::Update),
        ("report_approved", ActionType::Approve),
        ("report_rejected", ActionType::Reject),
        ("user_login", ActionType::Login),
        ("user_logout", ActionType::Logout),
        ("audit_exported", ActionType::Export),
    ])
});

/// Immutable audit record for an action against a proposal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: i64,
    pub proposal_id: i64,
    pub action: ActionType,
    pub actor_id: UserId,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub note: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: Timestamp,
}

/// Input for appending a new audit record.
#[derive(Debug, Clone)]
pub struct NewAuditEntry {
    pub proposal_id: i64,
    pub action: ActionType,
    pub actor_id: UserId,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub note: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

/// Per-action aggregate over a proposal's trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionStats {
    pub action: ActionType,
    pub count: u64,
    pub first_at: Timestamp,
    pub last_at: Timestamp,
}

/// Export bundle for downstream tooling: the full trail, per-action stats,
/// and a snapshot summary under a version tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditExport {
    pub format_version: String,
    pub proposal_uuid: ProposalId,
    pub generated_at: Timestamp,
    pub entries: Vec<AuditEntry>,
    pub stats: Vec<ActionStats>,
    pub snapshot: ExportSnapshot,
}

/// Summary counters included with an export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportSnapshot {
    pub total_entries: u64,
    pub distinct_actions: u64,
    pub first_at: Option<Timestamp>,
    pub last_at: Option<Timestamp>,
}
