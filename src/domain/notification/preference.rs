//! Per-user notification delivery preferences.
//!
//! One row per `(user, kind)`. This core only does in-app status
//! bookkeeping; the channel booleans are read by delivery-channel fan-out
//! living outside the crate.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{Timestamp, UserId};

use super::notification::NotificationKind;

/// Which channels a user wants a notification kind delivered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelSettings {
    pub in_app: bool,
    pub email: bool,
    pub sms: bool,
    pub push: bool,
}

impl Default for ChannelSettings {
    fn default() -> Self {
        Self {
            in_app: true,
            email: false,
            sms: false,
            push: false,
        }
    }
}

/// How often non-immediate channels batch their sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Immediate,
    Daily,
    Weekly,
}

impl Frequency {
    /// Canonical storage representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Immediate => "immediate",
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
        }
    }

    /// Parses the storage representation, defaulting to immediate.
    pub fn parse_or_default(s: &str) -> Self {
        match s {
            "daily" => Frequency::Daily,
            "weekly" => Frequency::Weekly,
            _ => Frequency::Immediate,
        }
    }
}

impl Default for Frequency {
    fn default() -> Self {
        Frequency::Immediate
    }
}

/// A user's delivery preference for one notification kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationPreference {
    pub user_id: UserId,
    pub kind: NotificationKind,
    pub channels: ChannelSettings,
    pub frequency: Frequency,
    pub updated_at: Timestamp,
}

impl NotificationPreference {
    /// Creates a preference with default channels (in-app only, immediate).
    pub fn new(user_id: UserId, kind: NotificationKind) -> Self {
        Self {
            user_id,
            kind,
            channels: ChannelSettings::default(),
            frequency: Frequency::default(),
            updated_at: Timestamp::now(),
        }
    }

    pub fn with_channels(mut self, channels: ChannelSettings) -> Self {
        self.channels = channels;
        self.updated_at = Timestamp::now();
        self
    }

    pub fn with_frequency(mut self, frequency: Frequency) -> Self {
        self.frequency = frequency;
        self.updated_at = Timestamp::now();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_preference_is_in_app_immediate() {
        let pref = NotificationPreference::new(
            UserId::new("student-1").unwrap(),
            NotificationKind::Proposal,
        );
        assert!(pref.channels.in_app);
        assert!(!pref.channels.email);
        assert_eq!(pref.frequency, Frequency::Immediate);
    }

    #[test]
    fn frequency_parse_falls_back_to_immediate() {
        assert_eq!(Frequency::parse_or_default("hourly"), Frequency::Immediate);
        assert_eq!(Frequency::parse_or_default("weekly"), Frequency::Weekly);
    }
}
