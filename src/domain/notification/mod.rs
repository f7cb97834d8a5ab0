//! Notification module - entity, lifecycle, and preferences.

mod notification;
mod preference;

pub use notification::{
    NewNotification, Notification, NotificationFilter, NotificationKind, NotificationStatus,
    Priority, MAX_PAGE_SIZE,
};
pub use preference::{ChannelSettings, Frequency, NotificationPreference};
