//! Notification application services.

mod dispatcher;

pub use dispatcher::{
    BroadcastAudience, CleanupReport, NotificationDispatcher, ProposalEvent,
};
