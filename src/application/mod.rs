//! Application layer - services wiring the domain to its ports.
//!
//! Services are explicit objects constructed once at process startup and
//! passed by reference to call sites; there is no hidden global state.
//!
//! - `workflow` - the proposal approval state machine service
//! - `audit` - the append-only trail recorder
//! - `notification` - per-user notification lifecycle and fan-out
//! - `retry` - the client-side submission retry driver

pub mod audit;
pub mod notification;
pub mod retry;
pub mod workflow;

pub use audit::{AuditRecorder, RecordDetails};
pub use notification::{BroadcastAudience, CleanupReport, NotificationDispatcher, ProposalEvent};
pub use retry::{with_retry, Backoff, RetryPolicy, SubmissionClient};
pub use workflow::ProposalWorkflow;
