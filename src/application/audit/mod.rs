//! Audit application services.

mod recorder;

pub use recorder::{AuditRecorder, RecordDetails, EXPORT_MAX_ENTRIES};
