//! Audit module - immutable trail records and action classification.

mod entry;

pub use entry::{
    ActionStats, ActionType, AuditEntry, AuditExport, ExportSnapshot, NewAuditEntry,
    EXPORT_FORMAT_VERSION,
};
