/// Append-only audit trail of admission outcomes
///
/// Entries carry sender, recipient (or "N/A") and status only.

pub mod log;
pub mod types;

pub use log::AuditLog;
pub use types::{AuditEntry, AuditStats, AuditStatus, NOT_APPLICABLE};
