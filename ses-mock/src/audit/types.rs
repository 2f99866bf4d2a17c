use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Recipient placeholder for events that concern the sender only
pub const NOT_APPLICABLE: &str = "N/A";

/// Outcome recorded in the audit log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditStatus {
    Sent,
    Blocked,
    RateLimited,
}

impl AuditStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditStatus::Sent => "sent",
            AuditStatus::Blocked => "blocked",
            AuditStatus::RateLimited => "rate_limited",
        }
    }

}

impl fmt::Display for AuditStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One audit log row. Carries addresses only, never message content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub from: String,
    pub to: String,
    pub status: AuditStatus,
    pub created_at: DateTime<Utc>,
}

impl AuditEntry {
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        status: AuditStatus,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            status,
            created_at,
        }
    }

    /// Entry not tied to a single recipient
    pub fn sender_only(from: impl Into<String>, status: AuditStatus, created_at: DateTime<Utc>) -> Self {
        Self::new(from, NOT_APPLICABLE, status, created_at)
    }
}

/// Aggregate counts per status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AuditStats {
    pub total_emails_sent: u64,
    pub total_emails_blocked: u64,
    pub total_rate_limited: u64,
}
