use std::sync::Arc;
use tracing::error;

use super::types::{AuditEntry, AuditStats, AuditStatus};
use crate::error::Result;
use crate::storage::Storage;

/// Writes and aggregates audit entries
pub struct AuditLog {
    storage: Arc<dyn Storage>,
}

impl AuditLog {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Durably record one entry
    pub async fn record(&self, entry: AuditEntry) -> Result<()> {
        self.record_all(std::slice::from_ref(&entry)).await
    }

    /// Durably record a batch; either every entry lands or none does
    pub async fn record_all(&self, entries: &[AuditEntry]) -> Result<()> {
        self.storage.append_audit(entries).await.map_err(|e| {
            error!("Failed to write {} audit entries: {}", entries.len(), e);
            e
        })
    }

    /// Totals per status
    pub async fn stats(&self) -> Result<AuditStats> {
        Ok(AuditStats {
            total_emails_sent: self.storage.count_audit(AuditStatus::Sent).await?,
            total_emails_blocked: self.storage.count_audit(AuditStatus::Blocked).await?,
            total_rate_limited: self.storage.count_audit(AuditStatus::RateLimited).await?,
        })
    }
}
