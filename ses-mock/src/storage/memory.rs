//! In-process storage backend

use crate::audit::{AuditEntry, AuditStatus};
use crate::error::Result;
use crate::registry::{AddressFilter, AddressRecord};
use tokio::sync::RwLock;

use super::Storage;

/// Keeps records and audit entries in memory, in insertion order
#[derive(Default)]
pub struct MemoryStorage {
    addresses: RwLock<Vec<AddressRecord>>,
    audit: RwLock<Vec<AuditEntry>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every audit entry written so far
    pub async fn audit_entries(&self) -> Vec<AuditEntry> {
        let audit = self.audit.read().await;
        audit.clone()
    }
}

#[async_trait::async_trait]
impl Storage for MemoryStorage {
    async fn find_address(&self, address: &str) -> Result<Option<AddressRecord>> {
        let addresses = self.addresses.read().await;
        Ok(addresses.iter().find(|r| r.address == address).cloned())
    }

    async fn upsert_address(&self, record: &AddressRecord) -> Result<()> {
        let mut addresses = self.addresses.write().await;

        match addresses.iter_mut().find(|r| r.address == record.address) {
            Some(existing) => {
                let created_at = existing.created_at;
                *existing = record.clone();
                existing.created_at = created_at;
            }
            None => addresses.push(record.clone()),
        }

        Ok(())
    }

    async fn list_addresses(&self, filter: AddressFilter) -> Result<Vec<AddressRecord>> {
        let addresses = self.addresses.read().await;
        Ok(addresses
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect())
    }

    async fn append_audit(&self, entries: &[AuditEntry]) -> Result<()> {
        let mut audit = self.audit.write().await;
        audit.extend_from_slice(entries);
        Ok(())
    }

    async fn count_audit(&self, status: AuditStatus) -> Result<u64> {
        let audit = self.audit.read().await;
        Ok(audit.iter().filter(|e| e.status == status).count() as u64)
    }
}
