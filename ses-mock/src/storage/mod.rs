//! Persistence backends
//!
//! The admission engine talks to storage only through the [`Storage`] trait:
//! - [`SqliteStorage`]: durable SQLite database (sqlx)
//! - [`MemoryStorage`]: process-local store for tests and throwaway runs

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStorage;
pub use sqlite::SqliteStorage;

use crate::audit::{AuditEntry, AuditStatus};
use crate::error::Result;
use crate::registry::{AddressFilter, AddressRecord};

/// Storage collaborator used by the registry and the audit log
#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    /// Look up a live (not soft-deleted) address record
    async fn find_address(&self, address: &str) -> Result<Option<AddressRecord>>;

    /// Insert or replace the record keyed by its address
    async fn upsert_address(&self, record: &AddressRecord) -> Result<()>;

    /// Records matching `filter`, in storage order
    async fn list_addresses(&self, filter: AddressFilter) -> Result<Vec<AddressRecord>>;

    /// Append audit entries. Either all entries are stored or none.
    async fn append_audit(&self, entries: &[AuditEntry]) -> Result<()>;

    /// Number of audit entries with `status`
    async fn count_audit(&self, status: AuditStatus) -> Result<u64>;
}
