use chrono::Utc;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use super::types::{AddressFilter, AddressRecord};
use crate::error::{Result, SesError};
use crate::storage::Storage;

/// Durable record of every referenced address
///
/// All mutations go through [`update`](Self::update) or
/// [`update_existing`](Self::update_existing), which run find, mutate and
/// save under one registry-wide lock.
pub struct AddressRegistry {
    storage: Arc<dyn Storage>,
    write_lock: Mutex<()>,
}

impl AddressRegistry {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage,
            write_lock: Mutex::new(()),
        }
    }

    /// Look up an address without creating it
    pub async fn find(&self, address: &str) -> Result<Option<AddressRecord>> {
        self.storage.find_address(address).await
    }

    /// Stored record, or a fresh unsaved default when absent
    pub async fn find_or_create(&self, address: &str) -> Result<AddressRecord> {
        match self.storage.find_address(address).await? {
            Some(record) => Ok(record),
            None => {
                debug!("Creating address record for {}", address);
                Ok(AddressRecord::new(address, Utc::now()))
            }
        }
    }

    /// Persist a record, stamping its update time
    pub async fn save(&self, mut record: AddressRecord) -> Result<AddressRecord> {
        record.updated_at = Utc::now();
        self.storage.upsert_address(&record).await?;
        Ok(record)
    }

    /// Find or create `address`, apply `mutate`, and save
    pub async fn update<F>(&self, address: &str, mutate: F) -> Result<AddressRecord>
    where
        F: FnOnce(&mut AddressRecord),
    {
        let _guard = self.write_lock.lock().await;

        let mut record = self.find_or_create(address).await?;
        mutate(&mut record);
        self.save(record).await
    }

    /// Like [`update`](Self::update) but fails with `NotFound` for unknown addresses
    pub async fn update_existing<F>(&self, address: &str, mutate: F) -> Result<AddressRecord>
    where
        F: FnOnce(&mut AddressRecord),
    {
        let _guard = self.write_lock.lock().await;

        let mut record = self
            .storage
            .find_address(address)
            .await?
            .ok_or_else(|| SesError::NotFound(address.to_string()))?;
        mutate(&mut record);
        self.save(record).await
    }

    /// Records matching `filter`, in storage order
    pub async fn list(&self, filter: AddressFilter) -> Result<Vec<AddressRecord>> {
        self.storage.list_addresses(filter).await
    }
}
