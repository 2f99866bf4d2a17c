use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{Result, SesError};
use crate::registry::{AddressFilter, AddressRecord, AddressRegistry};

/// Longest self-cooldown an address may request
pub const MAX_SELF_COOLDOWN_DAYS: i64 = 36_500;

/// Result of checking one address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockVerdict {
    pub blocked: bool,
    /// Empty when not blocked
    pub reason: String,
}

impl BlockVerdict {
    pub fn allowed() -> Self {
        Self {
            blocked: false,
            reason: String::new(),
        }
    }

    pub fn blocked(reason: &str) -> Self {
        Self {
            blocked: true,
            reason: format!("Email is blocked: {}", reason),
        }
    }
}

/// Row of the blocked-address listing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockedEntry {
    pub email_address: String,
    pub is_blocked: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub self_cooldown_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub self_cooldown_days: Option<i64>,
}

impl From<AddressRecord> for BlockedEntry {
    fn from(record: AddressRecord) -> Self {
        Self {
            is_blocked: record.is_blocked(),
            reason: record.block.reason().unwrap_or_default().to_string(),
            self_cooldown_date: record.cooldown.map(|c| c.until),
            self_cooldown_days: record.cooldown.map(|c| c.days),
            email_address: record.address,
        }
    }
}

/// Reconciles administrative blocks with self-cooldowns
pub struct BlockEvaluator {
    registry: Arc<AddressRegistry>,
    release_expired_cooldowns: bool,
}

impl BlockEvaluator {
    /// Evaluator with passive cooldown expiry: an expired self-cooldown keeps
    /// blocking until the address is explicitly unblocked
    pub fn new(registry: Arc<AddressRegistry>) -> Self {
        Self {
            registry,
            release_expired_cooldowns: false,
        }
    }

    /// Let self-cooldowns stop blocking once their expiry has passed
    pub fn release_expired_cooldowns(mut self, enabled: bool) -> Self {
        self.release_expired_cooldowns = enabled;
        self
    }

    /// Whether `address` is blocked at `now`, and why
    ///
    /// Unknown addresses are never blocked.
    pub async fn is_effectively_blocked(
        &self,
        address: &str,
        now: DateTime<Utc>,
    ) -> Result<BlockVerdict> {
        let Some(record) = self.registry.find(address).await? else {
            return Ok(BlockVerdict::allowed());
        };

        if record.block.blocks_at(now, self.release_expired_cooldowns) {
            let reason = record.block.reason().unwrap_or_default();
            debug!("{} is blocked: {}", address, reason);
            Ok(BlockVerdict::blocked(reason))
        } else {
            Ok(BlockVerdict::allowed())
        }
    }

    /// Administratively block `address`, creating its record when needed
    pub async fn block(&self, address: &str, reason: &str) -> Result<AddressRecord> {
        let record = self.registry.update(address, |r| r.block(reason)).await?;
        info!("Blocked {}: {}", address, reason);
        Ok(record)
    }

    /// Clear the block flag of a known address
    ///
    /// Cooldown bookkeeping is left in place.
    pub async fn unblock(&self, address: &str) -> Result<AddressRecord> {
        let record = self
            .registry
            .update_existing(address, |r| r.unblock())
            .await?;
        info!("Unblocked {}", address);
        Ok(record)
    }

    /// Put `address` in a self-cooldown of `days` starting at `now`
    ///
    /// A repeated call replaces the earlier window.
    pub async fn self_block(
        &self,
        address: &str,
        days: i64,
        now: DateTime<Utc>,
    ) -> Result<AddressRecord> {
        if !(1..=MAX_SELF_COOLDOWN_DAYS).contains(&days) {
            return Err(SesError::Validation(format!(
                "self cooldown must last between 1 and {} days",
                MAX_SELF_COOLDOWN_DAYS
            )));
        }

        let record = self
            .registry
            .update(address, |r| r.self_block(days, now))
            .await?;
        info!("{} entered a {} day self cooldown", address, days);
        Ok(record)
    }

    /// Every address whose block flag is set
    pub async fn list_blocked(&self) -> Result<Vec<BlockedEntry>> {
        let records = self.registry.list(AddressFilter::Blocked).await?;
        Ok(records.into_iter().map(BlockedEntry::from).collect())
    }
}
