use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Reason stored on addresses that blocked themselves
pub const SELF_COOLDOWN_REASON: &str = "Self cooldown";

/// How an address is currently blocked
///
/// Administrative blocks and self-cooldowns share one enforcement flag: any
/// variant other than `Unblocked` stops sends. They differ only in the stored
/// reason and the cooldown bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BlockState {
    Unblocked,
    AdminBlocked {
        reason: String,
    },
    SelfCooldown {
        until: DateTime<Utc>,
        days: i64,
    },
}

impl BlockState {
    /// Whether the enforcement flag is set
    pub fn is_flagged(&self) -> bool {
        !matches!(self, BlockState::Unblocked)
    }

    /// Stored reason text, `None` when unblocked
    pub fn reason(&self) -> Option<&str> {
        match self {
            BlockState::Unblocked => None,
            BlockState::AdminBlocked { reason } => Some(reason),
            BlockState::SelfCooldown { .. } => Some(SELF_COOLDOWN_REASON),
        }
    }

    /// Storage tag of the variant
    pub fn kind(&self) -> Option<&'static str> {
        match self {
            BlockState::Unblocked => None,
            BlockState::AdminBlocked { .. } => Some("admin"),
            BlockState::SelfCooldown { .. } => Some("self_cooldown"),
        }
    }

    /// Whether this state stops a send at `now`
    ///
    /// A self-cooldown keeps blocking after its expiry unless
    /// `release_expired` is set; nothing clears the flag on its own.
    pub fn blocks_at(&self, now: DateTime<Utc>, release_expired: bool) -> bool {
        match self {
            BlockState::Unblocked => false,
            BlockState::AdminBlocked { .. } => true,
            BlockState::SelfCooldown { until, .. } => !release_expired || now < *until,
        }
    }
}

/// Self-cooldown window last requested by the address owner
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cooldown {
    pub until: DateTime<Utc>,
    pub days: i64,
}

/// One referenced email address
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressRecord {
    /// Opaque address string, not normalized
    pub address: String,
    pub block: BlockState,
    /// Kept across unblock for display
    pub cooldown: Option<Cooldown>,
    pub subscribed: bool,
    pub category: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AddressRecord {
    /// Fresh record: unblocked, no cooldown, not subscribed
    pub fn new(address: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            address: address.into(),
            block: BlockState::Unblocked,
            cooldown: None,
            subscribed: false,
            category: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_blocked(&self) -> bool {
        self.block.is_flagged()
    }

    pub fn block(&mut self, reason: impl Into<String>) {
        self.block = BlockState::AdminBlocked {
            reason: reason.into(),
        };
    }

    /// Clear the enforcement flag. Cooldown bookkeeping stays.
    pub fn unblock(&mut self) {
        self.block = BlockState::Unblocked;
    }

    /// Start a self-cooldown of `days` from `now`, replacing any earlier window
    pub fn self_block(&mut self, days: i64, now: DateTime<Utc>) {
        let until = now + Duration::days(days);
        self.block = BlockState::SelfCooldown { until, days };
        self.cooldown = Some(Cooldown { until, days });
    }

    pub fn subscribe(&mut self, category: impl Into<String>) {
        self.subscribed = true;
        self.category = category.into();
    }

    pub fn unsubscribe(&mut self) {
        self.subscribed = false;
        self.category.clear();
    }
}

/// Selection for listing stored addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressFilter {
    Blocked,
    Subscribed,
}

impl AddressFilter {
    pub fn matches(&self, record: &AddressRecord) -> bool {
        match self {
            AddressFilter::Blocked => record.is_blocked(),
            AddressFilter::Subscribed => record.subscribed,
        }
    }
}
