//! Address registry
//!
//! One record per referenced email address, carrying block state,
//! self-cooldown bookkeeping and newsletter subscription.

pub mod manager;
pub mod types;

pub use manager::AddressRegistry;
pub use types::{AddressFilter, AddressRecord, BlockState, Cooldown, SELF_COOLDOWN_REASON};
