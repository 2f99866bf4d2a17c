//! Newsletter subscriptions
//!
//! Subscription state lives on the same address records as blocking but is
//! an independent axis: subscribing never blocks or unblocks an address.

pub mod manager;

pub use manager::{NewsletterManager, Subscriber};
