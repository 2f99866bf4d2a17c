//! Block and self-cooldown evaluation
//!
//! Answers whether an address may take part in a send, and applies the
//! administrative block, unblock and self-cooldown mutations.

pub mod evaluator;

pub use evaluator::{BlockEvaluator, BlockVerdict, BlockedEntry, MAX_SELF_COOLDOWN_DAYS};
