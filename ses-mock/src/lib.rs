//! ses-mock: Mock cloud email-sending API
//!
//! Accepts send requests, decides whether to admit or reject them, and
//! records every outcome. No mail is ever delivered.
//!
//! # Admission control
//!
//! - **Blocklist**: administrative blocks and self-imposed cooldowns share
//!   one enforcement flag; an expired cooldown is not cleared on its own
//! - **Rate limiting**: per-sender hourly quota, one unit per request,
//!   limit re-read from the environment on every decision
//! - **Audit**: one entry per outcome (per recipient when admitted), never
//!   containing subject or body
//!
//! # Example
//!
//! ```no_run
//! use ses_mock::admission::SendRequest;
//! use ses_mock::api::AppState;
//! use ses_mock::rate_limit::FixedLimit;
//! use ses_mock::storage::SqliteStorage;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let storage = Arc::new(SqliteStorage::connect("sqlite::memory:").await?);
//!     let state = AppState::new(storage, Arc::new(FixedLimit::new(5)), false);
//!
//!     let request = SendRequest {
//!         from: "sender@example.com".to_string(),
//!         to: vec!["friend@example.com".to_string()],
//!         subject: "Hello".to_string(),
//!         body: "Hi there".to_string(),
//!     };
//!     let decision = state.gate.admit(&request).await?;
//!     println!("{:?}", decision);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! - [`admission`]: Admission gate and decisions
//! - [`api`]: HTTP API (axum)
//! - [`audit`]: Audit log
//! - [`blocklist`]: Block and self-cooldown evaluation
//! - [`config`]: Configuration management
//! - [`error`]: Error types and handling
//! - [`newsletter`]: Newsletter subscriptions
//! - [`rate_limit`]: Per-sender hourly quota
//! - [`registry`]: Address records
//! - [`storage`]: SQLite and in-memory backends
//! - [`utils`]: Utility functions (validation)

pub mod admission;
pub mod api;
pub mod audit;
pub mod blocklist;
pub mod config;
pub mod error;
pub mod newsletter;
pub mod rate_limit;
pub mod registry;
pub mod storage;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use error::{Result, SesError};
