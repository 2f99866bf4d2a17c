//! REST API module for ses-mock
//!
//! HTTP transport around the admission engine: request validation, routing
//! and mapping of decisions to status codes.

pub mod handlers;
pub mod server;

pub use handlers::AppState;
pub use server::ApiServer;
