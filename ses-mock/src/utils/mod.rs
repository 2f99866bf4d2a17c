//! Utility modules
//!
//! - [`email`]: Email address syntax validation

pub mod email;

pub use email::validate_email;
