//! Admission control for send requests
//!
//! The [`AdmissionGate`] checks the sender, then every recipient, then the
//! sender's hourly quota, and writes one audit outcome per request.

pub mod gate;
pub mod types;

pub use gate::AdmissionGate;
pub use types::{Decision, SendRequest};
