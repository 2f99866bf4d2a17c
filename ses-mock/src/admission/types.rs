use serde::{Deserialize, Serialize};

/// Inbound send request
///
/// Subject and body are carried but never inspected or persisted.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SendRequest {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub body: String,
}

/// Terminal outcome of one send request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Admitted; one "sent" audit entry was written per recipient
    Admit { recipients: usize },
    RejectBlockedSender { reason: String },
    /// First blocked recipient in request order
    RejectBlockedRecipient { recipient: String, reason: String },
    RejectRateLimited,
}

impl Decision {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Decision::Admit { .. })
    }

    /// Short name used in logs
    pub fn label(&self) -> &'static str {
        match self {
            Decision::Admit { .. } => "admit",
            Decision::RejectBlockedSender { .. } => "reject_blocked_sender",
            Decision::RejectBlockedRecipient { .. } => "reject_blocked_recipient",
            Decision::RejectRateLimited => "reject_rate_limited",
        }
    }
}
