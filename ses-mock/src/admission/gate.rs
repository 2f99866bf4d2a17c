use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::info;

use super::types::{Decision, SendRequest};
use crate::audit::{AuditEntry, AuditLog, AuditStatus};
use crate::blocklist::BlockEvaluator;
use crate::error::Result;
use crate::rate_limit::SendRateLimiter;

/// Decides whether a send request is admitted
///
/// Order of checks:
/// 1. Sender block state
/// 2. Each recipient's block state, in request order (first hit wins)
/// 3. Sender's hourly quota (one unit per request, not per recipient)
///
/// Exactly one audit branch fires per request. A decision is only returned
/// once its audit entries are stored; a storage failure is returned as an
/// error instead, and an admission that could not be audited gives its quota
/// unit back.
pub struct AdmissionGate {
    evaluator: Arc<BlockEvaluator>,
    limiter: Arc<SendRateLimiter>,
    audit: Arc<AuditLog>,
}

impl AdmissionGate {
    pub fn new(
        evaluator: Arc<BlockEvaluator>,
        limiter: Arc<SendRateLimiter>,
        audit: Arc<AuditLog>,
    ) -> Self {
        Self {
            evaluator,
            limiter,
            audit,
        }
    }

    /// Decide `request` at the current time
    pub async fn admit(&self, request: &SendRequest) -> Result<Decision> {
        self.admit_at(request, Utc::now()).await
    }

    /// Decide `request` as of `now`
    pub async fn admit_at(&self, request: &SendRequest, now: DateTime<Utc>) -> Result<Decision> {
        let from = request.from.as_str();

        let sender = self.evaluator.is_effectively_blocked(from, now).await?;
        if sender.blocked {
            self.audit
                .record(AuditEntry::sender_only(from, AuditStatus::Blocked, now))
                .await?;
            return Ok(self.decided(
                from,
                Decision::RejectBlockedSender {
                    reason: sender.reason,
                },
            ));
        }

        for recipient in &request.to {
            let verdict = self.evaluator.is_effectively_blocked(recipient, now).await?;
            if verdict.blocked {
                self.audit
                    .record(AuditEntry::new(from, recipient, AuditStatus::Blocked, now))
                    .await?;
                return Ok(self.decided(
                    from,
                    Decision::RejectBlockedRecipient {
                        recipient: recipient.clone(),
                        reason: verdict.reason,
                    },
                ));
            }
        }

        if !self.limiter.try_admit(from, now).await {
            self.audit
                .record(AuditEntry::sender_only(from, AuditStatus::RateLimited, now))
                .await?;
            return Ok(self.decided(from, Decision::RejectRateLimited));
        }

        let entries: Vec<AuditEntry> = request
            .to
            .iter()
            .map(|to| AuditEntry::new(from, to, AuditStatus::Sent, now))
            .collect();

        if let Err(e) = self.audit.record_all(&entries).await {
            self.limiter.release(from, now).await;
            return Err(e);
        }

        Ok(self.decided(
            from,
            Decision::Admit {
                recipients: entries.len(),
            },
        ))
    }

    fn decided(&self, from: &str, decision: Decision) -> Decision {
        info!("Send request from {}: {}", from, decision.label());
        decision
    }
}
