//! Hourly send quota per sender
//!
//! Every admitted send request consumes one unit of its sender's quota for the
//! current calendar hour (UTC). The limiter keeps:
//! - One counter per `(sender, hour bucket)`
//! - Only the current and the immediately preceding bucket per sender
//! - A single mutex over the whole map, so check-and-increment is atomic
//!
//! The hourly limit is not cached: it is read from a [`LimitSource`] on every
//! decision, so a changed environment takes effect on the next request.
//!
//! # Example
//! ```no_run
//! use chrono::Utc;
//! use ses_mock::rate_limit::SendRateLimiter;
//!
//! # async fn example() {
//! let limiter = SendRateLimiter::with_limit(5);
//!
//! if limiter.try_admit("sender@example.com", Utc::now()).await {
//!     println!("Send admitted");
//! } else {
//!     println!("Hourly limit reached");
//! }
//! # }
//! ```

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Limit used when the configured value is absent or not a number
pub const DEFAULT_LIMIT_PER_HOUR: u32 = 5;

const SECONDS_PER_HOUR: i64 = 3600;

/// Supplies the current hourly send limit per sender
pub trait LimitSource: Send + Sync {
    fn limit_per_hour(&self) -> u32;
}

/// Reads the limit from a process environment variable on every call
#[derive(Debug, Clone)]
pub struct EnvLimit {
    var: String,
}

impl EnvLimit {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }

    /// Interpret a raw limit value
    ///
    /// Absent or non-numeric values fall back to [`DEFAULT_LIMIT_PER_HOUR`].
    /// Negative values clamp to zero, which rejects every send.
    pub fn parse(value: Option<&str>) -> u32 {
        match value.and_then(|v| v.trim().parse::<i64>().ok()) {
            Some(n) if n < 0 => 0,
            Some(n) => u32::try_from(n).unwrap_or(u32::MAX),
            None => DEFAULT_LIMIT_PER_HOUR,
        }
    }
}

impl LimitSource for EnvLimit {
    fn limit_per_hour(&self) -> u32 {
        let value = std::env::var(&self.var).ok();
        Self::parse(value.as_deref())
    }
}

/// A limit pinned at construction time
#[derive(Debug, Clone, Copy)]
pub struct FixedLimit(u32);

impl FixedLimit {
    pub fn new(limit: u32) -> Self {
        Self(limit)
    }
}

impl LimitSource for FixedLimit {
    fn limit_per_hour(&self) -> u32 {
        self.0
    }
}

/// Calendar-hour bucket of a timestamp (hours since the Unix epoch)
pub fn hour_bucket(now: DateTime<Utc>) -> i64 {
    now.timestamp().div_euclid(SECONDS_PER_HOUR)
}

#[derive(Debug, Clone, Copy)]
struct BucketCount {
    bucket: i64,
    count: u32,
}

impl BucketCount {
    fn empty(bucket: i64) -> Self {
        Self { bucket, count: 0 }
    }
}

/// Current and previous hour counters of one sender
#[derive(Debug, Clone)]
struct SenderWindow {
    current: BucketCount,
    previous: Option<BucketCount>,
}

impl SenderWindow {
    fn new(bucket: i64) -> Self {
        Self {
            current: BucketCount::empty(bucket),
            previous: None,
        }
    }

    /// Counter for `bucket`, rolling the window forward when time advanced.
    /// Returns `None` for buckets older than the retained window.
    fn slot_mut(&mut self, bucket: i64) -> Option<&mut BucketCount> {
        if bucket > self.current.bucket {
            self.previous = if bucket == self.current.bucket + 1 {
                Some(self.current)
            } else {
                None
            };
            self.current = BucketCount::empty(bucket);
        }

        if bucket == self.current.bucket {
            return Some(&mut self.current);
        }

        if bucket == self.current.bucket - 1 {
            return Some(self.previous.get_or_insert(BucketCount::empty(bucket)));
        }

        None
    }

    fn count(&self, bucket: i64) -> u32 {
        if self.current.bucket == bucket {
            self.current.count
        } else {
            match self.previous {
                Some(prev) if prev.bucket == bucket => prev.count,
                _ => 0,
            }
        }
    }
}

#[derive(Debug, Default)]
struct LimiterState {
    windows: HashMap<String, SenderWindow>,
    /// Newest bucket for which stale senders were swept
    swept_bucket: i64,
}

impl LimiterState {
    /// Drop senders with no activity in the current or previous hour.
    /// Runs at most once per hour bucket.
    fn maybe_sweep(&mut self, bucket: i64) {
        if bucket <= self.swept_bucket {
            return;
        }
        self.swept_bucket = bucket;

        let before = self.windows.len();
        self.windows.retain(|_, w| w.current.bucket >= bucket - 1);
        let removed = before - self.windows.len();

        if removed > 0 {
            debug!("Evicted {} idle senders from rate limiter", removed);
        }
    }
}

/// Per-sender hourly rate limiter
pub struct SendRateLimiter {
    state: Mutex<LimiterState>,
    limits: Arc<dyn LimitSource>,
}

impl SendRateLimiter {
    /// Create a limiter consulting `limits` on every decision
    pub fn new(limits: Arc<dyn LimitSource>) -> Self {
        Self {
            state: Mutex::new(LimiterState::default()),
            limits,
        }
    }

    /// Create a limiter with a fixed hourly limit
    pub fn with_limit(limit: u32) -> Self {
        Self::new(Arc::new(FixedLimit::new(limit)))
    }

    /// Current hourly limit
    pub fn limit_per_hour(&self) -> u32 {
        self.limits.limit_per_hour()
    }

    /// Try to consume one unit of `sender`'s quota for the hour containing `now`
    ///
    /// # Returns
    /// - `true` if the request is admitted (the counter was incremented)
    /// - `false` if the hourly limit is reached (the counter is unchanged)
    pub async fn try_admit(&self, sender: &str, now: DateTime<Utc>) -> bool {
        let limit = self.limits.limit_per_hour();
        let bucket = hour_bucket(now);

        let mut state = self.state.lock().await;
        state.maybe_sweep(bucket);

        let window = state
            .windows
            .entry(sender.to_string())
            .or_insert_with(|| SenderWindow::new(bucket));

        let Some(slot) = window.slot_mut(bucket) else {
            warn!(
                "Rejecting send for {}: bucket {} is older than the retained window",
                sender, bucket
            );
            return false;
        };

        if slot.count >= limit {
            warn!(
                "Hourly send limit reached for {}: {}/{}",
                sender, slot.count, limit
            );
            return false;
        }

        slot.count += 1;
        debug!("Sender {} at {}/{} this hour", sender, slot.count, limit);
        true
    }

    /// Give back one unit previously consumed by [`try_admit`](Self::try_admit)
    pub async fn release(&self, sender: &str, now: DateTime<Utc>) {
        let bucket = hour_bucket(now);
        let mut state = self.state.lock().await;

        if let Some(window) = state.windows.get_mut(sender) {
            if let Some(slot) = window.slot_mut(bucket) {
                slot.count = slot.count.saturating_sub(1);
                debug!("Released one send unit for {}", sender);
            }
        }
    }

    /// Sends admitted for `sender` in the hour containing `now`
    pub async fn count(&self, sender: &str, now: DateTime<Utc>) -> u32 {
        let bucket = hour_bucket(now);
        let state = self.state.lock().await;

        state
            .windows
            .get(sender)
            .map(|w| w.count(bucket))
            .unwrap_or(0)
    }

    /// Forget all counters of `sender`
    pub async fn reset(&self, sender: &str) {
        let mut state = self.state.lock().await;
        state.windows.remove(sender);
        debug!("Reset rate limit for {}", sender);
    }

    /// Number of senders currently held in memory
    pub async fn tracked_senders(&self) -> usize {
        let state = self.state.lock().await;
        state.windows.len()
    }
}
