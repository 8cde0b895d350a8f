use chrono::{DateTime, Duration, Utc};

use crate::db_types::{Order, Settings};

/// The single source of truth for order deadlines.
///
/// The reconciliation engine uses it to decide between an on-time and a late payment, and the order API uses it to
/// report the deadline to clients. Build a fresh policy from the settings for every decision, so that timeout changes
/// apply to the next notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderTimeoutPolicy {
    timeout: Duration,
}

impl OrderTimeoutPolicy {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.order_timeout())
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn deadline(&self, order: &Order) -> DateTime<Utc> {
        order.created_at + self.timeout
    }

    /// A payment is late if strictly more than the timeout has elapsed since the order was created.
    pub fn is_late(&self, order: &Order, now: DateTime<Utc>) -> bool {
        now - order.created_at > self.timeout
    }

    /// Whole seconds until the deadline, never negative.
    pub fn seconds_remaining(&self, order: &Order, now: DateTime<Utc>) -> i64 {
        (self.deadline(order) - now).num_seconds().max(0)
    }

    /// The cutoff used by the expiry sweep: pending orders created before this instant are stale.
    pub fn stale_before(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - self.timeout
    }
}
