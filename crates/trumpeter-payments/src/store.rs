//! Processed-Event Tracking
//!
//! Stripe redelivers webhook events until it sees a 2xx, and can redeliver
//! ones it already got an acknowledgement for. The reconciler records each
//! handled event id here before dispatching, so a redelivery never repeats
//! a side effect. Entries outlive the provider's redelivery window and are
//! swept lazily on insert.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Duration, Utc};

use crate::error::Result;

/// Default retention for processed ids. Stripe retries for up to three
/// days, so ids are kept slightly past that.
pub const DEFAULT_RETENTION_HOURS: i64 = 72;

/// Store of processed webhook event ids.
pub trait ProcessedEventStore: Send + Sync {
    /// Record an event id as processed. Returns `false` when the id was
    /// already recorded, in which case the caller must not dispatch.
    fn record(&self, event_id: &str) -> Result<bool>;

    /// Whether an event id is recorded and unexpired.
    fn contains(&self, event_id: &str) -> Result<bool>;
}

/// In-memory processed-event store.
///
/// Ids vanish on restart; a redelivery arriving after a restart is treated
/// as new, which is the accepted trade-off for a single-process deployment.
pub struct MemoryEventStore {
    seen: RwLock<HashMap<String, DateTime<Utc>>>,
    retention: Duration,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self::with_retention(Duration::hours(DEFAULT_RETENTION_HOURS))
    }

    /// Store with a custom retention horizon.
    pub fn with_retention(retention: Duration) -> Self {
        Self {
            seen: RwLock::new(HashMap::new()),
            retention,
        }
    }

    fn expired(&self, recorded_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now - recorded_at > self.retention
    }
}

impl Default for MemoryEventStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessedEventStore for MemoryEventStore {
    fn record(&self, event_id: &str) -> Result<bool> {
        let now = Utc::now();
        let mut seen = self.seen.write().unwrap();

        seen.retain(|_, recorded_at| !self.expired(*recorded_at, now));

        if seen.contains_key(event_id) {
            return Ok(false);
        }

        seen.insert(event_id.to_string(), now);
        Ok(true)
    }

    fn contains(&self, event_id: &str) -> Result<bool> {
        let now = Utc::now();
        let seen = self.seen.read().unwrap();
        Ok(seen
            .get(event_id)
            .is_some_and(|recorded_at| !self.expired(*recorded_at, now)))
    }
}
