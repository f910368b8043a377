//! Time-bounded cache of participant order ids already consumed.
//!
//! This is the only process-wide piece of state: every engine sees each
//! participant order at most once because intake filters through one cache.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

use crate::domain::OrderRef;

/// Default retention for seen order ids.
pub const DEFAULT_MAX_AGE_HOURS: i64 = 24;

/// Order ids seen so far, each with the instant it was first seen.
///
/// Entries older than `max_age` are evicted on every access, so the cache
/// stays bounded by the feed's arrival rate.
#[derive(Debug, Clone)]
pub struct SeenOrders {
    max_age: Duration,
    seen: HashMap<OrderRef, DateTime<Utc>>,
}

impl SeenOrders {
    #[must_use]
    pub fn new(max_age: Duration) -> Self {
        Self {
            max_age,
            seen: HashMap::new(),
        }
    }

    /// Record `id` as seen at `now`. Returns `true` if it was not already
    /// present (first sighting or re-admission after expiry).
    pub fn insert(&mut self, id: OrderRef, now: DateTime<Utc>) -> bool {
        self.prune(now);
        if self.seen.contains_key(&id) {
            return false;
        }
        self.seen.insert(id, now);
        true
    }

    /// Whether `id` is still within its retention at `now`.
    pub fn contains(&mut self, id: &OrderRef, now: DateTime<Utc>) -> bool {
        self.prune(now);
        self.seen.contains_key(id)
    }

    /// Mark every id as seen without reporting them. Used at startup so only
    /// orders opened after launch can trigger clusters.
    pub fn bootstrap<I>(&mut self, ids: I, now: DateTime<Utc>) -> usize
    where
        I: IntoIterator<Item = OrderRef>,
    {
        ids.into_iter().filter(|id| self.insert(id.clone(), now)).count()
    }

    fn prune(&mut self, now: DateTime<Utc>) {
        let cutoff = now - self.max_age;
        self.seen.retain(|_, first_seen| *first_seen >= cutoff);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

impl Default for SeenOrders {
    fn default() -> Self {
        Self::new(Duration::hours(DEFAULT_MAX_AGE_HOURS))
    }
}
