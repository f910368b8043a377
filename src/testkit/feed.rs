//! Scripted [`EventFeed`] for tests.

use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use chrono::Duration;
use parking_lot::Mutex;

use crate::error::{FeedError, Result};
use crate::port::{EventFeed, RawEvent};

/// Feed returning whatever records tests put in it, every fetch.
///
/// Like the real feed, records stay visible until removed, so intake
/// de-duplication is exercised on every tick.
#[derive(Default)]
pub struct ScriptedFeed {
    records: Mutex<Vec<RawEvent>>,
    failing: Mutex<bool>,
    fetches: AtomicU32,
}

impl ScriptedFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<RawEvent>) -> Self {
        let feed = Self::new();
        feed.set_records(records);
        feed
    }

    pub fn set_records(&self, records: Vec<RawEvent>) {
        *self.records.lock() = records;
    }

    pub fn push(&self, record: RawEvent) {
        self.records.lock().push(record);
    }

    /// Make every fetch fail with a 503 until switched off.
    pub fn fail(&self, failing: bool) {
        *self.failing.lock() = failing;
    }

    pub fn fetch_count(&self) -> u32 {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EventFeed for ScriptedFeed {
    async fn fetch(&self, _lookback: Duration) -> Result<Vec<RawEvent>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if *self.failing.lock() {
            return Err(FeedError::Status { status: 503 }.into());
        }
        Ok(self.records.lock().clone())
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}
