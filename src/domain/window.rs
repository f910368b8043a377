//! Event-time anchored sliding window of participant trade opens.

use std::collections::{HashSet, VecDeque};

use chrono::{DateTime, Duration, Utc};

use super::event::PositionEvent;
use super::side::Side;

/// Events ordered by `open_time` and bounded to
/// `[latest.open_time - span, latest.open_time]`.
///
/// The bound is anchored to the newest event, never to wall-clock time, so
/// a late batch of old events cannot widen the window.
#[derive(Debug, Clone)]
pub struct ClusterWindow {
    span: Duration,
    events: VecDeque<PositionEvent>,
}

impl ClusterWindow {
    #[must_use]
    pub fn new(span: Duration) -> Self {
        Self {
            span,
            events: VecDeque::new(),
        }
    }

    #[must_use]
    pub const fn span(&self) -> Duration {
        self.span
    }

    /// Insert keeping `open_time` order, then trim.
    pub fn insert(&mut self, event: PositionEvent) {
        let at = self
            .events
            .iter()
            .rposition(|existing| existing.open_time <= event.open_time)
            .map_or(0, |index| index + 1);
        self.events.insert(at, event);
        self.trim();
    }

    /// Drop events older than `latest - span`, oldest first.
    pub fn trim(&mut self) {
        let Some(latest) = self.latest_time() else {
            return;
        };
        let cutoff = latest - self.span;
        while self
            .events
            .front()
            .is_some_and(|event| event.open_time < cutoff)
        {
            self.events.pop_front();
        }
    }

    #[must_use]
    pub fn latest_time(&self) -> Option<DateTime<Utc>> {
        self.events.back().map(|event| event.open_time)
    }

    /// Number of distinct participants on `side`.
    #[must_use]
    pub fn unique_participants(&self, side: Side) -> usize {
        self.events
            .iter()
            .filter(|event| event.side == side)
            .map(|event| &event.participant_id)
            .collect::<HashSet<_>>()
            .len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &PositionEvent> {
        self.events.iter()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
