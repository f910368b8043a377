//! Rolling-window cluster detection.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::domain::{ClusterWindow, PositionEvent, Side};

/// Same-side clusters closer than this (in event time) are suppressed.
pub const DEFAULT_REFRACTORY_SECS: i64 = 1;

/// Read-only view of the detector for monitoring.
#[derive(Debug, Clone, Serialize)]
pub struct ClusterSummary {
    pub events: usize,
    pub unique_buy: usize,
    pub unique_sell: usize,
    pub last_event_time: Option<DateTime<Utc>>,
    pub last_cluster_side: Option<Side>,
    pub last_cluster_time: Option<DateTime<Utc>>,
    pub recent: Vec<PositionEvent>,
}

/// Detects when `threshold` distinct participants open on the same side
/// within `window` of event time.
///
/// One detector per engine. Buy is evaluated first, so it wins when both
/// sides reach the threshold in the same evaluation.
#[derive(Debug, Clone)]
pub struct ClusterDetector {
    window: ClusterWindow,
    threshold: usize,
    refractory: Duration,
    last_cluster: Option<(DateTime<Utc>, Side)>,
}

impl ClusterDetector {
    #[must_use]
    pub fn new(window: Duration, threshold: usize, refractory: Duration) -> Self {
        Self {
            window: ClusterWindow::new(window),
            threshold,
            refractory,
            last_cluster: None,
        }
    }

    /// Append `events`, trim, and report the cluster side if one fires.
    ///
    /// An empty batch evaluates nothing and returns `None`.
    pub fn ingest(&mut self, events: &[PositionEvent]) -> Option<Side> {
        if events.is_empty() {
            return None;
        }
        self.observe(events);
        self.evaluate()
    }

    /// Append `events` and trim without evaluating. Used while entry gates
    /// are closed so every event still passes through the window once.
    pub fn observe(&mut self, events: &[PositionEvent]) {
        for event in events {
            self.window.insert(event.clone());
        }
    }

    fn evaluate(&mut self) -> Option<Side> {
        let latest = self.window.latest_time()?;
        let buys = self.window.unique_participants(Side::Buy);
        let sells = self.window.unique_participants(Side::Sell);

        debug!(
            events = self.window.len(),
            unique_buy = buys,
            unique_sell = sells,
            latest = %latest,
            "Cluster window evaluated"
        );

        let side = [(Side::Buy, buys), (Side::Sell, sells)]
            .into_iter()
            .filter(|(_, count)| *count >= self.threshold)
            .map(|(side, _)| side)
            .find(|side| !self.in_refractory(*side, latest))?;

        self.last_cluster = Some((latest, side));
        info!(
            side = %side,
            window_secs = self.window.span().num_seconds(),
            threshold = self.threshold,
            unique_buy = buys,
            unique_sell = sells,
            "Cluster detected"
        );
        Some(side)
    }

    fn in_refractory(&self, side: Side, latest: DateTime<Utc>) -> bool {
        matches!(
            self.last_cluster,
            Some((at, last_side)) if last_side == side && latest - at < self.refractory
        )
    }

    /// Forget all events and the refractory state.
    pub fn reset(&mut self) {
        self.window.clear();
        self.last_cluster = None;
    }

    #[must_use]
    pub fn window(&self) -> &ClusterWindow {
        &self.window
    }

    #[must_use]
    pub fn summary(&self, recent: usize) -> ClusterSummary {
        let skip = self.window.len().saturating_sub(recent);
        ClusterSummary {
            events: self.window.len(),
            unique_buy: self.window.unique_participants(Side::Buy),
            unique_sell: self.window.unique_participants(Side::Sell),
            last_event_time: self.window.latest_time(),
            last_cluster_side: self.last_cluster.map(|(_, side)| side),
            last_cluster_time: self.last_cluster.map(|(at, _)| at),
            recent: self.window.iter().skip(skip).cloned().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{OrderRef, ParticipantId};
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn at(millis: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap() + Duration::milliseconds(millis)
    }

    fn event(id: &str, participant: &str, side: Side, millis: i64) -> PositionEvent {
        PositionEvent {
            order_id: OrderRef::from(id),
            participant_id: ParticipantId::from(participant),
            side,
            size: dec!(1),
            open_price: dec!(2000),
            open_time: at(millis),
        }
    }

    fn detector() -> ClusterDetector {
        ClusterDetector::new(Duration::seconds(10), 3, Duration::seconds(1))
    }

    #[test]
    fn two_buyers_never_signal() {
        let mut detector = detector();
        assert_eq!(detector.ingest(&[event("1", "a", Side::Buy, 0)]), None);
        assert_eq!(detector.ingest(&[event("2", "b", Side::Buy, 1_000)]), None);
    }

    #[test]
    fn third_buyer_signals_once() {
        let mut detector = detector();
        detector.ingest(&[event("1", "a", Side::Buy, 0), event("2", "b", Side::Buy, 1_000)]);
        assert_eq!(detector.ingest(&[event("3", "c", Side::Buy, 2_000)]), Some(Side::Buy));
        assert_eq!(detector.ingest(&[event("4", "d", Side::Buy, 2_500)]), None);
    }

    #[test]
    fn same_side_signals_again_after_refractory() {
        let mut detector = detector();
        detector.ingest(&[
            event("1", "a", Side::Buy, 0),
            event("2", "b", Side::Buy, 100),
            event("3", "c", Side::Buy, 200),
        ]);
        assert_eq!(detector.ingest(&[event("4", "d", Side::Buy, 1_200)]), Some(Side::Buy));
    }

    #[test]
    fn opposite_side_not_suppressed_by_refractory() {
        let mut detector = detector();
        assert_eq!(
            detector.ingest(&[
                event("1", "a", Side::Buy, 0),
                event("2", "b", Side::Buy, 100),
                event("3", "c", Side::Buy, 200),
            ]),
            Some(Side::Buy)
        );
        assert_eq!(
            detector.ingest(&[
                event("4", "x", Side::Sell, 300),
                event("5", "y", Side::Sell, 400),
                event("6", "z", Side::Sell, 500),
            ]),
            Some(Side::Sell)
        );
    }

    #[test]
    fn buy_wins_tie() {
        let mut detector = detector();
        let batch = [
            event("1", "a", Side::Buy, 0),
            event("2", "b", Side::Buy, 0),
            event("3", "c", Side::Buy, 0),
            event("4", "x", Side::Sell, 0),
            event("5", "y", Side::Sell, 0),
            event("6", "z", Side::Sell, 0),
        ];
        assert_eq!(detector.ingest(&batch), Some(Side::Buy));
    }

    #[test]
    fn duplicate_participant_does_not_count() {
        let mut detector = detector();
        detector.ingest(&[event("1", "a", Side::Buy, 0), event("2", "a", Side::Buy, 100)]);
        assert_eq!(detector.ingest(&[event("3", "b", Side::Buy, 200)]), None);
    }

    #[test]
    fn stale_events_leave_window() {
        let mut detector = detector();
        detector.ingest(&[event("1", "a", Side::Buy, 0), event("2", "b", Side::Buy, 1_000)]);
        assert_eq!(detector.ingest(&[event("3", "c", Side::Buy, 12_000)]), None);
        assert_eq!(detector.window().len(), 1);
    }

    #[test]
    fn empty_batch_is_idempotent() {
        let mut detector = detector();
        assert_eq!(detector.ingest(&[]), None);
        detector.ingest(&[
            event("1", "a", Side::Buy, 0),
            event("2", "b", Side::Buy, 100),
            event("3", "c", Side::Buy, 200),
        ]);
        let before = detector.summary(10);
        assert_eq!(detector.ingest(&[]), None);
        let after = detector.summary(10);
        assert_eq!(before.events, after.events);
        assert_eq!(before.last_cluster_time, after.last_cluster_time);
    }

    #[test]
    fn observed_events_count_toward_later_clusters() {
        let mut detector = detector();
        detector.observe(&[event("1", "a", Side::Sell, 0), event("2", "b", Side::Sell, 100)]);
        assert_eq!(detector.ingest(&[event("3", "c", Side::Sell, 200)]), Some(Side::Sell));
    }

    #[test]
    fn reset_clears_window_and_refractory() {
        let mut detector = detector();
        detector.ingest(&[
            event("1", "a", Side::Buy, 0),
            event("2", "b", Side::Buy, 100),
            event("3", "c", Side::Buy, 200),
        ]);
        detector.reset();
        let summary = detector.summary(10);
        assert_eq!(summary.events, 0);
        assert_eq!(summary.last_cluster_side, None);
    }
}
