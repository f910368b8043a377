//! Cluster detection properties over arbitrary event streams.

use chrono::Duration;
use proptest::prelude::*;

use cluster_hybrid::application::cluster::ClusterDetector;
use cluster_hybrid::domain::{PositionEvent, Side};
use cluster_hybrid::testkit::domain::{at, event};

const WINDOW_SECS: i64 = 10;
const THRESHOLD: usize = 3;

fn detector() -> ClusterDetector {
    ClusterDetector::new(Duration::seconds(WINDOW_SECS), THRESHOLD, Duration::seconds(1))
}

fn side(buy: bool) -> Side {
    if buy {
        Side::Buy
    } else {
        Side::Sell
    }
}

/// Batches of `(participant, buy, offset_secs)` turned into events with
/// unique order ids.
fn batches() -> impl Strategy<Value = Vec<Vec<(u8, bool, i64)>>> {
    prop::collection::vec(
        prop::collection::vec((0_u8..6, any::<bool>(), 0_i64..60), 0..5),
        1..12,
    )
}

fn to_events(batches: &[Vec<(u8, bool, i64)>]) -> Vec<Vec<PositionEvent>> {
    let mut next_id = 0;
    batches
        .iter()
        .map(|batch| {
            batch
                .iter()
                .map(|(participant, buy, offset)| {
                    next_id += 1;
                    event(
                        &next_id.to_string(),
                        &format!("p{participant}"),
                        side(*buy),
                        at(*offset),
                    )
                })
                .collect()
        })
        .collect()
}

#[test]
fn crowd_spread_wider_than_window_does_not_fire() {
    let mut detector = detector();
    assert_eq!(detector.ingest(&[event("1", "alice", Side::Sell, at(0))]), None);
    assert_eq!(detector.ingest(&[event("2", "bob", Side::Sell, at(6))]), None);
    // alice falls out once carol arrives eleven seconds after her
    assert_eq!(detector.ingest(&[event("3", "carol", Side::Sell, at(11))]), None);
    assert_eq!(detector.window().unique_participants(Side::Sell), 2);
    assert_eq!(
        detector.ingest(&[event("4", "dave", Side::Sell, at(12))]),
        Some(Side::Sell)
    );
}

#[test]
fn late_batch_cannot_revive_expired_events() {
    let mut detector = detector();
    detector.ingest(&[event("1", "alice", Side::Buy, at(30))]);
    let stale = [
        event("2", "bob", Side::Buy, at(0)),
        event("3", "carol", Side::Buy, at(1)),
    ];
    assert_eq!(detector.ingest(&stale), None);
    assert_eq!(detector.window().len(), 1);
}

#[test]
fn one_batch_can_carry_a_whole_cluster() {
    let mut detector = detector();
    let batch = [
        event("1", "alice", Side::Sell, at(0)),
        event("2", "bob", Side::Sell, at(1)),
        event("3", "carol", Side::Sell, at(2)),
        event("4", "dave", Side::Buy, at(2)),
    ];
    assert_eq!(detector.ingest(&batch), Some(Side::Sell));
    assert_eq!(detector.summary(2).recent.len(), 2);
}

proptest! {
    #[test]
    fn window_stays_sorted_and_bounded(batches in batches()) {
        let mut detector = detector();
        for batch in to_events(&batches) {
            detector.ingest(&batch);

            let window = detector.window();
            let times: Vec<_> = window.iter().map(|event| event.open_time).collect();
            prop_assert!(times.windows(2).all(|pair| pair[0] <= pair[1]));
            if let Some(latest) = window.latest_time() {
                let cutoff = latest - Duration::seconds(WINDOW_SECS);
                prop_assert!(times.iter().all(|time| *time >= cutoff && *time <= latest));
            }
        }
    }

    #[test]
    fn signal_implies_threshold_met(batches in batches()) {
        let mut detector = detector();
        for batch in to_events(&batches) {
            if let Some(side) = detector.ingest(&batch) {
                prop_assert!(detector.window().unique_participants(side) >= THRESHOLD);
            }
        }
    }

    #[test]
    fn two_participants_never_signal(
        events in prop::collection::vec((0_u8..2, any::<bool>(), 0_i64..60), 1..40),
    ) {
        let mut detector = detector();
        for batch in to_events(&[events]) {
            prop_assert_eq!(detector.ingest(&batch), None);
        }
    }

    #[test]
    fn empty_batches_never_change_state(batches in batches()) {
        let mut detector = detector();
        for batch in to_events(&batches) {
            detector.ingest(&batch);
            let before = detector.window().len();
            prop_assert_eq!(detector.ingest(&[]), None);
            prop_assert_eq!(detector.window().len(), before);
        }
    }
}
