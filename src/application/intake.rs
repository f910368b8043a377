//! Turns raw feed records into de-duplicated, time-ordered events.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use tracing::{debug, warn};

use super::dedup::SeenOrders;
use crate::domain::{OrderRef, ParticipantId, PositionEvent, Price, Side};
use crate::port::RawEvent;

/// Intake filter for one instrument.
#[derive(Debug, Clone)]
pub struct Intake {
    instrument: String,
    source_tz: Tz,
    /// Records opened before this instant are marked seen and dropped.
    min_open_time: Option<DateTime<Utc>>,
}

impl Intake {
    #[must_use]
    pub fn new(instrument: impl Into<String>, source_tz: Tz) -> Self {
        Self {
            instrument: instrument.into(),
            source_tz,
            min_open_time: None,
        }
    }

    #[must_use]
    pub fn with_min_open_time(mut self, at: DateTime<Utc>) -> Self {
        self.min_open_time = Some(at);
        self
    }

    #[must_use]
    pub fn instrument(&self) -> &str {
        &self.instrument
    }

    /// Build new events from `raws`, skipping other instruments, seen
    /// orders and records whose side or time cannot be determined.
    ///
    /// Accepted records are marked seen. The result is sorted by open time.
    pub fn build(
        &self,
        raws: &[RawEvent],
        seen: &mut SeenOrders,
        now: DateTime<Utc>,
    ) -> Vec<PositionEvent> {
        let mut events = Vec::new();

        for raw in raws {
            if raw.instrument != self.instrument || raw.order_id.is_empty() {
                continue;
            }
            let order_id = OrderRef::new(raw.order_id.as_str());
            if seen.contains(&order_id, now) {
                continue;
            }

            let Some(side) = infer_side(raw) else {
                debug!(order_id = %order_id, "Dropping record without a determinable side");
                continue;
            };

            let Some(open_time) = parse_open_time(&raw.open_time, self.source_tz) else {
                warn!(order_id = %order_id, open_time = %raw.open_time, "Unparseable open time");
                continue;
            };

            if self.min_open_time.is_some_and(|min| open_time < min) {
                seen.insert(order_id, now);
                continue;
            }

            seen.insert(order_id.clone(), now);
            debug!(
                order_id = %order_id,
                participant = %raw.participant_id,
                side = %side,
                size = %raw.size,
                open_time = %open_time,
                "New participant event"
            );
            events.push(PositionEvent {
                order_id,
                participant_id: ParticipantId::new(raw.participant_id.as_str()),
                side,
                size: raw.size,
                open_price: raw.open_price,
                open_time,
            });
        }

        events.sort_by_key(|event| event.open_time);
        events
    }
}

/// Side of a participant record.
///
/// Stop/target geometry wins over the action code: `stop < open < target`
/// is a buy, `target < open < stop` a sell. Otherwise action `0` is a buy
/// and `1` or `2` a sell.
#[must_use]
pub fn infer_side(raw: &RawEvent) -> Option<Side> {
    if let Some(side) = side_from_geometry(raw.open_price, raw.stop_loss, raw.take_profit) {
        return Some(side);
    }
    match raw.action_type {
        Some(0) => Some(Side::Buy),
        Some(1 | 2) => Some(Side::Sell),
        _ => None,
    }
}

fn side_from_geometry(open: Price, stop: Option<Price>, target: Option<Price>) -> Option<Side> {
    let (stop, target) = (stop?, target?);
    if open <= Price::ZERO || stop <= Price::ZERO || target <= Price::ZERO {
        return None;
    }
    if stop < open && open < target {
        Some(Side::Buy)
    } else if target < open && open < stop {
        Some(Side::Sell)
    } else {
        None
    }
}

/// Parse an ISO-8601 timestamp into UTC. Timestamps without an offset are
/// local to `source_tz`.
#[must_use]
pub fn parse_open_time(raw: &str, source_tz: Tz) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()?;
    source_tz
        .from_local_datetime(&naive)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn raw(order_id: &str, participant: &str, action: Option<i64>, open_time: &str) -> RawEvent {
        RawEvent {
            order_id: order_id.into(),
            participant_id: participant.into(),
            instrument: "XAUUSD".into(),
            action_type: action,
            open_price: dec!(2000),
            stop_loss: None,
            take_profit: None,
            size: dec!(1),
            open_time: open_time.into(),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn geometry_beats_action_code() {
        let mut record = raw("1", "a", Some(1), "2024-03-01T12:00:00Z");
        record.stop_loss = Some(dec!(1990));
        record.take_profit = Some(dec!(2020));
        assert_eq!(infer_side(&record), Some(Side::Buy));

        record.stop_loss = Some(dec!(2010));
        record.take_profit = Some(dec!(1980));
        record.action_type = Some(0);
        assert_eq!(infer_side(&record), Some(Side::Sell));
    }

    #[test]
    fn action_code_fallback() {
        assert_eq!(infer_side(&raw("1", "a", Some(0), "")), Some(Side::Buy));
        assert_eq!(infer_side(&raw("1", "a", Some(2), "")), Some(Side::Sell));
        assert_eq!(infer_side(&raw("1", "a", Some(7), "")), None);
        assert_eq!(infer_side(&raw("1", "a", None, "")), None);
    }

    #[test]
    fn inconsistent_geometry_falls_back_to_action() {
        let mut record = raw("1", "a", Some(1), "");
        record.stop_loss = Some(dec!(1990));
        record.take_profit = Some(dec!(1995));
        assert_eq!(infer_side(&record), Some(Side::Sell));
    }

    #[test]
    fn naive_times_use_source_zone() {
        let tz: Tz = "Asia/Jerusalem".parse().unwrap();
        // Jerusalem is UTC+2 in early March.
        let parsed = parse_open_time("2024-03-01T14:00:05", tz).unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 5).unwrap());
    }

    #[test]
    fn offset_times_are_honored() {
        let tz: Tz = "Asia/Jerusalem".parse().unwrap();
        let z = parse_open_time("2024-03-01T12:00:05Z", tz).unwrap();
        let offset = parse_open_time("2024-03-01T13:00:05+01:00", tz).unwrap();
        assert_eq!(z, offset);
        assert_eq!(parse_open_time("yesterday", tz), None);
    }

    #[test]
    fn build_filters_and_sorts() {
        let intake = Intake::new("XAUUSD", chrono_tz::UTC);
        let mut seen = SeenOrders::default();
        let mut other = raw("9", "z", Some(0), "2024-03-01T11:59:59Z");
        other.instrument = "EURUSD".into();

        let events = intake.build(
            &[
                raw("2", "b", Some(1), "2024-03-01T11:59:58Z"),
                raw("1", "a", Some(0), "2024-03-01T11:59:50Z"),
                other,
                raw("3", "c", None, "2024-03-01T11:59:55Z"),
            ],
            &mut seen,
            now(),
        );

        let ids: Vec<_> = events.iter().map(|e| e.order_id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
        assert_eq!(events[1].side, Side::Sell);
    }

    #[test]
    fn build_skips_seen_orders() {
        let intake = Intake::new("XAUUSD", chrono_tz::UTC);
        let mut seen = SeenOrders::default();
        let batch = [raw("1", "a", Some(0), "2024-03-01T11:59:50Z")];

        assert_eq!(intake.build(&batch, &mut seen, now()).len(), 1);
        assert!(intake.build(&batch, &mut seen, now()).is_empty());
    }

    #[test]
    fn records_before_min_open_time_are_marked_seen() {
        let intake =
            Intake::new("XAUUSD", chrono_tz::UTC).with_min_open_time(now() - Duration::seconds(5));
        let mut seen = SeenOrders::default();
        let events = intake.build(
            &[raw("old", "a", Some(0), "2024-03-01T11:59:00Z")],
            &mut seen,
            now(),
        );
        assert!(events.is_empty());
        assert!(seen.contains(&OrderRef::from("old"), now()));
    }
}
