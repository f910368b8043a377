//! Builders for domain primitives used across tests.

use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::domain::{Bar, Instrument, OrderRef, ParticipantId, PositionEvent, Price, Side};
use crate::port::RawEvent;

/// Symbol used by every builder.
pub const SYMBOL: &str = "XAUUSD";

/// Gold-like instrument: 2 digits, 100 oz contract, 0.01 lot grid.
pub fn instrument() -> Instrument {
    Instrument {
        symbol: SYMBOL.into(),
        digits: 2,
        point: dec!(0.01),
        stops_level: 0,
        contract_size: dec!(100),
        volume_min: dec!(0.01),
        volume_max: dec!(100),
        volume_step: dec!(0.01),
    }
}

/// Fixed reference instant, a Wednesday at 12:00 UTC.
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 7, 10, 12, 0, 0).single().unwrap_or_default()
}

/// `t0() + secs`.
pub fn at(secs: i64) -> DateTime<Utc> {
    t0() + Duration::seconds(secs)
}

/// Intake-ready event.
pub fn event(order_id: &str, participant: &str, side: Side, open_time: DateTime<Utc>) -> PositionEvent {
    PositionEvent {
        order_id: OrderRef::new(order_id),
        participant_id: ParticipantId::new(participant),
        side,
        size: dec!(1),
        open_price: dec!(2000),
        open_time,
    }
}

/// Raw feed record with an explicit UTC open time and no stop or target, so
/// the action code decides the side.
pub fn raw(order_id: &str, participant: &str, side: Side, open_time: DateTime<Utc>) -> RawEvent {
    RawEvent {
        order_id: order_id.into(),
        participant_id: participant.into(),
        instrument: SYMBOL.into(),
        action_type: Some(match side {
            Side::Buy => 0,
            Side::Sell => 1,
        }),
        open_price: dec!(2000),
        stop_loss: None,
        take_profit: None,
        size: dec!(1),
        open_time: open_time.to_rfc3339(),
    }
}

/// One-minute bar opening at `time`.
pub fn bar(time: DateTime<Utc>, open: Price, high: Price, low: Price, close: Price) -> Bar {
    Bar {
        time,
        open,
        high,
        low,
        close,
        volume: dec!(100),
    }
}

/// `count` one-minute bars ending at `end`, alternating up and down by
/// `step` around `center`. RSI stays near 50 and price near VWAP.
pub fn flat_bars(count: usize, end: DateTime<Utc>, center: Price, step: Price) -> Vec<Bar> {
    let count = i64::try_from(count).unwrap_or(i64::MAX);
    (0..count)
        .map(|offset| {
            let time = end - Duration::minutes(count - offset);
            let close = if offset % 2 == 0 { center + step } else { center - step };
            bar(time, center, center + step * Decimal::TWO, center - step * Decimal::TWO, close)
        })
        .collect()
}

/// `count` one-minute bars ending at `end`, each closing `step` above the
/// previous one, starting from `start`.
pub fn rising_bars(count: usize, end: DateTime<Utc>, start: Price, step: Price) -> Vec<Bar> {
    let count = i64::try_from(count).unwrap_or(i64::MAX);
    (0..count)
        .map(|offset| {
            let time = end - Duration::minutes(count - offset);
            let open = start + step * Decimal::from(offset);
            let close = open + step;
            bar(time, open, close + step / Decimal::TWO, open - step / Decimal::TWO, close)
        })
        .collect()
}
