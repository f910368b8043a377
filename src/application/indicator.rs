//! Technical indicators over one-minute bars.
//!
//! All functions are pure and take bars oldest first. They return `None`
//! instead of a fabricated value when the history cannot support them.

use chrono::{DateTime, NaiveTime, Utc};
use rust_decimal::Decimal;

use crate::domain::{Bar, Price};

/// Average true range over the last `period` bars.
///
/// The first bar's true range is its high-low range. With fewer than
/// `period` bars the plain mean of the available ranges is used.
#[must_use]
pub fn atr(bars: &[Bar], period: usize) -> Option<Price> {
    if bars.is_empty() || period == 0 {
        return None;
    }

    if bars.len() < period {
        let sum: Decimal = bars.iter().map(Bar::range).sum();
        return Some(sum / Decimal::from(bars.len()));
    }

    let start = bars.len() - period;
    let sum: Decimal = (start..bars.len())
        .map(|i| true_range(&bars[i], i.checked_sub(1).map(|p| bars[p].close)))
        .sum();
    Some(sum / Decimal::from(period))
}

fn true_range(bar: &Bar, prev_close: Option<Price>) -> Price {
    let range = bar.range();
    match prev_close {
        Some(prev) => range
            .max((bar.high - prev).abs())
            .max((bar.low - prev).abs()),
        None => range,
    }
}

/// Wilder RSI of closes. Needs `period + 1` bars.
///
/// A flat series reads 50; a series without losses reads 100.
#[must_use]
pub fn rsi(bars: &[Bar], period: usize) -> Option<Decimal> {
    if period == 0 || bars.len() < period + 1 {
        return None;
    }

    let period_dec = Decimal::from(period);
    let changes: Vec<Decimal> = bars.windows(2).map(|w| w[1].close - w[0].close).collect();

    let (seed, rest) = changes.split_at(period);
    let mut avg_gain = seed.iter().map(|c| (*c).max(Decimal::ZERO)).sum::<Decimal>() / period_dec;
    let mut avg_loss = seed.iter().map(|c| (-*c).max(Decimal::ZERO)).sum::<Decimal>() / period_dec;

    let keep = period_dec - Decimal::ONE;
    for change in rest {
        avg_gain = (avg_gain * keep + (*change).max(Decimal::ZERO)) / period_dec;
        avg_loss = (avg_loss * keep + (-*change).max(Decimal::ZERO)) / period_dec;
    }

    if avg_loss.is_zero() {
        return Some(if avg_gain.is_zero() {
            Decimal::from(50)
        } else {
            Decimal::ONE_HUNDRED
        });
    }

    let rs = avg_gain / avg_loss;
    Some(Decimal::ONE_HUNDRED - Decimal::ONE_HUNDRED / (Decimal::ONE + rs))
}

/// Intraday VWAP anchored to UTC midnight of `now`.
///
/// Zero-volume bars count with volume one. With fewer than two bars since
/// midnight the whole slice is used.
#[must_use]
pub fn vwap(bars: &[Bar], now: DateTime<Utc>) -> Option<Price> {
    let midnight = now.date_naive().and_time(NaiveTime::MIN).and_utc();
    let today: Vec<&Bar> = bars.iter().filter(|bar| bar.time >= midnight).collect();
    let session: Vec<&Bar> = if today.len() < 2 {
        bars.iter().collect()
    } else {
        today
    };

    if session.is_empty() {
        return None;
    }

    let (weighted, volume) = session.iter().fold(
        (Decimal::ZERO, Decimal::ZERO),
        |(weighted, volume), bar| {
            let v = if bar.volume.is_zero() {
                Decimal::ONE
            } else {
                bar.volume
            };
            (weighted + bar.typical_price() * v, volume + v)
        },
    );

    if volume.is_zero() {
        return session.last().map(|bar| bar.close);
    }
    Some(weighted / volume)
}

/// Highest high of the last `lookback` bars.
#[must_use]
pub fn highest_high(bars: &[Bar], lookback: usize) -> Option<Price> {
    tail(bars, lookback).iter().map(|bar| bar.high).max()
}

/// Lowest low of the last `lookback` bars.
#[must_use]
pub fn lowest_low(bars: &[Bar], lookback: usize) -> Option<Price> {
    tail(bars, lookback).iter().map(|bar| bar.low).min()
}

fn tail(bars: &[Bar], count: usize) -> &[Bar] {
    &bars[bars.len().saturating_sub(count)..]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;

    fn bar(minute: i64, high: Decimal, low: Decimal, close: Decimal, volume: Decimal) -> Bar {
        Bar {
            time: Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap() + Duration::minutes(minute),
            open: close,
            high,
            low,
            close,
            volume,
        }
    }

    fn closes(values: &[Decimal]) -> Vec<Bar> {
        values
            .iter()
            .enumerate()
            .map(|(i, c)| bar(i as i64, *c, *c, *c, dec!(1)))
            .collect()
    }

    #[test]
    fn atr_averages_true_ranges() {
        let bars = vec![
            bar(0, dec!(11), dec!(9), dec!(10), dec!(1)),
            bar(1, dec!(12), dec!(10), dec!(11), dec!(1)),
            bar(2, dec!(15), dec!(12), dec!(14), dec!(1)),
        ];
        // TR: 2, max(2, 1, 0)=2, max(3, 4, 1)=4
        assert_eq!(atr(&bars, 2), Some(dec!(3)));
        assert_eq!(atr(&bars, 3), Some(dec!(8) / dec!(3)));
    }

    #[test]
    fn atr_falls_back_to_ranges_with_short_history() {
        let bars = vec![
            bar(0, dec!(11), dec!(9), dec!(10), dec!(1)),
            bar(1, dec!(14), dec!(10), dec!(11), dec!(1)),
        ];
        assert_eq!(atr(&bars, 14), Some(dec!(3)));
        assert_eq!(atr(&[], 14), None);
    }

    #[test]
    fn rsi_requires_period_plus_one_closes() {
        let bars = closes(&[dec!(1), dec!(2), dec!(3)]);
        assert_eq!(rsi(&bars, 3), None);
        assert!(rsi(&bars, 2).is_some());
    }

    #[test]
    fn rsi_extremes() {
        let rising = closes(&[dec!(1), dec!(2), dec!(3), dec!(4), dec!(5)]);
        assert_eq!(rsi(&rising, 3), Some(dec!(100)));

        let flat = closes(&[dec!(5), dec!(5), dec!(5), dec!(5)]);
        assert_eq!(rsi(&flat, 3), Some(dec!(50)));

        let falling = closes(&[dec!(5), dec!(4), dec!(3), dec!(2)]);
        assert_eq!(rsi(&falling, 3), Some(dec!(0)));
    }

    #[test]
    fn rsi_balanced_moves_read_fifty() {
        let bars = closes(&[dec!(10), dec!(11), dec!(10), dec!(11), dec!(10)]);
        assert_eq!(rsi(&bars, 4), Some(dec!(50)));
    }

    #[test]
    fn vwap_weights_typical_price_by_volume() {
        let bars = vec![
            bar(0, dec!(10), dec!(10), dec!(10), dec!(1)),
            bar(1, dec!(20), dec!(20), dec!(20), dec!(3)),
        ];
        let now = bars[1].time;
        assert_eq!(vwap(&bars, now), Some(dec!(17.5)));
    }

    #[test]
    fn vwap_counts_zero_volume_as_one() {
        let bars = vec![
            bar(0, dec!(10), dec!(10), dec!(10), dec!(0)),
            bar(1, dec!(20), dec!(20), dec!(20), dec!(1)),
        ];
        assert_eq!(vwap(&bars, bars[1].time), Some(dec!(15)));
    }

    #[test]
    fn vwap_anchors_to_utc_midnight() {
        let yesterday = Bar {
            time: Utc.with_ymd_and_hms(2024, 2, 29, 23, 58, 0).unwrap(),
            open: dec!(100),
            high: dec!(100),
            low: dec!(100),
            close: dec!(100),
            volume: dec!(50),
        };
        let mut bars = vec![yesterday];
        bars.push(bar(0, dec!(10), dec!(10), dec!(10), dec!(1)));
        bars.push(bar(1, dec!(12), dec!(12), dec!(12), dec!(1)));

        assert_eq!(vwap(&bars, bars[2].time), Some(dec!(11)));
    }

    #[test]
    fn vwap_uses_all_bars_when_day_just_started() {
        let yesterday = Bar {
            time: Utc.with_ymd_and_hms(2024, 2, 29, 23, 59, 0).unwrap(),
            open: dec!(8),
            high: dec!(8),
            low: dec!(8),
            close: dec!(8),
            volume: dec!(1),
        };
        let today = bar(0, dec!(12), dec!(12), dec!(12), dec!(1));
        let bars = vec![yesterday, today];
        assert_eq!(vwap(&bars, today.time), Some(dec!(10)));
    }

    #[test]
    fn extremes_over_lookback() {
        let bars = vec![
            bar(0, dec!(30), dec!(1), dec!(10), dec!(1)),
            bar(1, dec!(12), dec!(9), dec!(11), dec!(1)),
            bar(2, dec!(15), dec!(8), dec!(14), dec!(1)),
        ];
        assert_eq!(highest_high(&bars, 2), Some(dec!(15)));
        assert_eq!(lowest_low(&bars, 2), Some(dec!(8)));
        assert_eq!(highest_high(&bars, 10), Some(dec!(30)));
        assert_eq!(highest_high(&[], 10), None);
    }
}
