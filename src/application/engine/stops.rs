//! Stop and target geometry.
//!
//! Pure price arithmetic shared by entry placement and the trailing
//! ratchet. Venue interaction lives in the lifecycle modules.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{Instrument, Price, Side};

/// How the initial stop is sized and whether it trails afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopMode {
    /// Fixed `sl_distance`, never trailed.
    Fixed,
    /// `ATR * atr_init_mult`, never trailed.
    AtrStatic,
    /// `ATR * atr_init_mult`, trailed at `close -/+ ATR * atr_trail_mult`.
    AtrTrailing,
    /// `ATR * atr_init_mult`, trailed at `HH(lookback) - ATR * mult` for
    /// longs and `LL(lookback) + ATR * mult` for shorts.
    Chandelier,
}

impl StopMode {
    #[must_use]
    pub const fn uses_atr(self) -> bool {
        !matches!(self, Self::Fixed)
    }

    #[must_use]
    pub const fn trails(self) -> bool {
        matches!(self, Self::AtrTrailing | Self::Chandelier)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StopConfig {
    pub mode: StopMode,
    pub sl_distance: Price,
    pub atr_period: usize,
    pub atr_init_mult: Decimal,
    pub atr_trail_mult: Decimal,
    pub chandelier_lookback: usize,
    pub breakeven_trigger_r: Option<Decimal>,
    pub trail_start_r: Option<Decimal>,
    /// Target at this multiple of the stop distance; `None` disables targets.
    pub tp_r_multiple: Option<Decimal>,
    /// A stop change must exceed this many points to be sent.
    pub min_move_points: Decimal,
    /// Trailed stops must stay at least this many points from price.
    pub min_clearance_points: Decimal,
}

impl StopConfig {
    /// Bars to request for ATR and the chandelier lookback.
    #[must_use]
    pub fn bars_needed(&self) -> usize {
        (self.atr_period + 20).max(self.chandelier_lookback + 5)
    }

    /// Initial stop distance: ATR-based when available, otherwise the
    /// fixed distance.
    #[must_use]
    pub fn stop_distance(&self, atr: Option<Price>) -> Price {
        match atr {
            Some(atr) if self.mode.uses_atr() && atr > Decimal::ZERO => atr * self.atr_init_mult,
            _ => self.sl_distance,
        }
    }

    /// Initial stop and optional target for an entry at `entry`.
    #[must_use]
    pub fn initial_levels(&self, side: Side, entry: Price, distance: Price) -> (Price, Option<Price>) {
        let sign = side.sign();
        let stop = entry - sign * distance;
        let target = self
            .tp_r_multiple
            .map(|multiple| entry + sign * distance * multiple);
        (stop, target)
    }

    /// Trailing candidate for a position on `side`.
    #[must_use]
    pub fn trail_candidate(&self, side: Side, levels: &TrailLevels) -> Option<Price> {
        let offset = levels.atr * self.atr_trail_mult;
        match (self.mode, side) {
            (StopMode::Chandelier, Side::Buy) => Some(levels.highest_high - offset),
            (StopMode::Chandelier, Side::Sell) => Some(levels.lowest_low + offset),
            (StopMode::AtrTrailing, Side::Buy) => Some(levels.close - offset),
            (StopMode::AtrTrailing, Side::Sell) => Some(levels.close + offset),
            _ => None,
        }
    }
}

/// Market levels the trailing ratchet is computed from, shared by every
/// position of an engine in one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrailLevels {
    pub atr: Price,
    pub highest_high: Price,
    pub lowest_low: Price,
    pub close: Price,
}

/// Widen stop and target to the broker's minimum distance from `price`,
/// then round both to the instrument precision.
#[must_use]
pub fn enforce_stop_level(
    instrument: &Instrument,
    side: Side,
    price: Price,
    stop: Price,
    target: Option<Price>,
) -> (Price, Option<Price>) {
    let min = instrument.min_stop_distance();
    let (mut stop, mut target) = (stop, target);

    if min > Decimal::ZERO {
        match side {
            Side::Buy => {
                if price - stop < min {
                    stop = price - min;
                }
                target = target.map(|tp| if tp - price < min { price + min } else { tp });
            }
            Side::Sell => {
                if stop - price < min {
                    stop = price + min;
                }
                target = target.map(|tp| if price - tp < min { price - min } else { tp });
            }
        }
    }

    (
        instrument.round_price(stop),
        target.map(|tp| instrument.round_price(tp)),
    )
}

/// Whether `stop` is on the protective side of `price` with at least
/// `clearance` between them.
#[must_use]
pub fn stop_clears_price(side: Side, price: Price, stop: Price, clearance: Price) -> bool {
    match side {
        Side::Buy => stop < price && price - stop >= clearance,
        Side::Sell => stop > price && stop - price >= clearance,
    }
}
