//! Follow/fade direction decision.
//!
//! [`decide`] is pure: the same cluster side, indicators and configuration
//! always produce the same decision. Fetching bars and reporting indicator
//! failures is left to the caller.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::indicator;
use crate::domain::{Bar, Price, Side, TradeMode};

/// Bars fetched for a hybrid decision, enough for RSI and an intraday VWAP.
const MIN_HYBRID_BARS: usize = 300;

/// How an engine turns a cluster into a trade side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectionMode {
    /// Always trade against the cluster.
    #[serde(alias = "inverse")]
    Fade,
    /// Always trade with the cluster.
    #[serde(alias = "momentum")]
    Follow,
    /// Follow only when RSI and VWAP confirm the crowd's momentum.
    Hybrid,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DirectionConfig {
    pub mode: DirectionMode,
    pub rsi_period: usize,
    pub rsi_overbought: Decimal,
    pub rsi_oversold: Decimal,
    /// Fraction of VWAP price must clear, e.g. `0.001` for 0.1%.
    pub vwap_band_pct: Decimal,
    /// Require both conditions (AND) instead of either (OR).
    pub require_both: bool,
}

impl DirectionConfig {
    /// Bars to request from market data for a hybrid decision.
    #[must_use]
    pub fn bars_needed(&self) -> usize {
        (self.rsi_period + 5).max(MIN_HYBRID_BARS)
    }
}

/// Momentum readings used by hybrid mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Indicators {
    pub rsi: Decimal,
    pub vwap: Price,
    pub price: Price,
}

impl Indicators {
    /// Compute from bars, using the last close as the current price.
    /// Returns `None` when RSI or VWAP cannot be computed.
    #[must_use]
    pub fn compute(bars: &[Bar], rsi_period: usize, now: DateTime<Utc>) -> Option<Self> {
        let price = bars.last()?.close;
        Some(Self {
            rsi: indicator::rsi(bars, rsi_period)?,
            vwap: indicator::vwap(bars, now)?,
            price,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub side: Side,
    pub mode: TradeMode,
}

impl Decision {
    const fn follow(cluster: Side) -> Self {
        Self {
            side: cluster,
            mode: TradeMode::Follow,
        }
    }

    const fn fade(cluster: Side) -> Self {
        Self {
            side: cluster.opposite(),
            mode: TradeMode::Fade,
        }
    }
}

/// Map a cluster to a trade side and mode.
///
/// Hybrid mode without indicators fades.
#[must_use]
pub fn decide(cluster: Side, config: &DirectionConfig, indicators: Option<&Indicators>) -> Decision {
    match config.mode {
        DirectionMode::Fade => Decision::fade(cluster),
        DirectionMode::Follow => Decision::follow(cluster),
        DirectionMode::Hybrid => match indicators {
            Some(readings) if momentum_confirms(cluster, config, readings) => {
                Decision::follow(cluster)
            }
            _ => Decision::fade(cluster),
        },
    }
}

/// Whether momentum backs the crowd on `cluster`'s side.
#[must_use]
pub fn momentum_confirms(cluster: Side, config: &DirectionConfig, readings: &Indicators) -> bool {
    let (rsi_ok, vwap_ok) = match cluster {
        Side::Sell => (
            readings.rsi > config.rsi_overbought,
            readings.price > readings.vwap * (Decimal::ONE + config.vwap_band_pct),
        ),
        Side::Buy => (
            readings.rsi < config.rsi_oversold,
            readings.price < readings.vwap * (Decimal::ONE - config.vwap_band_pct),
        ),
    };

    if config.require_both {
        rsi_ok && vwap_ok
    } else {
        rsi_ok || vwap_ok
    }
}
