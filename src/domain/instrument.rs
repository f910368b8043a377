//! Symbol specification of the traded instrument.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::money::{Price, Volume};

/// Symbol specification as reported by the execution venue.
///
/// Prices are quoted with `digits` decimals and move in increments of
/// `point`. The broker refuses stops closer than `stops_level` points to
/// the current price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instrument {
    pub symbol: String,
    pub digits: u32,
    pub point: Price,
    #[serde(default)]
    pub stops_level: u32,
    pub contract_size: Decimal,
    pub volume_min: Volume,
    pub volume_max: Volume,
    pub volume_step: Volume,
}

impl Instrument {
    /// Round a price to the instrument's quoted precision.
    #[must_use]
    pub fn round_price(&self, price: Price) -> Price {
        price.round_dp(self.digits)
    }

    /// Convert a count of points into a price distance.
    #[must_use]
    pub fn points(&self, count: Decimal) -> Price {
        count * self.point
    }

    /// Smallest stop distance the broker accepts.
    #[must_use]
    pub fn min_stop_distance(&self) -> Price {
        self.points(Decimal::from(self.stops_level))
    }

    /// Snap a volume to the nearest step and clamp it to `[min, max]`.
    #[must_use]
    pub fn normalize_volume(&self, volume: Volume) -> Volume {
        let stepped = if self.volume_step > Decimal::ZERO {
            (volume / self.volume_step).round() * self.volume_step
        } else {
            volume
        };
        stepped.max(self.volume_min).min(self.volume_max).normalize()
    }
}
