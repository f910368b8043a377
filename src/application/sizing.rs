//! Position sizing.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{Instrument, Price, Volume};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizingMode {
    /// Always trade `fixed_lots`.
    FixedLots,
    /// Risk `risk_percent` of a fixed reference balance.
    StaticPct,
    /// Risk `risk_percent` of current account equity.
    DynamicPct,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SizingConfig {
    pub mode: SizingMode,
    pub fixed_lots: Volume,
    /// Fraction of the balance risked per trade, e.g. `0.01` for 1%.
    pub risk_percent: Decimal,
    pub static_base_balance: Decimal,
}

impl SizingConfig {
    /// Whether sizing needs the current account equity.
    #[must_use]
    pub fn needs_equity(&self) -> bool {
        self.mode == SizingMode::DynamicPct
    }
}

/// Volume such that a full stop-out costs the configured risk amount,
/// snapped to the instrument's volume grid.
///
/// Falls back to the minimum volume when equity is unknown in dynamic mode
/// or the stop distance or contract size is not positive.
#[must_use]
pub fn position_volume(
    config: &SizingConfig,
    stop_distance: Price,
    instrument: &Instrument,
    equity: Option<Decimal>,
) -> Volume {
    let risk_amount = match config.mode {
        SizingMode::FixedLots => return instrument.normalize_volume(config.fixed_lots),
        SizingMode::StaticPct => config.static_base_balance * config.risk_percent,
        SizingMode::DynamicPct => match equity {
            Some(equity) => equity * config.risk_percent,
            None => return instrument.volume_min,
        },
    };

    if stop_distance <= Decimal::ZERO || instrument.contract_size <= Decimal::ZERO {
        return instrument.volume_min;
    }

    instrument.normalize_volume(risk_amount / (stop_distance * instrument.contract_size))
}
