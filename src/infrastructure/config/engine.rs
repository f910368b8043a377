//! Per-engine configuration, one `[[engines]]` table each.

use chrono::Duration;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::application::cluster::detector::DEFAULT_REFRACTORY_SECS;
use crate::application::direction::{DirectionConfig, DirectionMode};
use crate::application::engine::{EngineSettings, EntryConfig, StopConfig, StopMode};
use crate::application::sizing::{SizingConfig, SizingMode};
use crate::domain::EngineId;
use crate::error::{ConfigError, Result};

/// One engine as written in the config file.
///
/// Fields without a default are required; a missing one fails parsing.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    pub name: String,
    pub magic: u64,
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Cluster window in seconds.
    pub t_seconds: u64,
    /// Unique participants needed on one side.
    pub k_unique: usize,
    #[serde(default = "default_refractory_secs")]
    pub refractory_secs: u64,

    pub hold_minutes: u64,
    pub use_time_exit: bool,
    pub sl_distance: Decimal,
    #[serde(alias = "tp_R_multiple")]
    pub tp_r_multiple: Decimal,
    pub use_tp_exit: bool,

    pub stop_mode: StopMode,
    pub atr_period: usize,
    pub atr_init_mult: Decimal,
    pub atr_trail_mult: Decimal,
    #[serde(default = "default_chandelier_lookback", alias = "chan_lookback")]
    pub chandelier_lookback: usize,
    #[serde(default, alias = "trail_start_R")]
    pub trail_start_r: Option<Decimal>,
    #[serde(default, alias = "breakeven_trigger_R")]
    pub breakeven_trigger_r: Option<Decimal>,
    #[serde(default = "default_min_move_points")]
    pub min_move_points: Decimal,
    #[serde(default = "default_min_clearance_points")]
    pub min_clearance_points: Decimal,

    #[serde(alias = "limit_offset_dollars")]
    pub limit_offset: Decimal,
    #[serde(alias = "max_open_positions")]
    pub max_open: usize,
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,
    #[serde(default = "default_pending_ttl_secs")]
    pub pending_ttl_secs: u64,

    #[serde(alias = "risk_mode")]
    pub sizing_mode: SizingMode,
    pub risk_percent: Decimal,
    pub fixed_lots: Decimal,
    pub static_risk_base_balance: Decimal,

    #[serde(default = "default_direction_mode")]
    pub direction_mode: DirectionMode,
    #[serde(default = "default_rsi_period")]
    pub rsi_period: usize,
    #[serde(default = "default_rsi_overbought")]
    pub rsi_overbought: Decimal,
    #[serde(default = "default_rsi_oversold")]
    pub rsi_oversold: Decimal,
    #[serde(default = "default_vwap_band_pct")]
    pub vwap_band_pct: Decimal,
    #[serde(default = "default_require_both")]
    pub hybrid_require_both: bool,
}

const fn default_enabled() -> bool {
    true
}

const fn default_refractory_secs() -> u64 {
    DEFAULT_REFRACTORY_SECS.unsigned_abs()
}

const fn default_chandelier_lookback() -> usize {
    30
}

fn default_min_move_points() -> Decimal {
    Decimal::from(2)
}

fn default_min_clearance_points() -> Decimal {
    Decimal::from(3)
}

const fn default_cooldown_secs() -> u64 {
    120
}

const fn default_pending_ttl_secs() -> u64 {
    180
}

const fn default_direction_mode() -> DirectionMode {
    DirectionMode::Hybrid
}

const fn default_rsi_period() -> usize {
    14
}

fn default_rsi_overbought() -> Decimal {
    Decimal::from(65)
}

fn default_rsi_oversold() -> Decimal {
    Decimal::from(35)
}

fn default_vwap_band_pct() -> Decimal {
    Decimal::new(1, 3)
}

const fn default_require_both() -> bool {
    true
}

/// Longest duration accepted from the config file, ten years.
const MAX_CONFIG_SECS: u64 = 10 * 365 * 24 * 3600;

pub(crate) fn secs(value: u64) -> Duration {
    Duration::seconds(i64::try_from(value.min(MAX_CONFIG_SECS)).unwrap_or_default())
}

impl EngineConfig {
    /// Check ranges that parsing cannot express.
    #[allow(clippy::result_large_err)]
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "engines.name",
            }
            .into());
        }
        if self.t_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "t_seconds",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.k_unique == 0 {
            return Err(ConfigError::InvalidValue {
                field: "k_unique",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.sl_distance <= Decimal::ZERO {
            return Err(ConfigError::InvalidValue {
                field: "sl_distance",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.use_tp_exit && self.tp_r_multiple <= Decimal::ZERO {
            return Err(ConfigError::InvalidValue {
                field: "tp_r_multiple",
                reason: "must be greater than 0 when use_tp_exit is set".to_string(),
            }
            .into());
        }
        if self.use_time_exit && self.hold_minutes == 0 {
            return Err(ConfigError::InvalidValue {
                field: "hold_minutes",
                reason: "must be greater than 0 when use_time_exit is set".to_string(),
            }
            .into());
        }
        if self.stop_mode.uses_atr() && (self.atr_period == 0 || self.atr_init_mult <= Decimal::ZERO) {
            return Err(ConfigError::InvalidValue {
                field: "atr_period",
                reason: "ATR stop modes need a positive period and multiplier".to_string(),
            }
            .into());
        }
        if self.limit_offset < Decimal::ZERO {
            return Err(ConfigError::InvalidValue {
                field: "limit_offset",
                reason: "must be 0 or greater".to_string(),
            }
            .into());
        }
        if self.max_open == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_open",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.pending_ttl_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "pending_ttl_secs",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.risk_percent <= Decimal::ZERO || self.risk_percent > Decimal::ONE {
            return Err(ConfigError::InvalidValue {
                field: "risk_percent",
                reason: "must be in (0, 1]".to_string(),
            }
            .into());
        }
        if self.sizing_mode == SizingMode::FixedLots && self.fixed_lots <= Decimal::ZERO {
            return Err(ConfigError::InvalidValue {
                field: "fixed_lots",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.rsi_oversold >= self.rsi_overbought {
            return Err(ConfigError::InvalidValue {
                field: "rsi_oversold",
                reason: "must be below rsi_overbought".to_string(),
            }
            .into());
        }
        if self.vwap_band_pct < Decimal::ZERO {
            return Err(ConfigError::InvalidValue {
                field: "vwap_band_pct",
                reason: "must be 0 or greater".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

impl From<&EngineConfig> for EngineSettings {
    fn from(c: &EngineConfig) -> Self {
        Self {
            name: c.name.clone(),
            magic: EngineId::new(c.magic),
            window: secs(c.t_seconds),
            threshold: c.k_unique,
            refractory: secs(c.refractory_secs),
            direction: DirectionConfig {
                mode: c.direction_mode,
                rsi_period: c.rsi_period,
                rsi_overbought: c.rsi_overbought,
                rsi_oversold: c.rsi_oversold,
                vwap_band_pct: c.vwap_band_pct,
                require_both: c.hybrid_require_both,
            },
            stops: StopConfig {
                mode: c.stop_mode,
                sl_distance: c.sl_distance,
                atr_period: c.atr_period,
                atr_init_mult: c.atr_init_mult,
                atr_trail_mult: c.atr_trail_mult,
                chandelier_lookback: c.chandelier_lookback,
                breakeven_trigger_r: c.breakeven_trigger_r,
                trail_start_r: c.trail_start_r,
                tp_r_multiple: c.use_tp_exit.then_some(c.tp_r_multiple),
                min_move_points: c.min_move_points,
                min_clearance_points: c.min_clearance_points,
            },
            sizing: SizingConfig {
                mode: c.sizing_mode,
                fixed_lots: c.fixed_lots,
                risk_percent: c.risk_percent,
                static_base_balance: c.static_risk_base_balance,
            },
            entry: EntryConfig {
                limit_offset: c.limit_offset,
                max_open: c.max_open,
                cooldown: secs(c.cooldown_secs),
                pending_ttl: secs(c.pending_ttl_secs),
            },
            max_hold: c
                .use_time_exit
                .then(|| secs(c.hold_minutes.saturating_mul(60))),
        }
    }
}
