//! Canonical engine settings.
//!
//! Fade mode, fixed 3.00 stop, no target, 0.1 lots, one slot, 0.50 limit
//! offset, 10 s window with K=3. Tests override individual fields.

use chrono::Duration;
use rust_decimal_macros::dec;

use crate::application::direction::{DirectionConfig, DirectionMode};
use crate::application::engine::{EngineSettings, EntryConfig, StopConfig, StopMode};
use crate::application::sizing::{SizingConfig, SizingMode};
use crate::domain::EngineId;

pub fn settings() -> EngineSettings {
    EngineSettings {
        name: "alpha".into(),
        magic: EngineId::new(7001),
        window: Duration::seconds(10),
        threshold: 3,
        refractory: Duration::seconds(1),
        direction: DirectionConfig {
            mode: DirectionMode::Fade,
            rsi_period: 14,
            rsi_overbought: dec!(65),
            rsi_oversold: dec!(35),
            vwap_band_pct: dec!(0.001),
            require_both: true,
        },
        stops: StopConfig {
            mode: StopMode::Fixed,
            sl_distance: dec!(3),
            atr_period: 14,
            atr_init_mult: dec!(1.5),
            atr_trail_mult: dec!(2),
            chandelier_lookback: 30,
            breakeven_trigger_r: Some(dec!(1)),
            trail_start_r: Some(dec!(1)),
            tp_r_multiple: None,
            min_move_points: dec!(2),
            min_clearance_points: dec!(3),
        },
        sizing: SizingConfig {
            mode: SizingMode::FixedLots,
            fixed_lots: dec!(0.1),
            risk_percent: dec!(0.01),
            static_base_balance: dec!(10000),
        },
        entry: EntryConfig {
            limit_offset: dec!(0.5),
            max_open: 1,
            cooldown: Duration::seconds(120),
            pending_ttl: Duration::minutes(3),
        },
        max_hold: None,
    }
}

/// Settings for a second engine with its own name and magic.
pub fn named(name: &str, magic: u64) -> EngineSettings {
    EngineSettings {
        name: name.into(),
        magic: EngineId::new(magic),
        ..settings()
    }
}
