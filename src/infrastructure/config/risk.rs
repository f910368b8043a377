//! Daily loss limit configuration.

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::application::risk::RiskLimits;

/// Daily loss circuit breaker configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RiskConfig {
    /// Master switch for both limits.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Loss across all engines that halts the bot, in account currency.
    #[serde(default = "default_total_limit")]
    pub total_limit: Option<Decimal>,
    /// Loss of any single engine that halts the bot.
    #[serde(default = "default_per_engine_limit")]
    pub per_engine_limit: Option<Decimal>,
    /// Zone whose local midnight starts the trading day.
    #[serde(default = "default_day_tz")]
    pub day_tz: String,
}

const fn default_enabled() -> bool {
    true
}

fn default_total_limit() -> Option<Decimal> {
    Some(Decimal::from(1000))
}

fn default_per_engine_limit() -> Option<Decimal> {
    Some(Decimal::from(500))
}

fn default_day_tz() -> String {
    "Europe/London".into()
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            total_limit: default_total_limit(),
            per_engine_limit: default_per_engine_limit(),
            day_tz: default_day_tz(),
        }
    }
}

impl From<RiskConfig> for RiskLimits {
    fn from(config: RiskConfig) -> Self {
        if !config.enabled {
            return Self {
                total: None,
                per_engine: None,
            };
        }
        Self {
            total: config.total_limit,
            per_engine: config.per_engine_limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn defaults_match_limits_default() {
        let limits = RiskLimits::from(RiskConfig::default());
        assert_eq!(limits, RiskLimits::default());
    }

    #[test]
    fn disabled_clears_both_limits() {
        let config: RiskConfig = toml::from_str("enabled = false\ntotal_limit = 250").unwrap();
        let limits = RiskLimits::from(config);
        assert_eq!(limits.total, None);
        assert_eq!(limits.per_engine, None);
    }

    #[test]
    fn overrides_are_read() {
        let config: RiskConfig = toml::from_str("total_limit = 250\nper_engine_limit = 100").unwrap();
        let limits = RiskLimits::from(config);
        assert_eq!(limits.total, Some(dec!(250)));
        assert_eq!(limits.per_engine, Some(dec!(100)));
    }
}
