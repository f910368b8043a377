//! Handler for `check config`.

use std::path::Path;

use crate::adapter::inbound::cli::output;
use crate::error::Result;
use crate::infrastructure::config::settings::Config;

/// Validate a configuration file without starting the bot.
///
/// # Errors
///
/// Returns the load or validation error of the file.
pub fn execute_config<P: AsRef<Path>>(config_path: P) -> Result<()> {
    let path = config_path.as_ref();
    let config = Config::load(path)?;

    output::section("Configuration Check");
    output::field("Config", path.display());
    output::success("Configuration file is valid");

    output::section("Summary");
    output::field("Bot", &config.bot_name);
    output::field("Symbol", output::highlight(&config.symbol));
    output::field("Dry run", config.dry_run);
    output::field("Feed", config.feed.url());
    output::field("Bridge", &config.venue.bridge.base_url);
    output::field(
        "Session",
        config.session.window.as_deref().unwrap_or("always open"),
    );
    output::field("Lookback", format!("{}s", config.feed_lookback().num_seconds()));

    for warning in readiness_warnings(&config) {
        output::warning(&warning);
    }

    output::section("Engines");
    for engine in config.enabled_engines() {
        output::field(
            &engine.name,
            format!(
                "magic {} | T={}s K={} | {:?} | {:?} | max_open {}",
                engine.magic,
                engine.t_seconds,
                engine.k_unique,
                engine.direction_mode,
                engine.stop_mode,
                engine.max_open,
            ),
        );
    }
    let disabled = config.engines.iter().filter(|engine| !engine.enabled).count();
    if disabled > 0 {
        output::field("Disabled", output::muted(disabled));
    }

    output::section("Risk");
    if config.risk.enabled {
        output::field("Total limit", limit_display(config.risk.total_limit));
        output::field("Engine limit", limit_display(config.risk.per_engine_limit));
        output::field("Day zone", &config.risk.day_tz);
    } else {
        output::warning("Daily loss limits are disabled");
    }

    output::success("Configuration check complete");
    Ok(())
}

/// Problems that do not fail validation but would stop or weaken a run.
fn readiness_warnings(config: &Config) -> Vec<String> {
    let mut warnings = Vec::new();

    if config.feed_token.is_none() {
        warnings.push(format!(
            "Feed token not set (export {} before running)",
            config.feed.token_env
        ));
    }
    if let Some(name) = &config.venue.bridge.token_env {
        if config.bridge_token.is_none() {
            warnings.push(format!("Bridge token variable {name} is not set"));
        }
    }
    if let Some(path) = &config.session.no_trade_zones {
        if !path.exists() {
            warnings.push(format!(
                "No-trade zones file {} does not exist yet",
                path.display()
            ));
        }
    }
    if !config.snapshot.enabled {
        warnings.push("Snapshot file disabled; external monitors see no state".to_string());
    }

    warnings
}

fn limit_display(limit: Option<rust_decimal::Decimal>) -> String {
    limit.map_or_else(|| "off".to_string(), |value| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const MINIMAL: &str = r#"
symbol = "XAUUSD"

[feed]
groups = ["retail"]
token_env = "CLUSTER_HYBRID_TEST_UNSET_TOKEN"

[venue.bridge]
base_url = "http://127.0.0.1:8800"

[session]
no_trade_zones = "/nonexistent/zones.json"

[[engines]]
name = "alpha"
magic = 7001
t_seconds = 10
k_unique = 3
hold_minutes = 30
use_time_exit = true
sl_distance = 3.0
tp_r_multiple = 2.0
use_tp_exit = false
stop_mode = "chandelier"
atr_period = 14
atr_init_mult = 1.5
atr_trail_mult = 2.0
limit_offset = 0.5
max_open = 1
sizing_mode = "fixed_lots"
risk_percent = 0.01
fixed_lots = 0.1
static_risk_base_balance = 10000
"#;

    #[test]
    fn warns_about_missing_token_and_zones_file() {
        let config = Config::parse_toml(MINIMAL).unwrap();
        let warnings = readiness_warnings(&config);
        assert!(warnings.iter().any(|w| w.contains("CLUSTER_HYBRID_TEST_UNSET_TOKEN")));
        assert!(warnings.iter().any(|w| w.contains("zones.json")));
    }

    #[test]
    fn limits_display_off_when_unset() {
        assert_eq!(limit_display(None), "off");
        assert_eq!(limit_display(Some(dec!(500))), "500");
    }
}
