//! Trading session and no-trade zone configuration.

use std::path::PathBuf;

use serde::Deserialize;

/// Session calendar configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Zone of the session window and no-trade zone times.
    #[serde(default = "default_tz")]
    pub tz: String,
    /// Daily window as `HH:MM-HH:MM`; absent means always in session.
    #[serde(default)]
    pub window: Option<String>,
    /// JSON file of no-trade zones, reloaded every tick.
    #[serde(default)]
    pub no_trade_zones: Option<PathBuf>,
}

fn default_tz() -> String {
    "Europe/London".into()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tz: default_tz(),
            window: None,
            no_trade_zones: None,
        }
    }
}
