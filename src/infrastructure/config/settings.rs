//! Process configuration for `cluster-hybrid`.
//!
//! [`Config`] is read from a TOML file with one `[[engines]]` table per engine;
//! secrets (feed and bridge tokens) come from the environment.
//!
//! # Example
//!
//! ```no_run
//! use cluster_hybrid::infrastructure::config::settings::Config;
//!
//! # fn demo() -> cluster_hybrid::error::Result<()> {
//! let config = Config::load("config.toml")?;
//! let _log = config.init_logging();
//! for engine in config.enabled_engines() {
//!     println!("{} -> magic {}", engine.name, engine.magic);
//! }
//! # Ok(())
//! # }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Duration;
use chrono_tz::Tz;
use rust_decimal::Decimal;
use serde::Deserialize;
use url::Url;

use super::engine::{secs, EngineConfig};
use super::logging::{LogHandle, LoggingConfig};
use super::risk::RiskConfig;
use super::session::SessionConfig;
use super::timing::TimingConfig;
use crate::adapter::outbound::bridge::BridgeConfig;
use crate::adapter::outbound::calendar::SessionWindow;
use crate::adapter::outbound::paper::PaperConfig;
use crate::adapter::outbound::sirix::SirixConfig;
use crate::application::engine::EngineSettings;
use crate::error::{ConfigError, Result};

/// Execution venue configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct VenueConfig {
    /// Broker bridge; also the market data source in dry-run mode.
    pub bridge: BridgeConfig,
    /// Paper account used instead of the bridge for orders in dry-run mode.
    #[serde(default)]
    pub paper: PaperConfig,
}

/// Monitoring snapshot configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotConfig {
    #[serde(default = "default_snapshot_enabled")]
    pub enabled: bool,
    #[serde(default = "default_snapshot_path")]
    pub path: PathBuf,
}

const fn default_snapshot_enabled() -> bool {
    true
}

fn default_snapshot_path() -> PathBuf {
    PathBuf::from("bot_state.json")
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            enabled: default_snapshot_enabled(),
            path: default_snapshot_path(),
        }
    }
}

/// Everything one process needs: symbol, engines, session, risk and adapters.
///
/// Load from a TOML file using [`Config::load`] or parse directly with
/// [`Config::parse_toml`].
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Name reported in logs and the snapshot.
    #[serde(default = "default_bot_name")]
    pub bot_name: String,

    /// Traded instrument, as named by both the feed and the venue.
    pub symbol: String,

    /// Route orders to the in-memory paper venue.
    #[serde(default)]
    pub dry_run: bool,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub timing: TimingConfig,

    /// Participant trade feed.
    pub feed: SirixConfig,

    pub venue: VenueConfig,

    #[serde(default)]
    pub session: SessionConfig,

    /// Daily loss limits.
    #[serde(default)]
    pub risk: RiskConfig,

    #[serde(default)]
    pub snapshot: SnapshotConfig,

    #[serde(default)]
    pub engines: Vec<EngineConfig>,

    /// Feed bearer token, read from `feed.token_env`.
    #[serde(skip)]
    pub feed_token: Option<String>,

    /// Bridge bearer token, read from `venue.bridge.token_env`.
    #[serde(skip)]
    pub bridge_token: Option<String>,
}

fn default_bot_name() -> String {
    "cluster-hybrid".to_string()
}

fn parse_tz(field: &'static str, value: &str) -> Result<Tz> {
    value.parse::<Tz>().map_err(|e| {
        ConfigError::InvalidValue {
            field,
            reason: e.to_string(),
        }
        .into()
    })
}

fn check_url(field: &'static str, value: &str) -> Result<()> {
    Url::parse(value).map(|_| ()).map_err(|e| {
        ConfigError::InvalidValue {
            field,
            reason: e.to_string(),
        }
        .into()
    })
}

impl Config {
    /// Parse and validate TOML text, resolving env-provided secrets.
    ///
    /// Tokens are read from the environment variables the file names, never
    /// from the file itself.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML content is malformed or validation fails.
    #[allow(clippy::result_large_err)]
    pub fn parse_toml(content: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;

        config.feed_token = std::env::var(&config.feed.token_env)
            .ok()
            .filter(|token| !token.is_empty());
        config.bridge_token = config
            .venue
            .bridge
            .token_env
            .as_ref()
            .and_then(|name| std::env::var(name).ok())
            .filter(|token| !token.is_empty());

        config.validate()?;

        Ok(config)
    }

    /// Read `path` and parse it with [`Self::parse_toml`].
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, the TOML content is
    /// malformed or validation fails.
    #[allow(clippy::result_large_err)]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_toml(&content)
    }

    /// Cross-field checks that serde defaults cannot express.
    #[allow(clippy::result_large_err)]
    fn validate(&self) -> Result<()> {
        if self.symbol.trim().is_empty() {
            return Err(ConfigError::MissingField { field: "symbol" }.into());
        }

        if self.feed.groups.is_empty() {
            return Err(ConfigError::MissingField {
                field: "feed.groups",
            }
            .into());
        }
        check_url("feed.base_url", &self.feed.base_url)?;
        check_url("venue.bridge.base_url", &self.venue.bridge.base_url)?;

        parse_tz("feed.source_tz", &self.feed.source_tz)?;
        parse_tz("session.tz", &self.session.tz)?;
        parse_tz("risk.day_tz", &self.risk.day_tz)?;
        self.session_window()?;

        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            return Err(ConfigError::InvalidValue {
                field: "logging.format",
                reason: "must be 'pretty' or 'json'".to_string(),
            }
            .into());
        }

        if self.timing.poll_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "poll_interval_ms",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.timing.seen_max_age_hours == 0 {
            return Err(ConfigError::InvalidValue {
                field: "seen_max_age_hours",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }

        for (field, limit) in [
            ("total_limit", self.risk.total_limit),
            ("per_engine_limit", self.risk.per_engine_limit),
        ] {
            if limit.is_some_and(|limit| limit <= Decimal::ZERO) {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: "must be greater than 0".to_string(),
                }
                .into());
            }
        }

        if self.venue.paper.balance <= Decimal::ZERO {
            return Err(ConfigError::InvalidValue {
                field: "venue.paper.balance",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }

        let enabled: Vec<&EngineConfig> = self.enabled_engines().collect();
        if enabled.is_empty() {
            return Err(ConfigError::MissingField { field: "engines" }.into());
        }
        for (i, engine) in enabled.iter().enumerate() {
            engine.validate()?;
            if enabled[..i].iter().any(|other| other.magic == engine.magic) {
                return Err(ConfigError::InvalidValue {
                    field: "magic",
                    reason: format!("magic {} is used by more than one engine", engine.magic),
                }
                .into());
            }
            if enabled[..i].iter().any(|other| other.name == engine.name) {
                return Err(ConfigError::InvalidValue {
                    field: "name",
                    reason: format!("engine name '{}' is not unique", engine.name),
                }
                .into());
            }
        }

        Ok(())
    }

    pub fn enabled_engines(&self) -> impl Iterator<Item = &EngineConfig> {
        self.engines.iter().filter(|engine| engine.enabled)
    }

    /// Settings of every enabled engine, in file order.
    #[must_use]
    pub fn engine_settings(&self) -> Vec<EngineSettings> {
        self.enabled_engines().map(EngineSettings::from).collect()
    }

    /// Zone of naive feed timestamps.
    #[allow(clippy::result_large_err)]
    pub fn source_tz(&self) -> Result<Tz> {
        parse_tz("feed.source_tz", &self.feed.source_tz)
    }

    #[allow(clippy::result_large_err)]
    pub fn session_tz(&self) -> Result<Tz> {
        parse_tz("session.tz", &self.session.tz)
    }

    #[allow(clippy::result_large_err)]
    pub fn day_tz(&self) -> Result<Tz> {
        parse_tz("risk.day_tz", &self.risk.day_tz)
    }

    #[allow(clippy::result_large_err)]
    pub fn session_window(&self) -> Result<Option<SessionWindow>> {
        self.session
            .window
            .as_deref()
            .map(|window| {
                window.parse::<SessionWindow>().map_err(|e| {
                    ConfigError::InvalidValue {
                        field: "session.window",
                        reason: e.to_string(),
                    }
                    .into()
                })
            })
            .transpose()
    }

    /// Feed lookback: the longest enabled engine window, at least
    /// `timing.min_lookback_secs`.
    #[must_use]
    pub fn feed_lookback(&self) -> Duration {
        let longest = self
            .enabled_engines()
            .map(|engine| engine.t_seconds)
            .max()
            .unwrap_or(0);
        secs(longest.max(self.timing.min_lookback_secs))
    }

    /// Initialize logging based on configuration.
    pub fn init_logging(&self) -> LogHandle {
        self.logging.init()
    }
}
