//! Main loop timing.

use std::time::Duration;

use serde::Deserialize;

use super::engine::secs;

/// Main loop timing configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct TimingConfig {
    /// Pause between ticks in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Pause after a tick fails, in milliseconds.
    #[serde(default = "default_error_pause_ms")]
    pub error_pause_ms: u64,
    /// Equity heartbeat interval in seconds; 0 disables it.
    #[serde(default = "default_heartbeat_secs")]
    pub heartbeat_secs: u64,
    /// Age after which a seen order id is forgotten, in hours.
    #[serde(default = "default_seen_max_age_hours")]
    pub seen_max_age_hours: u64,
    /// Lower bound of the feed lookback in seconds. The lookback is the
    /// largest engine window or this, whichever is longer.
    #[serde(default = "default_min_lookback_secs")]
    pub min_lookback_secs: u64,
}

const fn default_poll_interval_ms() -> u64 {
    1000
}

const fn default_error_pause_ms() -> u64 {
    2000
}

const fn default_heartbeat_secs() -> u64 {
    600
}

const fn default_seen_max_age_hours() -> u64 {
    24
}

const fn default_min_lookback_secs() -> u64 {
    60
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            error_pause_ms: default_error_pause_ms(),
            heartbeat_secs: default_heartbeat_secs(),
            seen_max_age_hours: default_seen_max_age_hours(),
            min_lookback_secs: default_min_lookback_secs(),
        }
    }
}

impl TimingConfig {
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    #[must_use]
    pub const fn error_pause(&self) -> Duration {
        Duration::from_millis(self.error_pause_ms)
    }

    /// `None` when the heartbeat is disabled.
    #[must_use]
    pub fn heartbeat(&self) -> Option<chrono::Duration> {
        (self.heartbeat_secs > 0).then(|| secs(self.heartbeat_secs))
    }

    #[must_use]
    pub fn seen_max_age(&self) -> chrono::Duration {
        secs(self.seen_max_age_hours.saturating_mul(3600))
    }
}
