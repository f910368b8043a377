//! Monitoring snapshot of engine state.
//!
//! Built once per tick from the engines and handed to a
//! [`SnapshotSink`](crate::port::SnapshotSink). The model is read-only: nothing
//! in the running bot consumes it back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::application::cluster::ClusterSummary;
use crate::application::direction::DirectionMode;
use crate::application::engine::{Engine, StopMode};
use crate::domain::{EngineId, PendingOrder, Pnl, Position, Price};

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: &str = "1";

/// Number of most recent window events included per engine.
pub const RECENT_EVENTS: usize = 10;

/// Top-level snapshot document.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub version: String,
    pub bot: String,
    pub symbol: String,
    pub dry_run: bool,
    pub updated_at: DateTime<Utc>,
    /// Set once the risk supervisor has halted the bot.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub halted: Option<String>,
    pub engines: Vec<EngineSnapshot>,
}

/// Static parameters of one engine, for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfigSummary {
    pub window_secs: i64,
    pub threshold: usize,
    pub direction: DirectionMode,
    pub stop_mode: StopMode,
    pub limit_offset: Price,
    pub max_open: usize,
    pub cooldown_secs: i64,
    pub pending_ttl_secs: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_hold_minutes: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EngineSnapshot {
    pub name: String,
    pub magic: EngineId,
    pub config: EngineConfigSummary,
    pub cluster: ClusterSummary,
    pub positions: Vec<Position>,
    pub pending_orders: Vec<PendingOrder>,
    pub cooldown_until: Option<DateTime<Utc>>,
    pub in_cooldown: bool,
    pub realized_today: Pnl,
    pub unrealized: Pnl,
}

impl EngineSnapshot {
    #[must_use]
    pub fn capture(engine: &Engine, now: DateTime<Utc>) -> Self {
        let settings = engine.settings();
        Self {
            name: settings.name.clone(),
            magic: settings.magic,
            config: EngineConfigSummary {
                window_secs: settings.window.num_seconds(),
                threshold: settings.threshold,
                direction: settings.direction.mode,
                stop_mode: settings.stops.mode,
                limit_offset: settings.entry.limit_offset,
                max_open: settings.entry.max_open,
                cooldown_secs: settings.entry.cooldown.num_seconds(),
                pending_ttl_secs: settings.entry.pending_ttl.num_seconds(),
                max_hold_minutes: settings.max_hold.map(|d| d.num_minutes()),
            },
            cluster: engine.detector().summary(RECENT_EVENTS),
            positions: engine.positions().cloned().collect(),
            pending_orders: engine.pending_orders().cloned().collect(),
            cooldown_until: engine.cooldown_until(),
            in_cooldown: engine.in_cooldown(now),
            realized_today: engine.realized_today(),
            unrealized: engine.unrealized(),
        }
    }
}

impl Snapshot {
    #[must_use]
    pub fn capture(
        bot: &str,
        symbol: &str,
        dry_run: bool,
        engines: &[Engine],
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            version: SNAPSHOT_VERSION.to_string(),
            bot: bot.to_string(),
            symbol: symbol.to_string(),
            dry_run,
            updated_at: now,
            halted: None,
            engines: engines
                .iter()
                .map(|engine| EngineSnapshot::capture(engine, now))
                .collect(),
        }
    }

    #[must_use]
    pub fn halted(mut self, reason: impl Into<String>) -> Self {
        self.halted = Some(reason.into());
        self
    }
}
