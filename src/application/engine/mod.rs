//! Per-engine order lifecycle.
//!
//! An [`Engine`] is one independently configured strategy instance. It owns
//! its cluster detector, at most one pending order, the table of open
//! positions keyed by ticket, and the cooldown that gates new entries.
//! Engines share no mutable state; the risk supervisor only reads them.
//!
//! Each tick the runtime drives every engine through the same steps:
//!
//! 1. [`Engine::sync`] - detect fills and closes, refresh P&L
//! 2. [`Engine::manage_pending`] - drop vanished orders, cancel expired ones
//! 3. [`Engine::entry`] - gates, cluster, direction, limit placement
//! 4. [`Engine::manage_stops`] - breakeven and trailing ratchet
//! 5. [`Engine::manage_time_exits`] - close positions held too long
//!
//! Every venue failure is logged with engine and ticket context and the
//! affected action is retried on the next tick.

mod entry;
mod exit;
mod pending;
pub mod stops;
mod sync;
mod trailing;

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;

use crate::application::cluster::ClusterDetector;
use crate::application::direction::DirectionConfig;
use crate::application::sizing::SizingConfig;
use crate::domain::{EngineId, Instrument, PendingOrder, Pnl, Position, Price, Ticket};
use crate::port::{ExecutionVenue, MarketData, SessionCalendar};

pub use exit::FlattenReport;
pub use stops::{StopConfig, StopMode};

/// Longest order comment the venue stores.
pub const MAX_COMMENT_LEN: usize = 20;

/// Entry placement parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryConfig {
    /// Distance of the limit price from the quote: below bid for buys,
    /// above ask for sells.
    pub limit_offset: Price,
    /// Cap on open positions plus pending orders.
    pub max_open: usize,
    pub cooldown: Duration,
    pub pending_ttl: Duration,
}

/// Full parameter set of one engine.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    pub name: String,
    pub magic: EngineId,
    pub window: Duration,
    pub threshold: usize,
    pub refractory: Duration,
    pub direction: DirectionConfig,
    pub stops: StopConfig,
    pub sizing: SizingConfig,
    pub entry: EntryConfig,
    /// Close positions after this long; `None` disables time exits.
    pub max_hold: Option<Duration>,
}

/// Collaborators an engine needs for one tick.
#[derive(Clone, Copy)]
pub struct TickContext<'a> {
    pub venue: &'a dyn ExecutionVenue,
    pub market: &'a dyn MarketData,
    pub calendar: &'a dyn SessionCalendar,
    pub instrument: &'a Instrument,
    /// Start of the current trading day in UTC, for realized P&L.
    pub day_start: DateTime<Utc>,
}

/// One strategy instance and its lifecycle state.
pub struct Engine {
    settings: EngineSettings,
    detector: ClusterDetector,
    pending: BTreeMap<Ticket, PendingOrder>,
    positions: BTreeMap<Ticket, Position>,
    cooldown_until: Option<DateTime<Utc>>,
    cooldown_logged: bool,
    close_reasons: HashMap<Ticket, String>,
    realized_today: Pnl,
}

impl Engine {
    #[must_use]
    pub fn new(settings: EngineSettings) -> Self {
        let detector =
            ClusterDetector::new(settings.window, settings.threshold, settings.refractory);
        Self {
            settings,
            detector,
            pending: BTreeMap::new(),
            positions: BTreeMap::new(),
            cooldown_until: None,
            cooldown_logged: false,
            close_reasons: HashMap::new(),
            realized_today: Decimal::ZERO,
        }
    }

    #[must_use]
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.settings.name
    }

    #[must_use]
    pub const fn magic(&self) -> EngineId {
        self.settings.magic
    }

    #[must_use]
    pub fn detector(&self) -> &ClusterDetector {
        &self.detector
    }

    pub fn pending_orders(&self) -> impl Iterator<Item = &PendingOrder> {
        self.pending.values()
    }

    pub fn positions(&self) -> impl Iterator<Item = &Position> {
        self.positions.values()
    }

    #[must_use]
    pub fn position(&self, ticket: Ticket) -> Option<&Position> {
        self.positions.get(&ticket)
    }

    #[must_use]
    pub const fn cooldown_until(&self) -> Option<DateTime<Utc>> {
        self.cooldown_until
    }

    #[must_use]
    pub fn in_cooldown(&self, now: DateTime<Utc>) -> bool {
        self.cooldown_until.is_some_and(|until| now < until)
    }

    /// Realized P&L since the start of the trading day, as of the last sync.
    #[must_use]
    pub const fn realized_today(&self) -> Pnl {
        self.realized_today
    }

    /// Floating P&L of open positions, as of the last sync.
    #[must_use]
    pub fn unrealized(&self) -> Pnl {
        self.positions.values().map(Position::unrealized).sum()
    }

    /// Realized plus unrealized P&L for the day.
    #[must_use]
    pub fn daily_pnl(&self) -> Pnl {
        self.realized_today + self.unrealized()
    }

    fn open_count(&self) -> usize {
        self.positions.len() + self.pending.len()
    }

    fn start_cooldown(&mut self, now: DateTime<Utc>) {
        self.cooldown_until = Some(now + self.settings.entry.cooldown);
    }

    fn order_comment(&self, tag: &str) -> String {
        format!("{}-{}", self.settings.name, tag)
            .chars()
            .take(MAX_COMMENT_LEN)
            .collect()
    }
}
