//! Main polling loop.
//!
//! One task owns every engine and awaits each external call in turn. A tick
//! runs these steps in order:
//!
//! 0. reconcile every engine with the venue and manage pending orders
//! 1. equity heartbeat
//! 2. no-trade zone check (flatten once on entry, skip the rest of the tick)
//! 3. risk supervisor (a breach flattens everything and halts)
//! 4. feed fetch and intake
//! 5. entries for every engine
//! 6. trailing, breakeven and time exits for every engine
//! 7. snapshot
//!
//! Shutdown is observed between ticks only.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::watch;
use tokio::time::{sleep, MissedTickBehavior};
use tracing::{error, info, warn};

use crate::application::dedup::SeenOrders;
use crate::application::engine::{Engine, FlattenReport, TickContext};
use crate::application::intake::Intake;
use crate::application::risk::{RiskSupervisor, RiskVerdict};
use crate::application::snapshot::Snapshot;
use crate::domain::{Instrument, PositionEvent};
use crate::error::{Result, RiskError};
use crate::infrastructure::config::settings::Config;
use crate::port::{EventFeed, ExecutionVenue, MarketData, SessionCalendar, SnapshotSink};

/// Outbound collaborators of the runtime.
#[derive(Clone)]
pub struct Adapters {
    pub feed: Arc<dyn EventFeed>,
    pub venue: Arc<dyn ExecutionVenue>,
    pub market: Arc<dyn MarketData>,
    pub calendar: Arc<dyn SessionCalendar>,
    pub snapshot: Option<Arc<dyn SnapshotSink>>,
}

/// Loop parameters.
#[derive(Debug, Clone)]
pub struct RuntimeSettings {
    pub bot_name: String,
    pub dry_run: bool,
    pub poll_interval: StdDuration,
    pub error_pause: StdDuration,
    pub heartbeat: Option<Duration>,
    pub lookback: Duration,
}

impl RuntimeSettings {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            bot_name: config.bot_name.clone(),
            dry_run: config.dry_run,
            poll_interval: config.timing.poll_interval(),
            error_pause: config.timing.error_pause(),
            heartbeat: config.timing.heartbeat(),
            lookback: config.feed_lookback(),
        }
    }
}

/// Result of one tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    Continue,
    /// Inside a no-trade zone; only reconciliation ran.
    Blocked(String),
    Halted(RiskError),
}

/// How the loop ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Shutdown requested.
    Stopped,
    /// The daily loss breaker tripped; a manual restart is required.
    Halted(RiskError),
}

pub struct Runtime {
    settings: RuntimeSettings,
    adapters: Adapters,
    instrument: Instrument,
    intake: Intake,
    seen: SeenOrders,
    engines: Vec<Engine>,
    supervisor: RiskSupervisor,
    active_zone: Option<String>,
    last_heartbeat: Option<DateTime<Utc>>,
}

impl Runtime {
    #[must_use]
    pub fn new(
        settings: RuntimeSettings,
        adapters: Adapters,
        instrument: Instrument,
        intake: Intake,
        seen: SeenOrders,
        engines: Vec<Engine>,
        supervisor: RiskSupervisor,
    ) -> Self {
        Self {
            settings,
            adapters,
            instrument,
            intake,
            seen,
            engines,
            supervisor,
            active_zone: None,
            last_heartbeat: None,
        }
    }

    #[must_use]
    pub fn engines(&self) -> &[Engine] {
        &self.engines
    }

    #[must_use]
    pub const fn seen(&self) -> &SeenOrders {
        &self.seen
    }

    #[must_use]
    pub fn active_zone(&self) -> Option<&str> {
        self.active_zone.as_deref()
    }

    /// Run ticks until shutdown is signalled or the breaker trips.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> RunOutcome {
        info!(
            bot = %self.settings.bot_name,
            symbol = %self.instrument.symbol,
            engines = self.engines.len(),
            dry_run = self.settings.dry_run,
            lookback_secs = self.settings.lookback.num_seconds(),
            "Main loop started"
        );
        self.supervisor.log_limits();

        let mut interval = tokio::time::interval(self.settings.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Shutdown signal received");
                        self.write_snapshot(Utc::now(), None);
                        return RunOutcome::Stopped;
                    }
                }
                _ = interval.tick() => {
                    match self.tick(Utc::now()).await {
                        Ok(TickOutcome::Halted(reason)) => return RunOutcome::Halted(reason),
                        Ok(TickOutcome::Continue | TickOutcome::Blocked(_)) => {}
                        Err(e) => {
                            error!(error = %e, "Tick failed, pausing");
                            sleep(self.settings.error_pause).await;
                        }
                    }
                }
            }
        }
    }

    /// Run one tick at `now`.
    ///
    /// A feed failure skips entries but still manages open positions; the
    /// error is returned afterwards.
    pub async fn tick(&mut self, now: DateTime<Utc>) -> Result<TickOutcome> {
        let adapters = self.adapters.clone();
        adapters.calendar.refresh();
        let ctx = TickContext {
            venue: adapters.venue.as_ref(),
            market: adapters.market.as_ref(),
            calendar: adapters.calendar.as_ref(),
            instrument: &self.instrument,
            day_start: self.supervisor.day_start(now),
        };

        for engine in &mut self.engines {
            engine.sync(&ctx, now).await;
            engine.manage_pending(&ctx, now).await;
        }

        Self::heartbeat(&self.settings, &mut self.last_heartbeat, &self.engines, &ctx, now).await;

        if let Some(reason) = ctx.calendar.active_block_reason(now) {
            if self.active_zone.is_none() {
                warn!(reason = %reason, "Entered no-trade zone, flattening all exposure");
                Self::flatten_engines(&mut self.engines, &ctx, now, &reason).await;
                self.active_zone = Some(reason.clone());
            }
            self.write_snapshot(now, None);
            return Ok(TickOutcome::Blocked(reason));
        }
        if let Some(reason) = self.active_zone.take() {
            info!(reason = %reason, "Left no-trade zone");
        }

        if let RiskVerdict::Breach(reason) = self.supervisor.evaluate(&self.engines) {
            error!(reason = %reason, "Daily loss limit breached, flattening and halting");
            let report = Self::flatten_engines(&mut self.engines, &ctx, now, "risk_breach").await;
            if report.failed > 0 {
                error!(failed = report.failed, "Some orders or positions could not be flattened");
            }
            self.write_snapshot(now, Some(reason.to_string()));
            return Ok(TickOutcome::Halted(reason));
        }

        let events: Result<Vec<PositionEvent>> = adapters
            .feed
            .fetch(self.settings.lookback)
            .await
            .map(|raws| self.intake.build(&raws, &mut self.seen, now));

        if let Ok(events) = &events {
            for engine in &mut self.engines {
                engine.entry(&ctx, events, now).await;
            }
        }

        for engine in &mut self.engines {
            engine.manage_stops(&ctx, now).await;
            engine.manage_time_exits(&ctx, now).await;
        }

        self.write_snapshot(now, None);

        events.map(|_| TickOutcome::Continue)
    }

    async fn flatten_engines(
        engines: &mut [Engine],
        ctx: &TickContext<'_>,
        now: DateTime<Utc>,
        reason: &str,
    ) -> FlattenReport {
        let mut report = FlattenReport::default();
        for engine in engines.iter_mut() {
            report = report.merge(&engine.flatten(ctx, reason).await);
            engine.sync(ctx, now).await;
        }
        info!(
            reason = %reason,
            cancelled = report.cancelled,
            closed = report.closed,
            failed = report.failed,
            "Flattened all engines"
        );
        report
    }

    async fn heartbeat(
        settings: &RuntimeSettings,
        last: &mut Option<DateTime<Utc>>,
        engines: &[Engine],
        ctx: &TickContext<'_>,
        now: DateTime<Utc>,
    ) {
        let Some(every) = settings.heartbeat else {
            return;
        };
        if last.is_some_and(|at| now - at < every) {
            return;
        }
        *last = Some(now);

        match ctx.venue.account_equity().await {
            Ok(equity) => info!(equity = %equity, "Equity heartbeat"),
            Err(e) => warn!(error = %e, "Equity heartbeat: equity unavailable"),
        }
        for engine in engines {
            info!(
                engine = %engine.name(),
                magic = %engine.magic(),
                realized = %engine.realized_today(),
                unrealized = %engine.unrealized(),
                open = engine.positions().count(),
                pending = engine.pending_orders().count(),
                "Engine heartbeat"
            );
        }
    }

    fn write_snapshot(&self, now: DateTime<Utc>, halted: Option<String>) {
        let Some(sink) = &self.adapters.snapshot else {
            return;
        };
        let mut snapshot = Snapshot::capture(
            &self.settings.bot_name,
            &self.instrument.symbol,
            self.settings.dry_run,
            &self.engines,
            now,
        );
        if let Some(reason) = halted {
            snapshot = snapshot.halted(reason);
        }
        if let Err(e) = sink.write(&snapshot) {
            warn!(error = %e, "Failed to write snapshot");
        }
    }
}
