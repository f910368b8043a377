//! Time-based exits and full flatten.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use super::{Engine, TickContext};
use crate::domain::Ticket;

/// Close reason recorded for time exits.
pub const TIME_EXIT: &str = "time_exit";

/// Outcome of [`Engine::flatten`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlattenReport {
    pub cancelled: usize,
    pub closed: usize,
    pub failed: usize,
}

impl FlattenReport {
    /// Combine two reports.
    #[must_use]
    pub fn merge(self, other: &Self) -> Self {
        Self {
            cancelled: self.cancelled + other.cancelled,
            closed: self.closed + other.closed,
            failed: self.failed + other.failed,
        }
    }
}

impl Engine {
    /// Close every position held for at least the configured duration,
    /// whatever its P&L.
    pub async fn manage_time_exits(&mut self, ctx: &TickContext<'_>, now: DateTime<Utc>) {
        let Some(max_hold) = self.settings.max_hold else {
            return;
        };

        let due: Vec<_> = self
            .positions
            .values()
            .filter(|position| now - position.entry_time() >= max_hold)
            .map(|position| position.ticket())
            .filter(|ticket| !self.close_reasons.contains_key(ticket))
            .collect();

        for ticket in due {
            match ctx.venue.close(ticket).await {
                Ok(()) => {
                    self.close_reasons.insert(ticket, TIME_EXIT.to_string());
                    info!(
                        engine = %self.settings.name,
                        ticket = %ticket,
                        hold_mins = max_hold.num_minutes(),
                        "Time exit"
                    );
                }
                Err(e) => warn!(
                    engine = %self.settings.name,
                    ticket = %ticket,
                    error = %e,
                    "Time exit close failed"
                ),
            }
        }
    }

    /// Cancel every pending order and close every position of this engine,
    /// then clear the cluster window.
    ///
    /// Orders and positions are taken from both the local tables and the
    /// venue's listings, so untracked ones are flattened too.
    pub async fn flatten(&mut self, ctx: &TickContext<'_>, reason: &str) -> FlattenReport {
        let mut report = FlattenReport::default();
        let magic = self.settings.magic;

        let mut orders: BTreeSet<Ticket> = self.pending.keys().copied().collect();
        match ctx.venue.list_pending_orders(magic).await {
            Ok(listed) => orders.extend(listed.into_iter().map(|order| order.ticket)),
            Err(e) => warn!(engine = %self.settings.name, error = %e, "Flatten: order listing failed"),
        }
        for ticket in orders {
            match ctx.venue.cancel(ticket).await {
                Ok(()) => {
                    self.pending.remove(&ticket);
                    report.cancelled += 1;
                }
                Err(e) => {
                    warn!(engine = %self.settings.name, ticket = %ticket, error = %e, "Flatten: cancel failed");
                    report.failed += 1;
                }
            }
        }

        let mut positions: BTreeSet<Ticket> = self.positions.keys().copied().collect();
        match ctx.venue.list_open_positions(magic).await {
            Ok(listed) => positions.extend(listed.into_iter().map(|position| position.ticket)),
            Err(e) => warn!(engine = %self.settings.name, error = %e, "Flatten: position listing failed"),
        }
        for ticket in positions {
            match ctx.venue.close(ticket).await {
                Ok(()) => {
                    self.close_reasons.insert(ticket, reason.to_string());
                    report.closed += 1;
                }
                Err(e) => {
                    warn!(engine = %self.settings.name, ticket = %ticket, error = %e, "Flatten: close failed");
                    report.failed += 1;
                }
            }
        }

        self.detector.reset();
        info!(
            engine = %self.settings.name,
            magic = %magic,
            reason = %reason,
            cancelled = report.cancelled,
            closed = report.closed,
            failed = report.failed,
            "Engine flattened"
        );
        report
    }
}
