//! Reconciliation with the venue: fills, closes and P&L.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use super::{Engine, TickContext};
use crate::domain::{FillQuality, Position};
use crate::port::VenuePosition;

/// Close reason recorded when a position disappears without our own close.
pub const EXTERNAL_CLOSE: &str = "external";

impl Engine {
    /// Reconcile local state with the venue's open positions.
    ///
    /// A position the venue lists but we do not track is a fill: it takes
    /// mode and fill quality from the pending record with the same ticket,
    /// clears the cluster window and restarts the cooldown. A tracked
    /// position the venue no longer lists has closed. Tracked positions keep
    /// their local stop, initial stop, mode and breakeven latch.
    pub async fn sync(&mut self, ctx: &TickContext<'_>, now: DateTime<Utc>) {
        match ctx.venue.list_open_positions(self.settings.magic).await {
            Ok(live) => self.reconcile(live, now),
            Err(e) => warn!(
                engine = %self.settings.name,
                error = %e,
                "Failed to list open positions"
            ),
        }

        match ctx
            .venue
            .realized_pnl_since(self.settings.magic, ctx.day_start)
            .await
        {
            Ok(pnl) => self.realized_today = pnl,
            Err(e) => warn!(
                engine = %self.settings.name,
                error = %e,
                "Failed to read realized P&L"
            ),
        }
    }

    fn reconcile(&mut self, live: Vec<VenuePosition>, now: DateTime<Utc>) {
        let mut live: HashMap<_, _> = live.into_iter().map(|p| (p.ticket, p)).collect();

        let closed: Vec<_> = self
            .positions
            .keys()
            .filter(|ticket| !live.contains_key(ticket))
            .copied()
            .collect();
        for ticket in closed {
            let Some(position) = self.positions.remove(&ticket) else {
                continue;
            };
            let reason = self
                .close_reasons
                .remove(&ticket)
                .unwrap_or_else(|| EXTERNAL_CLOSE.to_string());
            info!(
                engine = %self.settings.name,
                magic = %self.settings.magic,
                ticket = %ticket,
                side = %position.side(),
                entry = %position.entry_price(),
                stop = %position.current_stop(),
                last_pnl = %position.unrealized(),
                reason = %reason,
                "Position closed"
            );
        }

        for (ticket, position) in &mut self.positions {
            if let Some(report) = live.remove(ticket) {
                position.refresh(report.volume, report.target, report.profit);
            }
        }

        let mut filled = false;
        for (ticket, report) in live {
            let pending = self.pending.remove(&ticket);
            let initial_stop = report
                .stop
                .or(pending.as_ref().map(|order| order.stop))
                .unwrap_or(report.entry_price);

            let mut position = Position::new(
                ticket,
                report.side,
                report.volume,
                report.entry_time,
                report.entry_price,
                initial_stop,
                report.target,
                pending.as_ref().map(|order| order.mode),
            );
            position.set_unrealized(report.profit);

            if let Some(order) = &pending {
                let quality = FillQuality::measure(
                    order.side,
                    report.entry_price,
                    order.reference_market_price,
                    order.requested_price,
                );
                position = position.with_fill_quality(quality);
                info!(
                    engine = %self.settings.name,
                    magic = %self.settings.magic,
                    ticket = %ticket,
                    side = %report.side,
                    mode = %order.mode,
                    entry = %report.entry_price,
                    requested = %order.requested_price,
                    vs_reference = %quality.vs_reference,
                    vs_requested = %quality.vs_requested,
                    "Pending order filled"
                );
            } else {
                info!(
                    engine = %self.settings.name,
                    magic = %self.settings.magic,
                    ticket = %ticket,
                    side = %report.side,
                    entry = %report.entry_price,
                    "Adopted untracked position"
                );
            }

            self.positions.insert(ticket, position);
            filled = true;
        }

        if filled {
            self.detector.reset();
            self.start_cooldown(now);
        }
    }
}
