//! Pending order housekeeping: vanished orders and TTL expiry.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use super::{Engine, TickContext};
use crate::error::{Error, VenueError};

impl Engine {
    /// Drop local records of orders the venue no longer lists, then cancel
    /// orders older than the pending TTL.
    ///
    /// A failed cancel keeps the record so the next tick retries it.
    pub async fn manage_pending(&mut self, ctx: &TickContext<'_>, now: DateTime<Utc>) {
        if self.pending.is_empty() {
            return;
        }

        let listed = match ctx.venue.list_pending_orders(self.settings.magic).await {
            Ok(orders) => orders,
            Err(e) => {
                warn!(
                    engine = %self.settings.name,
                    error = %e,
                    "Failed to list pending orders"
                );
                return;
            }
        };
        let live: HashSet<_> = listed.iter().map(|order| order.ticket).collect();

        self.pending.retain(|ticket, _| {
            let keep = live.contains(ticket);
            if !keep {
                info!(
                    engine = %self.settings.name,
                    ticket = %ticket,
                    "Pending order no longer at venue"
                );
            }
            keep
        });

        let ttl = self.settings.entry.pending_ttl;
        let expired: Vec<_> = self
            .pending
            .values()
            .filter(|order| order.age(now) >= ttl)
            .map(|order| order.ticket)
            .collect();

        for ticket in expired {
            match ctx.venue.cancel(ticket).await {
                Ok(()) | Err(Error::Venue(VenueError::NotFound(_))) => {
                    let age = self
                        .pending
                        .remove(&ticket)
                        .map(|order| order.age(now).num_seconds());
                    info!(
                        engine = %self.settings.name,
                        ticket = %ticket,
                        age_secs = ?age,
                        "Pending order expired and cancelled"
                    );
                }
                Err(e) => warn!(
                    engine = %self.settings.name,
                    ticket = %ticket,
                    error = %e,
                    "Failed to cancel expired pending order"
                ),
            }
        }
    }
}
