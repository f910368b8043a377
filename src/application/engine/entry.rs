//! Entry gating and limit order placement.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use super::stops::enforce_stop_level;
use super::{Engine, TickContext};
use crate::application::direction::{self, Decision, DirectionMode, Indicators};
use crate::application::indicator;
use crate::application::sizing;
use crate::domain::{
    LimitOrderRequest, PendingOrder, PositionEvent, Quote, Side, Ticket,
};

/// Why an entry was not attempted this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryBlock {
    Capacity,
    PendingOrder,
    Cooldown,
    Session,
}

impl Engine {
    /// Run the entry gates and, on a cluster, place a pending limit order.
    ///
    /// Gates run in order: capacity, single pending order, cooldown,
    /// session calendar, cluster detector. Events arriving while a gate is
    /// closed still pass through the window. Returns the new ticket when an
    /// order was placed.
    pub async fn entry(
        &mut self,
        ctx: &TickContext<'_>,
        events: &[PositionEvent],
        now: DateTime<Utc>,
    ) -> Option<Ticket> {
        if let Some(block) = self.entry_block(ctx, now) {
            debug!(engine = %self.settings.name, ?block, "Entry gated");
            self.detector.observe(events);
            return None;
        }

        let cluster = self.detector.ingest(events)?;
        let decision = self.decide_direction(ctx, cluster, now).await;
        info!(
            engine = %self.settings.name,
            magic = %self.settings.magic,
            cluster = %cluster,
            side = %decision.side,
            mode = %decision.mode,
            "Direction decided"
        );

        self.place_entry(ctx, decision, now).await
    }

    fn entry_block(&mut self, ctx: &TickContext<'_>, now: DateTime<Utc>) -> Option<EntryBlock> {
        if self.open_count() >= self.settings.entry.max_open {
            return Some(EntryBlock::Capacity);
        }
        if !self.pending.is_empty() {
            return Some(EntryBlock::PendingOrder);
        }
        if self.track_cooldown(now) {
            return Some(EntryBlock::Cooldown);
        }
        if !ctx.calendar.is_trading_allowed(now) {
            return Some(EntryBlock::Session);
        }
        None
    }

    /// Log cooldown start and end once each; returns whether it is active.
    fn track_cooldown(&mut self, now: DateTime<Utc>) -> bool {
        let active = self.in_cooldown(now);
        match (active, self.cooldown_logged) {
            (true, false) => info!(
                engine = %self.settings.name,
                until = ?self.cooldown_until,
                "Cooldown started"
            ),
            (false, true) => info!(engine = %self.settings.name, "Cooldown ended"),
            _ => {}
        }
        self.cooldown_logged = active;
        active
    }

    async fn decide_direction(
        &self,
        ctx: &TickContext<'_>,
        cluster: Side,
        now: DateTime<Utc>,
    ) -> Decision {
        let config = &self.settings.direction;
        if config.mode != DirectionMode::Hybrid {
            return direction::decide(cluster, config, None);
        }

        let readings = match ctx.market.recent_bars(config.bars_needed()).await {
            Ok(bars) => {
                let readings = Indicators::compute(&bars, config.rsi_period, now);
                if readings.is_none() {
                    warn!(
                        engine = %self.settings.name,
                        bars = bars.len(),
                        "Insufficient history for indicators, fading cluster"
                    );
                }
                readings
            }
            Err(e) => {
                warn!(
                    engine = %self.settings.name,
                    error = %e,
                    "Indicator fetch failed, fading cluster"
                );
                None
            }
        };

        if let Some(r) = &readings {
            debug!(
                engine = %self.settings.name,
                rsi = %r.rsi.round_dp(2),
                vwap = %r.vwap.round_dp(2),
                price = %r.price,
                "Hybrid indicators"
            );
        }
        direction::decide(cluster, config, readings.as_ref())
    }

    /// Quote for pricing the entry, falling back to the last bar close.
    async fn entry_quote(&self, ctx: &TickContext<'_>) -> Option<Quote> {
        match ctx.market.current_quote().await {
            Ok(Some(quote)) if quote.bid > Decimal::ZERO && quote.ask > Decimal::ZERO => {
                return Some(quote);
            }
            Ok(_) => warn!(engine = %self.settings.name, "No live quote, using last close"),
            Err(e) => warn!(
                engine = %self.settings.name,
                error = %e,
                "Quote fetch failed, using last close"
            ),
        }

        match ctx.market.recent_bars(1).await {
            Ok(bars) => bars.last().map(|bar| Quote::flat(bar.close)),
            Err(e) => {
                warn!(engine = %self.settings.name, error = %e, "Close fallback failed");
                None
            }
        }
    }

    async fn place_entry(
        &mut self,
        ctx: &TickContext<'_>,
        decision: Decision,
        now: DateTime<Utc>,
    ) -> Option<Ticket> {
        let Some(quote) = self.entry_quote(ctx).await else {
            warn!(engine = %self.settings.name, "No price available, skipping entry");
            return None;
        };

        let offset = self.settings.entry.limit_offset;
        let price = match decision.side {
            Side::Buy => ctx.instrument.round_price(quote.bid - offset),
            Side::Sell => ctx.instrument.round_price(quote.ask + offset),
        };

        let stops = &self.settings.stops;
        let atr = if stops.mode.uses_atr() {
            match ctx.market.recent_bars(stops.bars_needed()).await {
                Ok(bars) => indicator::atr(&bars, stops.atr_period),
                Err(e) => {
                    warn!(
                        engine = %self.settings.name,
                        error = %e,
                        "ATR fetch failed, using fixed stop distance"
                    );
                    None
                }
            }
        } else {
            None
        };

        let distance = stops.stop_distance(atr);
        let (stop, target) = stops.initial_levels(decision.side, price, distance);
        let (stop, target) = enforce_stop_level(ctx.instrument, decision.side, price, stop, target);

        let equity = if self.settings.sizing.needs_equity() {
            match ctx.venue.account_equity().await {
                Ok(equity) => Some(equity),
                Err(e) => {
                    warn!(engine = %self.settings.name, error = %e, "Equity unavailable");
                    None
                }
            }
        } else {
            None
        };
        let volume = sizing::position_volume(
            &self.settings.sizing,
            (price - stop).abs(),
            ctx.instrument,
            equity,
        );
        if volume <= Decimal::ZERO {
            warn!(engine = %self.settings.name, "Computed volume is zero, skipping entry");
            return None;
        }

        let tag: String = decision.mode.as_str().chars().take(3).collect();
        let request = LimitOrderRequest {
            side: decision.side,
            price,
            volume,
            stop,
            target,
            comment: self.order_comment(&tag),
        };

        match ctx.venue.place_pending(self.settings.magic, &request).await {
            Ok(ticket) => {
                info!(
                    engine = %self.settings.name,
                    magic = %self.settings.magic,
                    ticket = %ticket,
                    side = %decision.side,
                    mode = %decision.mode,
                    bid = %quote.bid,
                    ask = %quote.ask,
                    price = %price,
                    stop = %stop,
                    target = ?target,
                    volume = %volume,
                    "Pending entry placed"
                );
                self.pending.insert(
                    ticket,
                    PendingOrder {
                        ticket,
                        side: decision.side,
                        volume,
                        requested_price: price,
                        reference_market_price: quote.mid(),
                        stop,
                        target,
                        created_at: now,
                        mode: decision.mode,
                    },
                );
                self.start_cooldown(now);
                Some(ticket)
            }
            Err(e) => {
                warn!(
                    engine = %self.settings.name,
                    magic = %self.settings.magic,
                    side = %decision.side,
                    price = %price,
                    error = %e,
                    "Pending entry rejected"
                );
                None
            }
        }
    }
}
