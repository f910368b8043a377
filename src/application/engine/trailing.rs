//! Breakeven promotion and the trailing stop ratchet.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use super::stops::{enforce_stop_level, stop_clears_price, TrailLevels};
use super::{Engine, TickContext};
use crate::application::indicator;
use crate::domain::{Position, Price, Ticket};

impl Engine {
    /// Move stops of open positions: breakeven first, then the trailing
    /// candidate. Runs only in trailing stop modes.
    ///
    /// Positions opened within the current bar are left alone. A stop is
    /// recorded locally only after the venue accepts it, and never moves
    /// against the position.
    pub async fn manage_stops(&mut self, ctx: &TickContext<'_>, _now: DateTime<Utc>) {
        let stops = &self.settings.stops;
        if !stops.mode.trails() || self.positions.is_empty() {
            return;
        }

        let bars = match ctx.market.recent_bars(stops.bars_needed()).await {
            Ok(bars) => bars,
            Err(e) => {
                warn!(engine = %self.settings.name, error = %e, "Failed to fetch bars for trailing");
                return;
            }
        };
        let Some(last) = bars.last() else {
            return;
        };
        let Some(atr) = indicator::atr(&bars, stops.atr_period) else {
            return;
        };
        let lookback = stops.chandelier_lookback;
        let levels = TrailLevels {
            atr,
            highest_high: indicator::highest_high(&bars, lookback).unwrap_or(last.high),
            lowest_low: indicator::lowest_low(&bars, lookback).unwrap_or(last.low),
            close: last.close,
        };
        let last_bar_time = last.time;

        let tickets: Vec<Ticket> = self.positions.keys().copied().collect();
        for ticket in tickets {
            let Some(position) = self.positions.get(&ticket) else {
                continue;
            };
            if position.entry_time() >= last_bar_time {
                continue;
            }
            let Some(open_r) = position.open_r(levels.close) else {
                continue;
            };

            self.apply_breakeven(ctx, ticket, open_r).await;

            if self
                .settings
                .stops
                .trail_start_r
                .is_some_and(|start| open_r < start)
            {
                continue;
            }
            self.apply_trail(ctx, ticket, &levels, open_r).await;
        }
    }

    async fn apply_breakeven(&mut self, ctx: &TickContext<'_>, ticket: Ticket, open_r: Decimal) {
        let Some(trigger) = self.settings.stops.breakeven_trigger_r else {
            return;
        };
        let Some(position) = self.positions.get(&ticket) else {
            return;
        };
        if position.breakeven_hit() || open_r < trigger {
            return;
        }

        let breakeven = ctx.instrument.round_price(position.entry_price());
        let target = position.take_profit();
        if !position.improves_stop(breakeven) {
            if let Some(position) = self.positions.get_mut(&ticket) {
                position.latch_breakeven();
            }
            return;
        }

        match ctx.venue.modify_stop_target(ticket, breakeven, target).await {
            Ok(()) => {
                if let Some(position) = self.positions.get_mut(&ticket) {
                    position.advance_stop(breakeven);
                    position.latch_breakeven();
                }
                info!(
                    engine = %self.settings.name,
                    ticket = %ticket,
                    stop = %breakeven,
                    open_r = %open_r.round_dp(3),
                    "Stop moved to breakeven"
                );
            }
            Err(e) => warn!(
                engine = %self.settings.name,
                ticket = %ticket,
                error = %e,
                "Breakeven modify failed"
            ),
        }
    }

    async fn apply_trail(
        &mut self,
        ctx: &TickContext<'_>,
        ticket: Ticket,
        levels: &TrailLevels,
        open_r: Decimal,
    ) {
        let stops = &self.settings.stops;
        let Some(position) = self.positions.get(&ticket) else {
            return;
        };
        let Some(candidate) = stops.trail_candidate(position.side(), levels) else {
            return;
        };

        let Some(new_stop) = next_trailing_stop(
            position,
            candidate,
            levels.close,
            ctx.instrument.points(stops.min_clearance_points),
            |stop| {
                enforce_stop_level(ctx.instrument, position.side(), levels.close, stop, None).0
            },
        ) else {
            return;
        };

        debug!(
            engine = %self.settings.name,
            ticket = %ticket,
            open_r = %open_r.round_dp(3),
            candidate = %candidate,
            current = %position.current_stop(),
            proposed = %new_stop,
            "Trailing candidate"
        );

        let min_move = ctx.instrument.points(stops.min_move_points);
        if (new_stop - position.current_stop()).abs() <= min_move {
            return;
        }

        let target = position.take_profit();
        match ctx.venue.modify_stop_target(ticket, new_stop, target).await {
            Ok(()) => {
                if let Some(position) = self.positions.get_mut(&ticket) {
                    position.advance_stop(new_stop);
                }
                info!(
                    engine = %self.settings.name,
                    ticket = %ticket,
                    stop = %new_stop,
                    "Trailing stop moved"
                );
            }
            Err(e) => warn!(
                engine = %self.settings.name,
                ticket = %ticket,
                error = %e,
                "Trailing modify failed"
            ),
        }
    }
}

/// Next stop for `position` given a trailing `candidate`, or `None` when the
/// stop should stay where it is.
///
/// The candidate is ratcheted against the current stop, pushed out to the
/// broker minimum distance by `enforce`, and must still improve on the
/// current stop while sitting on the protective side of `price` with at
/// least `clearance` to spare.
pub fn next_trailing_stop(
    position: &Position,
    candidate: Price,
    price: Price,
    clearance: Price,
    enforce: impl Fn(Price) -> Price,
) -> Option<Price> {
    let ratcheted = position.ratchet(candidate);
    let enforced = enforce(ratcheted);
    if !position.improves_stop(enforced) {
        return None;
    }
    if !stop_clears_price(position.side(), price, enforced, clearance) {
        return None;
    }
    Some(enforced)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Side, TradeMode};
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn position(side: Side) -> Position {
        let stop = match side {
            Side::Buy => dec!(97),
            Side::Sell => dec!(103),
        };
        Position::new(
            Ticket::new(1),
            side,
            dec!(1),
            Utc::now(),
            dec!(100),
            stop,
            None,
            Some(TradeMode::Fade),
        )
    }

    #[test]
    fn candidate_behind_current_stop_is_ignored() {
        let long = position(Side::Buy);
        assert_eq!(next_trailing_stop(&long, dec!(96), dec!(105), dec!(0.03), |s| s), None);
    }

    #[test]
    fn candidate_ahead_of_current_stop_is_taken() {
        let long = position(Side::Buy);
        assert_eq!(
            next_trailing_stop(&long, dec!(101), dec!(105), dec!(0.03), |s| s),
            Some(dec!(101))
        );
        let short = position(Side::Sell);
        assert_eq!(
            next_trailing_stop(&short, dec!(99), dec!(95), dec!(0.03), |s| s),
            Some(dec!(99))
        );
    }

    #[test]
    fn stop_through_price_is_rejected() {
        let long = position(Side::Buy);
        assert_eq!(next_trailing_stop(&long, dec!(106), dec!(105), dec!(0.03), |s| s), None);
        assert_eq!(next_trailing_stop(&long, dec!(104.99), dec!(105), dec!(0.03), |s| s), None);
    }

    #[test]
    fn enforcement_that_loosens_is_skipped() {
        let mut long = position(Side::Buy);
        long.advance_stop(dec!(99));
        // Enforcement pushes the stop below the current one.
        let result = next_trailing_stop(&long, dec!(99.9), dec!(100), dec!(0.03), |_| dec!(98.5));
        assert_eq!(result, None);
    }

    proptest! {
        #[test]
        fn ratchet_never_regresses(
            long in any::<bool>(),
            candidates in prop::collection::vec((-5_000i64..5_000, -5_000i64..5_000), 1..40),
        ) {
            let side = if long { Side::Buy } else { Side::Sell };
            let mut pos = position(side);
            let mut previous = pos.current_stop();

            for (cand_cents, price_cents) in candidates {
                let candidate = Decimal::new(10_000 + cand_cents, 2);
                let price = Decimal::new(10_000 + price_cents, 2);
                if let Some(stop) = next_trailing_stop(&pos, candidate, price, dec!(0.03), |s| s) {
                    pos.advance_stop(stop);
                }
                let current = pos.current_stop();
                match side {
                    Side::Buy => prop_assert!(current >= previous),
                    Side::Sell => prop_assert!(current <= previous),
                }
                previous = current;
            }
        }
    }
}
