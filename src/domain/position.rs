//! Open positions and the stop ratchet.
//!
//! A [`Position`] keeps the stop it was opened with (`initial_stop`, the
//! base of every R-multiple) apart from the stop currently working at the
//! venue (`current_stop`). The current stop only ever moves in the
//! favorable direction, and the breakeven flag is a one-way latch.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::Ticket;
use super::money::{Pnl, Price, Volume};
use super::order::TradeMode;
use super::side::Side;

/// Execution quality of a fill, in price units. Positive means the fill was
/// better for us than the reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillQuality {
    /// Against the market price observed when the order was placed.
    pub vs_reference: Price,
    /// Against the limit price we requested.
    pub vs_requested: Price,
}

impl FillQuality {
    /// Measure a fill at `entry` for an order placed at `requested` while
    /// the market stood at `reference`.
    #[must_use]
    pub fn measure(side: Side, entry: Price, reference: Price, requested: Price) -> Self {
        let sign = side.sign();
        Self {
            vs_reference: (reference - entry) * sign,
            vs_requested: (requested - entry) * sign,
        }
    }
}

/// A live position owned by one engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    ticket: Ticket,
    side: Side,
    volume: Volume,
    entry_time: DateTime<Utc>,
    entry_price: Price,
    initial_stop: Price,
    current_stop: Price,
    take_profit: Option<Price>,
    mode: Option<TradeMode>,
    breakeven_hit: bool,
    fill_quality: Option<FillQuality>,
    unrealized: Pnl,
}

impl Position {
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        ticket: Ticket,
        side: Side,
        volume: Volume,
        entry_time: DateTime<Utc>,
        entry_price: Price,
        initial_stop: Price,
        take_profit: Option<Price>,
        mode: Option<TradeMode>,
    ) -> Self {
        Self {
            ticket,
            side,
            volume,
            entry_time,
            entry_price,
            initial_stop,
            current_stop: initial_stop,
            take_profit,
            mode,
            breakeven_hit: false,
            fill_quality: None,
            unrealized: Decimal::ZERO,
        }
    }

    #[must_use]
    pub fn with_fill_quality(mut self, quality: FillQuality) -> Self {
        self.fill_quality = Some(quality);
        self
    }

    #[must_use]
    pub const fn ticket(&self) -> Ticket {
        self.ticket
    }

    #[must_use]
    pub const fn side(&self) -> Side {
        self.side
    }

    #[must_use]
    pub const fn volume(&self) -> Volume {
        self.volume
    }

    #[must_use]
    pub const fn entry_time(&self) -> DateTime<Utc> {
        self.entry_time
    }

    #[must_use]
    pub const fn entry_price(&self) -> Price {
        self.entry_price
    }

    #[must_use]
    pub const fn initial_stop(&self) -> Price {
        self.initial_stop
    }

    #[must_use]
    pub const fn current_stop(&self) -> Price {
        self.current_stop
    }

    #[must_use]
    pub const fn take_profit(&self) -> Option<Price> {
        self.take_profit
    }

    /// `None` for positions adopted from the venue without a local record.
    #[must_use]
    pub const fn mode(&self) -> Option<TradeMode> {
        self.mode
    }

    #[must_use]
    pub const fn breakeven_hit(&self) -> bool {
        self.breakeven_hit
    }

    #[must_use]
    pub const fn fill_quality(&self) -> Option<FillQuality> {
        self.fill_quality
    }

    /// Floating P&L last reported by the venue.
    #[must_use]
    pub const fn unrealized(&self) -> Pnl {
        self.unrealized
    }

    pub fn set_unrealized(&mut self, pnl: Pnl) {
        self.unrealized = pnl;
    }

    /// Distance between entry and the initial stop: one R.
    #[must_use]
    pub fn risk_distance(&self) -> Price {
        (self.entry_price - self.initial_stop).abs()
    }

    /// Favorable excursion at `price` in multiples of the initial risk.
    ///
    /// Returns `None` when the initial stop sits on the entry price.
    #[must_use]
    pub fn open_r(&self, price: Price) -> Option<Decimal> {
        let risk = self.risk_distance();
        if risk.is_zero() {
            return None;
        }
        Some((price - self.entry_price) * self.side.sign() / risk)
    }

    /// Whether `stop` is strictly more protective than the current stop.
    #[must_use]
    pub fn improves_stop(&self, stop: Price) -> bool {
        match self.side {
            Side::Buy => stop > self.current_stop,
            Side::Sell => stop < self.current_stop,
        }
    }

    /// The more protective of the current stop and `candidate`.
    #[must_use]
    pub fn ratchet(&self, candidate: Price) -> Price {
        match self.side {
            Side::Buy => self.current_stop.max(candidate),
            Side::Sell => self.current_stop.min(candidate),
        }
    }

    /// Record a stop accepted by the venue. Stops that would loosen the
    /// position are ignored; returns whether the stop moved.
    pub fn advance_stop(&mut self, stop: Price) -> bool {
        if !self.improves_stop(stop) {
            return false;
        }
        self.current_stop = stop;
        true
    }

    pub fn latch_breakeven(&mut self) {
        self.breakeven_hit = true;
    }

    /// Update venue-reported fields that may legitimately change while open.
    pub fn refresh(&mut self, volume: Volume, take_profit: Option<Price>, unrealized: Pnl) {
        self.volume = volume;
        self.take_profit = take_profit;
        self.unrealized = unrealized;
    }
}
