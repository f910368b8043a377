//! Execution venue port.
//!
//! The venue owns orders and positions; engines only keep local metadata
//! (initial stop, decision mode, breakeven latch) keyed by ticket. Every
//! query is filtered by the engine's magic number.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::domain::{
    EngineId, Instrument, LimitOrderRequest, Pnl, Price, Side, Ticket, VenueOrder, Volume,
};
use crate::error::Result;

/// A live position as reported by the venue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VenuePosition {
    pub ticket: Ticket,
    pub side: Side,
    pub volume: Volume,
    pub entry_price: Price,
    pub entry_time: DateTime<Utc>,
    pub stop: Option<Price>,
    pub target: Option<Price>,
    /// Floating P&L in account currency.
    pub profit: Pnl,
}

#[async_trait]
pub trait ExecutionVenue: Send + Sync {
    /// Symbol specification of the traded instrument.
    async fn instrument(&self) -> Result<Instrument>;

    /// Place a limit order tagged with `engine`; returns its ticket.
    async fn place_pending(&self, engine: EngineId, order: &LimitOrderRequest) -> Result<Ticket>;

    /// Cancel a resting order.
    async fn cancel(&self, ticket: Ticket) -> Result<()>;

    /// Replace the stop and target of an open position.
    async fn modify_stop_target(
        &self,
        ticket: Ticket,
        stop: Price,
        target: Option<Price>,
    ) -> Result<()>;

    /// Close an open position at market.
    async fn close(&self, ticket: Ticket) -> Result<()>;

    async fn list_open_positions(&self, engine: EngineId) -> Result<Vec<VenuePosition>>;

    async fn list_pending_orders(&self, engine: EngineId) -> Result<Vec<VenueOrder>>;

    /// Realized P&L of `engine` from deals closed at or after `since`.
    async fn realized_pnl_since(&self, engine: EngineId, since: DateTime<Utc>) -> Result<Pnl>;

    async fn account_equity(&self) -> Result<Decimal>;
}
