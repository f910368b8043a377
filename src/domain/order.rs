//! Pending limit orders and the follow/fade decision mode.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::Ticket;
use super::money::{Price, Volume};
use super::side::Side;

/// Whether a trade goes with the detected cluster or against it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeMode {
    Follow,
    Fade,
}

impl TradeMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Follow => "follow",
            Self::Fade => "fade",
        }
    }
}

impl fmt::Display for TradeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order submission sent to the execution venue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LimitOrderRequest {
    pub side: Side,
    pub price: Price,
    pub volume: Volume,
    pub stop: Price,
    pub target: Option<Price>,
    /// Free-text tag stored with the order on the venue side.
    pub comment: String,
}

/// A resting limit order placed by one engine.
///
/// Created on successful placement and removed when it fills (promoted to a
/// position under the same ticket), expires, or disappears from the venue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingOrder {
    pub ticket: Ticket,
    pub side: Side,
    pub volume: Volume,
    pub requested_price: Price,
    /// Mid price at the moment of placement.
    pub reference_market_price: Price,
    pub stop: Price,
    pub target: Option<Price>,
    pub created_at: DateTime<Utc>,
    pub mode: TradeMode,
}

impl PendingOrder {
    /// Age of the order at `now`.
    #[must_use]
    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.created_at
    }
}

/// A pending order as listed by the venue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VenueOrder {
    pub ticket: Ticket,
    pub side: Side,
    pub price: Price,
    pub volume: Volume,
    pub created_at: DateTime<Utc>,
}
