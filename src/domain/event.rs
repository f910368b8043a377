//! Observed participant trade opens.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{OrderRef, ParticipantId};
use super::money::{Price, Volume};
use super::side::Side;

/// One observed participant trade open.
///
/// `open_time` is event time in UTC (when the participant opened), not the
/// time we received it. Events are immutable once built by intake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionEvent {
    pub order_id: OrderRef,
    pub participant_id: ParticipantId,
    pub side: Side,
    pub size: Volume,
    pub open_price: Price,
    pub open_time: DateTime<Utc>,
}
