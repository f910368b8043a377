//! SiRiX wire types.
//!
//! The endpoint answers either `{"OpenPositions": [...]}` or a bare list.
//! Identifiers arrive as numbers or strings depending on the server build,
//! and every numeric field may be `null`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::port::RawEvent;

/// Request body of the open-positions endpoint.
#[derive(Debug, Serialize)]
pub struct OpenPositionsRequest<'a> {
    pub groups: &'a [String],
    #[serde(rename = "startTime")]
    pub start_time: String,
    #[serde(rename = "endTime")]
    pub end_time: String,
}

/// Top-level response, before individual records are decoded.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum OpenPositionsResponse {
    Wrapped {
        #[serde(rename = "OpenPositions")]
        open_positions: Vec<serde_json::Value>,
    },
    List(Vec<serde_json::Value>),
    Unknown(serde_json::Value),
}

impl OpenPositionsResponse {
    /// Raw records, or `None` for an unrecognized payload.
    #[must_use]
    pub fn into_records(self) -> Option<Vec<serde_json::Value>> {
        match self {
            Self::Wrapped { open_positions } => Some(open_positions),
            Self::List(records) => Some(records),
            Self::Unknown(_) => None,
        }
    }
}

/// Identifier that may be encoded as a number or a string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WireId {
    Number(i64),
    Text(String),
}

impl WireId {
    fn into_string(self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SirixPosition {
    #[serde(rename = "OrderID")]
    pub order_id: Option<WireId>,
    #[serde(rename = "UserID")]
    pub user_id: Option<WireId>,
    pub instrument_name: Option<String>,
    pub action_type: Option<i64>,
    pub open_rate: Option<Decimal>,
    pub stop_loss: Option<Decimal>,
    pub take_profit: Option<Decimal>,
    pub amount_lots: Option<Decimal>,
    pub open_time: Option<String>,
}

impl From<SirixPosition> for RawEvent {
    fn from(p: SirixPosition) -> Self {
        Self {
            order_id: p.order_id.map(WireId::into_string).unwrap_or_default(),
            participant_id: p.user_id.map(WireId::into_string).unwrap_or_default(),
            instrument: p.instrument_name.unwrap_or_default(),
            action_type: p.action_type,
            open_price: p.open_rate.unwrap_or_default(),
            stop_loss: p.stop_loss,
            take_profit: p.take_profit,
            size: p.amount_lots.unwrap_or_default(),
            open_time: p.open_time.unwrap_or_default(),
        }
    }
}
