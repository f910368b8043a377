//! Bridge wire types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{Bar, EngineId, LimitOrderRequest, Price, Quote, Side, Ticket, VenueOrder, Volume};
use crate::port::VenuePosition;

#[derive(Debug, Deserialize)]
pub struct QuoteDto {
    pub bid: Price,
    pub ask: Price,
}

impl QuoteDto {
    /// A quote with a non-positive side is treated as no quote.
    #[must_use]
    pub fn into_quote(self) -> Option<Quote> {
        (self.bid > Decimal::ZERO && self.ask > Decimal::ZERO).then(|| Quote::new(self.bid, self.ask))
    }
}

#[derive(Debug, Deserialize)]
pub struct BarDto {
    pub time: DateTime<Utc>,
    pub open: Price,
    pub high: Price,
    pub low: Price,
    pub close: Price,
    #[serde(default)]
    pub tick_volume: Volume,
}

impl From<BarDto> for Bar {
    fn from(b: BarDto) -> Self {
        Self {
            time: b.time,
            open: b.open,
            high: b.high,
            low: b.low,
            close: b.close,
            volume: b.tick_volume,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PlaceOrderRequest<'a> {
    pub symbol: &'a str,
    pub side: Side,
    #[serde(rename = "type")]
    pub order_type: &'static str,
    pub price: Price,
    pub volume: Volume,
    pub sl: Price,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tp: Option<Price>,
    pub magic: EngineId,
    pub comment: &'a str,
}

impl<'a> PlaceOrderRequest<'a> {
    #[must_use]
    pub fn limit(symbol: &'a str, magic: EngineId, order: &'a LimitOrderRequest) -> Self {
        Self {
            symbol,
            side: order.side,
            order_type: "limit",
            price: order.price,
            volume: order.volume,
            sl: order.stop,
            tp: order.target,
            magic,
            comment: &order.comment,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PlaceOrderResponse {
    pub ticket: Ticket,
}

#[derive(Debug, Serialize)]
pub struct ModifyRequest {
    pub sl: Price,
    pub tp: Option<Price>,
}

#[derive(Debug, Deserialize)]
pub struct PositionDto {
    pub ticket: Ticket,
    pub side: Side,
    pub volume: Volume,
    pub price_open: Price,
    pub time: DateTime<Utc>,
    #[serde(default)]
    pub sl: Option<Price>,
    #[serde(default)]
    pub tp: Option<Price>,
    pub profit: Decimal,
}

impl From<PositionDto> for VenuePosition {
    fn from(p: PositionDto) -> Self {
        // The terminal reports an unset stop or target as zero.
        let level = |v: Option<Price>| v.filter(|v| *v > Decimal::ZERO);
        Self {
            ticket: p.ticket,
            side: p.side,
            volume: p.volume,
            entry_price: p.price_open,
            entry_time: p.time,
            stop: level(p.sl),
            target: level(p.tp),
            profit: p.profit,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct OrderDto {
    pub ticket: Ticket,
    pub side: Side,
    pub price: Price,
    pub volume: Volume,
    pub time_setup: DateTime<Utc>,
}

impl From<OrderDto> for VenueOrder {
    fn from(o: OrderDto) -> Self {
        Self {
            ticket: o.ticket,
            side: o.side,
            price: o.price,
            volume: o.volume,
            created_at: o.time_setup,
        }
    }
}

/// Sum of profit, commission and swap over the selected deals.
#[derive(Debug, Deserialize)]
pub struct PnlDto {
    pub profit: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct AccountDto {
    pub equity: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn zero_levels_become_none() {
        let dto: PositionDto = serde_json::from_str(
            r#"{"ticket":5,"side":"sell","volume":0.1,"price_open":2350.1,
                "time":"2024-07-10T09:00:00Z","sl":2353.1,"tp":0,"profit":-1.5}"#,
        )
        .unwrap();
        let position = VenuePosition::from(dto);
        assert_eq!(position.ticket, Ticket::new(5));
        assert_eq!(position.stop, Some(dec!(2353.1)));
        assert_eq!(position.target, None);
    }

    #[test]
    fn empty_quote_is_none() {
        let dto: QuoteDto = serde_json::from_str(r#"{"bid":0,"ask":0}"#).unwrap();
        assert!(dto.into_quote().is_none());
    }

    #[test]
    fn limit_request_serializes_magic_and_omits_missing_target() {
        let order = LimitOrderRequest {
            side: Side::Buy,
            price: dec!(2349.5),
            volume: dec!(0.1),
            stop: dec!(2346.5),
            target: None,
            comment: "alpha-fol".into(),
        };
        let value = serde_json::to_value(PlaceOrderRequest::limit("XAUUSD", EngineId::new(7), &order)).unwrap();
        assert_eq!(value["type"], "limit");
        assert_eq!(value["magic"], 7);
        assert_eq!(value["side"], "buy");
        assert!(value.get("tp").is_none());
    }
}
