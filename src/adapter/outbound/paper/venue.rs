use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, info};

use crate::domain::{
    EngineId, Instrument, LimitOrderRequest, Pnl, Price, Quote, Side, Ticket, VenueOrder, Volume,
};
use crate::error::{Result, VenueError};
use crate::port::{ExecutionVenue, MarketData, VenuePosition};

/// Paper account settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PaperConfig {
    /// Starting balance in account currency.
    #[serde(default = "default_balance")]
    pub balance: Decimal,
}

fn default_balance() -> Decimal {
    Decimal::from(10_000)
}

impl Default for PaperConfig {
    fn default() -> Self {
        Self {
            balance: default_balance(),
        }
    }
}

#[derive(Debug, Clone)]
struct RestingOrder {
    magic: EngineId,
    side: Side,
    price: Price,
    volume: Volume,
    stop: Price,
    target: Option<Price>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct OpenPosition {
    magic: EngineId,
    side: Side,
    volume: Volume,
    entry_price: Price,
    entry_time: DateTime<Utc>,
    stop: Option<Price>,
    target: Option<Price>,
}

#[derive(Debug, Clone)]
struct Deal {
    magic: EngineId,
    profit: Pnl,
    closed_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Book {
    next_ticket: u64,
    orders: BTreeMap<Ticket, RestingOrder>,
    positions: BTreeMap<Ticket, OpenPosition>,
    deals: Vec<Deal>,
    clock: Option<DateTime<Utc>>,
    reject_cancels: bool,
    reject_modifications: bool,
}

impl Book {
    fn now(&self) -> DateTime<Utc> {
        self.clock.unwrap_or_else(Utc::now)
    }
}

/// Simulated broker account for one instrument.
pub struct PaperVenue {
    instrument: Instrument,
    market: Arc<dyn MarketData>,
    balance: Decimal,
    book: Mutex<Book>,
}

impl PaperVenue {
    #[must_use]
    pub fn new(instrument: Instrument, market: Arc<dyn MarketData>, config: &PaperConfig) -> Self {
        Self {
            instrument,
            market,
            balance: config.balance,
            book: Mutex::new(Book {
                next_ticket: 1,
                ..Book::default()
            }),
        }
    }

    /// Pin the venue clock. Fill and close times use it instead of the wall
    /// clock.
    pub fn set_time(&self, now: DateTime<Utc>) {
        self.book.lock().clock = Some(now);
    }

    /// Make every cancel fail with `Unavailable` until switched off.
    pub fn reject_cancels(&self, reject: bool) {
        self.book.lock().reject_cancels = reject;
    }

    /// Make every stop/target modification fail until switched off.
    pub fn reject_modifications(&self, reject: bool) {
        self.book.lock().reject_modifications = reject;
    }

    fn profit(&self, side: Side, volume: Volume, entry: Price, exit: Price) -> Pnl {
        (exit - entry) * side.sign() * volume * self.instrument.contract_size
    }

    /// Price at which a position of `side` would close now.
    fn exit_price(side: Side, quote: &Quote) -> Price {
        match side {
            Side::Buy => quote.bid,
            Side::Sell => quote.ask,
        }
    }

    /// Fill crossed orders and close positions whose stop or target was
    /// reached at `quote`.
    fn settle(&self, book: &mut Book, quote: &Quote) {
        let now = book.now();

        let filled: Vec<Ticket> = book
            .orders
            .iter()
            .filter(|(_, order)| match order.side {
                Side::Buy => quote.ask <= order.price,
                Side::Sell => quote.bid >= order.price,
            })
            .map(|(ticket, _)| *ticket)
            .collect();
        for ticket in filled {
            if let Some(order) = book.orders.remove(&ticket) {
                info!(ticket = %ticket, side = %order.side, price = %order.price, "Paper order filled");
                book.positions.insert(
                    ticket,
                    OpenPosition {
                        magic: order.magic,
                        side: order.side,
                        volume: order.volume,
                        entry_price: order.price,
                        entry_time: now,
                        stop: Some(order.stop),
                        target: order.target,
                    },
                );
            }
        }

        let closing: Vec<(Ticket, Price)> = book
            .positions
            .iter()
            .filter_map(|(ticket, position)| {
                let price = Self::exit_price(position.side, quote);
                let stopped = position.stop.is_some_and(|stop| match position.side {
                    Side::Buy => price <= stop,
                    Side::Sell => price >= stop,
                });
                let targeted = position.target.is_some_and(|target| match position.side {
                    Side::Buy => price >= target,
                    Side::Sell => price <= target,
                });
                match (stopped, targeted) {
                    (true, _) => position.stop.map(|stop| (*ticket, stop)),
                    (false, true) => position.target.map(|target| (*ticket, target)),
                    _ => None,
                }
            })
            .collect();
        for (ticket, price) in closing {
            self.close_at(book, ticket, price, now);
        }
    }

    fn close_at(&self, book: &mut Book, ticket: Ticket, price: Price, now: DateTime<Utc>) {
        if let Some(position) = book.positions.remove(&ticket) {
            let profit = self.profit(position.side, position.volume, position.entry_price, price);
            info!(ticket = %ticket, price = %price, profit = %profit, "Paper position closed");
            book.deals.push(Deal {
                magic: position.magic,
                profit,
                closed_at: now,
            });
        }
    }

    async fn quote(&self) -> Result<Option<Quote>> {
        self.market.current_quote().await
    }

    /// Fetch the quote and settle the book against it.
    async fn refresh(&self) -> Result<Option<Quote>> {
        let quote = self.quote().await?;
        if let Some(quote) = &quote {
            let mut book = self.book.lock();
            self.settle(&mut book, quote);
        }
        Ok(quote)
    }
}

#[async_trait]
impl ExecutionVenue for PaperVenue {
    async fn instrument(&self) -> Result<Instrument> {
        Ok(self.instrument.clone())
    }

    async fn place_pending(&self, engine: EngineId, order: &LimitOrderRequest) -> Result<Ticket> {
        if order.volume < self.instrument.volume_min || order.volume > self.instrument.volume_max {
            return Err(VenueError::Rejected(format!("volume {} out of range", order.volume)).into());
        }
        let mut book = self.book.lock();
        let ticket = Ticket::new(book.next_ticket);
        book.next_ticket += 1;
        let created_at = book.now();
        book.orders.insert(
            ticket,
            RestingOrder {
                magic: engine,
                side: order.side,
                price: order.price,
                volume: order.volume,
                stop: order.stop,
                target: order.target,
                created_at,
            },
        );
        debug!(magic = %engine, ticket = %ticket, comment = %order.comment, "Paper order placed");
        Ok(ticket)
    }

    async fn cancel(&self, ticket: Ticket) -> Result<()> {
        let mut book = self.book.lock();
        if book.reject_cancels {
            return Err(VenueError::Unavailable("cancel rejected".into()).into());
        }
        book.orders
            .remove(&ticket)
            .map(|_| ())
            .ok_or_else(|| VenueError::NotFound(ticket).into())
    }

    async fn modify_stop_target(
        &self,
        ticket: Ticket,
        stop: Price,
        target: Option<Price>,
    ) -> Result<()> {
        let quote = self.quote().await?;
        let mut book = self.book.lock();
        if book.reject_modifications {
            return Err(VenueError::Unavailable("modification rejected".into()).into());
        }
        let position = book
            .positions
            .get_mut(&ticket)
            .ok_or(VenueError::NotFound(ticket))?;
        if let Some(quote) = quote {
            let price = Self::exit_price(position.side, &quote);
            let wrong_side = match position.side {
                Side::Buy => stop >= price,
                Side::Sell => stop <= price,
            };
            if wrong_side {
                return Err(VenueError::Rejected(format!("invalid stop {stop} at price {price}")).into());
            }
        }
        position.stop = Some(stop);
        position.target = target;
        Ok(())
    }

    async fn close(&self, ticket: Ticket) -> Result<()> {
        let quote = self
            .quote()
            .await?
            .ok_or_else(|| VenueError::Unavailable("no quote".into()))?;
        let mut book = self.book.lock();
        let side = book
            .positions
            .get(&ticket)
            .map(|position| position.side)
            .ok_or(VenueError::NotFound(ticket))?;
        let now = book.now();
        self.close_at(&mut book, ticket, Self::exit_price(side, &quote), now);
        Ok(())
    }

    async fn list_open_positions(&self, engine: EngineId) -> Result<Vec<VenuePosition>> {
        let quote = self.refresh().await?;
        let book = self.book.lock();
        Ok(book
            .positions
            .iter()
            .filter(|(_, position)| position.magic == engine)
            .map(|(ticket, position)| VenuePosition {
                ticket: *ticket,
                side: position.side,
                volume: position.volume,
                entry_price: position.entry_price,
                entry_time: position.entry_time,
                stop: position.stop,
                target: position.target,
                profit: quote.as_ref().map_or(Decimal::ZERO, |quote| {
                    self.profit(
                        position.side,
                        position.volume,
                        position.entry_price,
                        Self::exit_price(position.side, quote),
                    )
                }),
            })
            .collect())
    }

    async fn list_pending_orders(&self, engine: EngineId) -> Result<Vec<VenueOrder>> {
        self.refresh().await?;
        let book = self.book.lock();
        Ok(book
            .orders
            .iter()
            .filter(|(_, order)| order.magic == engine)
            .map(|(ticket, order)| VenueOrder {
                ticket: *ticket,
                side: order.side,
                price: order.price,
                volume: order.volume,
                created_at: order.created_at,
            })
            .collect())
    }

    async fn realized_pnl_since(&self, engine: EngineId, since: DateTime<Utc>) -> Result<Pnl> {
        let book = self.book.lock();
        Ok(book
            .deals
            .iter()
            .filter(|deal| deal.magic == engine && deal.closed_at >= since)
            .map(|deal| deal.profit)
            .sum())
    }

    async fn account_equity(&self) -> Result<Decimal> {
        let quote = self.refresh().await?;
        let book = self.book.lock();
        let realized: Pnl = book.deals.iter().map(|deal| deal.profit).sum();
        let floating: Pnl = quote.map_or(Decimal::ZERO, |quote| {
            book.positions
                .values()
                .map(|p| self.profit(p.side, p.volume, p.entry_price, Self::exit_price(p.side, &quote)))
                .sum()
        });
        Ok(self.balance + realized + floating)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::domain::instrument;
    use crate::testkit::market::ScriptedMarket;
    use rust_decimal_macros::dec;

    const MAGIC: EngineId = EngineId::new(1);

    fn venue(market: &Arc<ScriptedMarket>) -> PaperVenue {
        PaperVenue::new(instrument(), market.clone(), &PaperConfig::default())
    }

    fn buy_limit(price: Price) -> LimitOrderRequest {
        LimitOrderRequest {
            side: Side::Buy,
            price,
            volume: dec!(0.1),
            stop: price - dec!(3),
            target: Some(price + dec!(6)),
            comment: "test".into(),
        }
    }

    #[tokio::test]
    async fn limit_fills_when_quote_crosses() {
        let market = Arc::new(ScriptedMarket::new());
        market.set_quote(dec!(100), dec!(100.2));
        let venue = venue(&market);

        let ticket = venue.place_pending(MAGIC, &buy_limit(dec!(99.5))).await.unwrap();
        assert_eq!(venue.list_pending_orders(MAGIC).await.unwrap().len(), 1);

        market.set_quote(dec!(99.3), dec!(99.5));
        let positions = venue.list_open_positions(MAGIC).await.unwrap();
        assert_eq!(positions.len(), 1);
        assert_eq!(positions[0].ticket, ticket);
        assert_eq!(positions[0].entry_price, dec!(99.5));
        assert!(venue.list_pending_orders(MAGIC).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn stop_hit_books_realized_loss() {
        let market = Arc::new(ScriptedMarket::new());
        market.set_quote(dec!(99.3), dec!(99.5));
        let venue = venue(&market);
        let since = Utc::now() - chrono::Duration::hours(1);

        venue.place_pending(MAGIC, &buy_limit(dec!(99.5))).await.unwrap();
        venue.list_open_positions(MAGIC).await.unwrap();

        market.set_quote(dec!(96.4), dec!(96.6));
        assert!(venue.list_open_positions(MAGIC).await.unwrap().is_empty());
        // 3.0 * 0.1 lots * 100 contract size
        assert_eq!(venue.realized_pnl_since(MAGIC, since).await.unwrap(), dec!(-30.0));
        assert_eq!(venue.account_equity().await.unwrap(), dec!(9970.0));
    }

    #[tokio::test]
    async fn cancel_of_unknown_ticket_is_not_found() {
        let market = Arc::new(ScriptedMarket::new());
        let venue = venue(&market);
        let err = venue.cancel(Ticket::new(42)).await.unwrap_err();
        assert!(matches!(err, crate::error::Error::Venue(VenueError::NotFound(t)) if t == Ticket::new(42)));
    }

    #[tokio::test]
    async fn wrong_side_stop_is_rejected() {
        let market = Arc::new(ScriptedMarket::new());
        market.set_quote(dec!(99.3), dec!(99.5));
        let venue = venue(&market);
        let ticket = venue.place_pending(MAGIC, &buy_limit(dec!(99.5))).await.unwrap();
        venue.list_open_positions(MAGIC).await.unwrap();

        assert!(venue.modify_stop_target(ticket, dec!(99.4), None).await.is_err());
        assert!(venue.modify_stop_target(ticket, dec!(98), None).await.is_ok());
    }
}
