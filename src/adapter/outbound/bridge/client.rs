//! HTTP client for the broker bridge.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{Response, StatusCode};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use tracing::{debug, info};
use url::Url;

use super::dto::{
    AccountDto, BarDto, ModifyRequest, OrderDto, PlaceOrderRequest, PlaceOrderResponse, PnlDto,
    PositionDto, QuoteDto,
};
use super::settings::BridgeConfig;
use crate::adapter::outbound::http::JsonClient;
use crate::domain::{
    Bar, EngineId, Instrument, LimitOrderRequest, Pnl, Price, Quote, Ticket, VenueOrder,
};
use crate::error::{Result, VenueError};
use crate::port::{ExecutionVenue, MarketData, VenuePosition};

/// Venue and market data for one symbol behind the bridge.
pub struct BridgeClient {
    client: JsonClient,
    base: Url,
    symbol: String,
    timeframe: String,
    token: Option<String>,
}

impl BridgeClient {
    /// Build a client for `symbol`. Fails when the base URL is invalid.
    pub fn new(config: &BridgeConfig, symbol: impl Into<String>, token: Option<String>) -> Result<Self> {
        let mut base = Url::parse(&config.base_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self {
            client: JsonClient::from_config(&config.http),
            base,
            symbol: symbol.into(),
            timeframe: config.timeframe.clone(),
            token,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base.join(path)?)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Map non-success statuses to venue errors. A 404 on a ticket-scoped
    /// call means the ticket is gone.
    async fn check(response: Response, ticket: Option<Ticket>) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let err = match (status, ticket) {
            (StatusCode::NOT_FOUND, Some(ticket)) => VenueError::NotFound(ticket),
            (s, _) if s.is_client_error() => VenueError::Rejected(format!("{s}: {body}")),
            (s, _) => VenueError::Unavailable(format!("{s}: {body}")),
        };
        Err(err.into())
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url, query: &[(&str, String)]) -> Result<T> {
        let response = self
            .client
            .send_with_retry(|http| self.authorize(http.get(url.clone()).query(query)))
            .await?;
        Ok(Self::check(response, None).await?.json::<T>().await?)
    }

    fn magic_query(&self, engine: EngineId) -> Vec<(&'static str, String)> {
        vec![
            ("symbol", self.symbol.clone()),
            ("magic", engine.value().to_string()),
        ]
    }
}

#[async_trait]
impl MarketData for BridgeClient {
    async fn current_quote(&self) -> Result<Option<Quote>> {
        let url = self.endpoint(&format!("symbols/{}/quote", self.symbol))?;
        let quote: Option<QuoteDto> = self.get_json(url, &[]).await?;
        Ok(quote.and_then(QuoteDto::into_quote))
    }

    async fn recent_bars(&self, count: usize) -> Result<Vec<Bar>> {
        let url = self.endpoint(&format!("symbols/{}/bars", self.symbol))?;
        let query = [
            ("timeframe", self.timeframe.clone()),
            ("count", count.to_string()),
        ];
        let mut bars: Vec<Bar> = self
            .get_json::<Vec<BarDto>>(url, &query)
            .await?
            .into_iter()
            .map(Bar::from)
            .collect();
        bars.sort_by_key(|bar| bar.time);
        Ok(bars)
    }
}

#[async_trait]
impl ExecutionVenue for BridgeClient {
    async fn instrument(&self) -> Result<Instrument> {
        let url = self.endpoint(&format!("symbols/{}", self.symbol))?;
        self.get_json(url, &[]).await
    }

    async fn place_pending(&self, engine: EngineId, order: &LimitOrderRequest) -> Result<Ticket> {
        let url = self.endpoint("orders")?;
        let body = PlaceOrderRequest::limit(&self.symbol, engine, order);
        // Order placement is not retried: a timed-out request may have
        // reached the terminal.
        let response = self
            .authorize(self.client.http().post(url).json(&body))
            .send()
            .await?;
        let placed: PlaceOrderResponse = Self::check(response, None).await?.json().await?;
        info!(
            magic = %engine,
            ticket = %placed.ticket,
            side = %order.side,
            price = %order.price,
            volume = %order.volume,
            "Bridge accepted limit order"
        );
        Ok(placed.ticket)
    }

    async fn cancel(&self, ticket: Ticket) -> Result<()> {
        let url = self.endpoint(&format!("orders/{ticket}"))?;
        let response = self
            .client
            .send_with_retry(|http| self.authorize(http.delete(url.clone())))
            .await?;
        Self::check(response, Some(ticket)).await?;
        Ok(())
    }

    async fn modify_stop_target(
        &self,
        ticket: Ticket,
        stop: Price,
        target: Option<Price>,
    ) -> Result<()> {
        let url = self.endpoint(&format!("positions/{ticket}/sltp"))?;
        let body = ModifyRequest { sl: stop, tp: target };
        let response = self
            .client
            .send_with_retry(|http| self.authorize(http.put(url.clone()).json(&body)))
            .await?;
        Self::check(response, Some(ticket)).await?;
        debug!(ticket = %ticket, stop = %stop, "Bridge modified stop");
        Ok(())
    }

    async fn close(&self, ticket: Ticket) -> Result<()> {
        let url = self.endpoint(&format!("positions/{ticket}/close"))?;
        let response = self
            .authorize(self.client.http().post(url))
            .send()
            .await?;
        Self::check(response, Some(ticket)).await?;
        Ok(())
    }

    async fn list_open_positions(&self, engine: EngineId) -> Result<Vec<VenuePosition>> {
        let url = self.endpoint("positions")?;
        let positions: Vec<PositionDto> = self.get_json(url, &self.magic_query(engine)).await?;
        Ok(positions.into_iter().map(VenuePosition::from).collect())
    }

    async fn list_pending_orders(&self, engine: EngineId) -> Result<Vec<VenueOrder>> {
        let url = self.endpoint("orders")?;
        let orders: Vec<OrderDto> = self.get_json(url, &self.magic_query(engine)).await?;
        Ok(orders.into_iter().map(VenueOrder::from).collect())
    }

    async fn realized_pnl_since(&self, engine: EngineId, since: DateTime<Utc>) -> Result<Pnl> {
        let url = self.endpoint("deals/pnl")?;
        let mut query = self.magic_query(engine);
        query.push(("since", since.to_rfc3339_opts(SecondsFormat::Secs, true)));
        let pnl: PnlDto = self.get_json(url, &query).await?;
        Ok(pnl.profit)
    }

    async fn account_equity(&self) -> Result<Decimal> {
        let url = self.endpoint("account")?;
        let account: AccountDto = self.get_json(url, &[]).await?;
        Ok(account.equity)
    }
}
