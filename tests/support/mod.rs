//! Shared fixtures for integration tests: a paper venue priced by scripted
//! market data, a switchable calendar and a tick context over them.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;

use cluster_hybrid::adapter::outbound::paper::{PaperConfig, PaperVenue};
use cluster_hybrid::application::engine::TickContext;
use cluster_hybrid::domain::Instrument;
use cluster_hybrid::testkit::calendar::StaticCalendar;
use cluster_hybrid::testkit::domain::{instrument, t0};
use cluster_hybrid::testkit::market::ScriptedMarket;

pub struct Harness {
    pub market: Arc<ScriptedMarket>,
    pub venue: Arc<PaperVenue>,
    pub calendar: Arc<StaticCalendar>,
    pub instrument: Instrument,
}

impl Harness {
    /// Quote 2000.00 / 2000.20, venue clock at `t0()`.
    pub fn new() -> Self {
        let market = Arc::new(ScriptedMarket::new());
        market.set_quote(Decimal::new(200_000, 2), Decimal::new(200_020, 2));
        let venue = Arc::new(PaperVenue::new(
            instrument(),
            market.clone(),
            &PaperConfig::default(),
        ));
        venue.set_time(t0());
        Self {
            market,
            venue,
            calendar: Arc::new(StaticCalendar::new()),
            instrument: instrument(),
        }
    }

    pub fn ctx(&self) -> TickContext<'_> {
        TickContext {
            venue: self.venue.as_ref(),
            market: self.market.as_ref(),
            calendar: self.calendar.as_ref(),
            instrument: &self.instrument,
            day_start: t0() - Duration::hours(12),
        }
    }

    /// Move the venue clock.
    pub fn at(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.venue.set_time(now);
        now
    }
}
