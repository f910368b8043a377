//! Full ticks through the runtime: feed -> intake -> cluster -> direction ->
//! pending order -> fill -> risk supervision -> snapshot.

mod support;

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::Duration;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tokio::sync::watch;

use cluster_hybrid::application::dedup::SeenOrders;
use cluster_hybrid::application::direction::DirectionMode;
use cluster_hybrid::application::engine::Engine;
use cluster_hybrid::application::intake::Intake;
use cluster_hybrid::application::risk::{EnginePnl, RiskLimits, RiskSupervisor};
use cluster_hybrid::domain::{Bar, EngineId, Side, TradeMode};
use cluster_hybrid::error::{Error, FeedError, RiskError};
use cluster_hybrid::infrastructure::runtime::{
    Adapters, RunOutcome, Runtime, RuntimeSettings, TickOutcome,
};
use cluster_hybrid::port::ExecutionVenue;
use cluster_hybrid::testkit::domain::{at, bar, flat_bars, raw, t0, SYMBOL};
use cluster_hybrid::testkit::engine::settings;
use cluster_hybrid::testkit::feed::ScriptedFeed;
use cluster_hybrid::testkit::sink::MemorySink;
use support::Harness;

struct Flow {
    h: Harness,
    feed: Arc<ScriptedFeed>,
    sink: Arc<MemorySink>,
}

impl Flow {
    fn new() -> Self {
        Self {
            h: Harness::new(),
            feed: Arc::new(ScriptedFeed::new()),
            sink: Arc::new(MemorySink::new()),
        }
    }

    fn adapters(&self) -> Adapters {
        Adapters {
            feed: self.feed.clone(),
            venue: self.h.venue.clone(),
            market: self.h.market.clone(),
            calendar: self.h.calendar.clone(),
            snapshot: Some(self.sink.clone()),
        }
    }

    fn runtime(&self, engines: Vec<Engine>, limits: RiskLimits) -> Runtime {
        self.runtime_with(engines, RiskSupervisor::new(limits, chrono_tz::Europe::London))
    }

    fn runtime_with(&self, engines: Vec<Engine>, supervisor: RiskSupervisor) -> Runtime {
        let settings = RuntimeSettings {
            bot_name: "test-bot".into(),
            dry_run: true,
            poll_interval: StdDuration::from_millis(10),
            error_pause: StdDuration::from_millis(10),
            heartbeat: None,
            lookback: Duration::seconds(60),
        };
        Runtime::new(
            settings,
            self.adapters(),
            self.h.instrument.clone(),
            Intake::new(SYMBOL, chrono_tz::UTC),
            SeenOrders::new(Duration::hours(24)),
            engines,
            supervisor,
        )
    }

    fn three_buyers(&self) {
        self.feed.set_records(vec![
            raw("1001", "alice", Side::Buy, at(0)),
            raw("1002", "bob", Side::Buy, at(2)),
            raw("1003", "carol", Side::Buy, at(4)),
        ]);
    }
}

fn hybrid_engine() -> Engine {
    let mut s = settings();
    s.direction.mode = DirectionMode::Hybrid;
    Engine::new(s)
}

#[tokio::test]
async fn three_buyers_with_neutral_momentum_fade_into_sell_limit() {
    let flow = Flow::new();
    // alternating closes: RSI near 50, last close within the VWAP band
    flow.h.market.set_bars(flat_bars(300, t0(), dec!(2000.10), dec!(0.5)));
    flow.three_buyers();
    let mut runtime = flow.runtime(vec![hybrid_engine()], RiskLimits::default());

    let outcome = runtime.tick(flow.h.at(at(5))).await.unwrap();
    assert_eq!(outcome, TickOutcome::Continue);

    let engine = &runtime.engines()[0];
    let order = engine.pending_orders().next().expect("fade order placed");
    assert_eq!(order.side, Side::Sell);
    assert_eq!(order.mode, TradeMode::Fade);
    assert_eq!(order.requested_price, dec!(2000.70));

    let snapshot = flow.sink.last().unwrap();
    assert_eq!(snapshot.symbol, SYMBOL);
    assert!(snapshot.halted.is_none());
    assert_eq!(snapshot.engines[0].pending_orders.len(), 1);
    assert!(snapshot.engines[0].in_cooldown);
}

#[tokio::test]
async fn hybrid_follows_when_momentum_confirms() {
    let flow = Flow::new();
    // falling market: RSI pinned at zero, price well under VWAP
    let falling: Vec<Bar> = (0..300_i64)
        .map(|i| {
            let open = dec!(2030) - Decimal::from(i) / dec!(10);
            let close = open - dec!(0.1);
            bar(t0() - Duration::minutes(300 - i), open, open + dec!(0.05), close - dec!(0.05), close)
        })
        .collect();
    flow.h.market.set_bars(falling);
    flow.three_buyers();
    let mut runtime = flow.runtime(vec![hybrid_engine()], RiskLimits::default());

    runtime.tick(flow.h.at(at(5))).await.unwrap();

    let order = runtime.engines()[0].pending_orders().next().unwrap();
    assert_eq!(order.mode, TradeMode::Follow);
    assert_eq!(order.side, Side::Buy);
    assert_eq!(order.requested_price, dec!(1999.50));
}

#[tokio::test]
async fn hybrid_without_bars_fades() {
    let flow = Flow::new();
    flow.three_buyers();
    let mut runtime = flow.runtime(vec![hybrid_engine()], RiskLimits::default());

    runtime.tick(flow.h.at(at(5))).await.unwrap();

    let order = runtime.engines()[0].pending_orders().next().unwrap();
    assert_eq!((order.side, order.mode), (Side::Sell, TradeMode::Fade));
}

#[tokio::test]
async fn replayed_feed_records_are_ignored() {
    let flow = Flow::new();
    flow.three_buyers();
    let mut s = settings();
    s.entry.max_open = 2;
    s.entry.cooldown = Duration::zero();
    let mut runtime = flow.runtime(vec![Engine::new(s)], RiskLimits::default());

    runtime.tick(flow.h.at(at(5))).await.unwrap();
    assert_eq!(runtime.seen().len(), 3);
    let ticket = runtime.engines()[0].pending_orders().next().unwrap().ticket;
    flow.h.venue.cancel(ticket).await.unwrap();

    // same records again: nothing new reaches the detector
    runtime.tick(flow.h.at(at(6))).await.unwrap();
    assert_eq!(runtime.engines()[0].pending_orders().count(), 0);
}

#[tokio::test]
async fn every_engine_sees_the_same_batch() {
    let flow = Flow::new();
    flow.three_buyers();
    let mut follow = cluster_hybrid::testkit::engine::named("beta", 7002);
    follow.direction.mode = DirectionMode::Follow;
    let engines = vec![Engine::new(settings()), Engine::new(follow)];
    let mut runtime = flow.runtime(engines, RiskLimits::default());

    runtime.tick(flow.h.at(at(5))).await.unwrap();

    let sides: Vec<_> = runtime
        .engines()
        .iter()
        .map(|engine| engine.pending_orders().next().unwrap().side)
        .collect();
    assert_eq!(sides, vec![Side::Sell, Side::Buy]);
}

#[tokio::test]
async fn feed_failure_still_snapshots_and_reports_error() {
    let flow = Flow::new();
    flow.feed.fail(true);
    let mut runtime = flow.runtime(vec![Engine::new(settings())], RiskLimits::default());

    let err = runtime.tick(flow.h.at(at(5))).await.unwrap_err();
    assert!(matches!(err, Error::Feed(FeedError::Status { status: 503 })));
    assert_eq!(flow.sink.count(), 1);
}

#[tokio::test]
async fn no_trade_zone_flattens_once_and_blocks_entries() {
    let flow = Flow::new();
    flow.three_buyers();
    let mut runtime = flow.runtime(vec![Engine::new(settings())], RiskLimits::default());
    runtime.tick(flow.h.at(at(5))).await.unwrap();
    flow.h.market.set_quote(dec!(2000.70), dec!(2000.90));
    runtime.tick(flow.h.at(at(6))).await.unwrap();
    assert_eq!(runtime.engines()[0].positions().count(), 1);

    flow.h.calendar.set_block(Some("cpi"));
    let outcome = runtime.tick(flow.h.at(at(7))).await.unwrap();
    assert_eq!(outcome, TickOutcome::Blocked("cpi".into()));
    assert_eq!(runtime.active_zone(), Some("cpi"));
    assert_eq!(runtime.engines()[0].positions().count(), 0);
    assert!(flow
        .h
        .venue
        .list_open_positions(EngineId::new(7001))
        .await
        .unwrap()
        .is_empty());

    flow.h.calendar.set_block(None);
    assert_eq!(runtime.tick(flow.h.at(at(8))).await.unwrap(), TickOutcome::Continue);
    assert_eq!(runtime.active_zone(), None);
}

#[tokio::test]
async fn engine_loss_limit_flattens_and_halts() {
    let flow = Flow::new();
    flow.three_buyers();
    let limits = RiskLimits {
        total: Some(dec!(1000)),
        per_engine: Some(dec!(20)),
    };
    let mut runtime = flow.runtime(vec![Engine::new(settings())], limits);

    runtime.tick(flow.h.at(at(5))).await.unwrap();
    flow.h.market.set_quote(dec!(2000.70), dec!(2000.90));
    assert_eq!(runtime.tick(flow.h.at(at(6))).await.unwrap(), TickOutcome::Continue);

    // short from 2000.70, ask 2002.70: -2.00 * 0.1 lots * 100 = -20
    flow.h.market.set_quote(dec!(2002.50), dec!(2002.70));
    let outcome = runtime.tick(flow.h.at(at(7))).await.unwrap();

    let TickOutcome::Halted(RiskError::EngineLimitBreached { engine, pnl, .. }) = outcome else {
        panic!("expected an engine breach, got {outcome:?}");
    };
    assert_eq!(engine, "alpha");
    assert_eq!(pnl, dec!(-20));
    assert_eq!(runtime.engines()[0].positions().count(), 0);
    assert!(flow.sink.last().unwrap().halted.is_some());
}

#[tokio::test]
async fn run_returns_halted_when_breaker_is_latched() {
    let flow = Flow::new();
    let supervisor = RiskSupervisor::new(RiskLimits::default(), chrono_tz::UTC);
    let _ = supervisor.evaluate_pnl([EnginePnl {
        name: "alpha",
        magic: EngineId::new(7001),
        pnl: dec!(-600),
    }]);
    let runtime = flow.runtime_with(vec![Engine::new(settings())], supervisor);
    let (_tx, rx) = watch::channel(false);

    let outcome = tokio::time::timeout(StdDuration::from_secs(5), runtime.run(rx))
        .await
        .unwrap();
    assert!(matches!(outcome, RunOutcome::Halted(RiskError::EngineLimitBreached { .. })));
}

#[tokio::test]
async fn run_stops_on_shutdown_signal() {
    let flow = Flow::new();
    let runtime = flow.runtime(vec![Engine::new(settings())], RiskLimits::default());
    let (tx, rx) = watch::channel(false);

    let handle = tokio::spawn(runtime.run(rx));
    tokio::time::sleep(StdDuration::from_millis(30)).await;
    tx.send(true).unwrap();

    let outcome = tokio::time::timeout(StdDuration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(outcome, RunOutcome::Stopped);
    assert!(flow.feed.fetch_count() >= 1);
}
