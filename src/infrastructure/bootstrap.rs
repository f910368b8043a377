//! Composition root: build adapters and engines from configuration.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::adapter::outbound::bridge::BridgeClient;
use crate::adapter::outbound::calendar::FileCalendar;
use crate::adapter::outbound::paper::PaperVenue;
use crate::adapter::outbound::sirix::SirixFeed;
use crate::adapter::outbound::status_file::StatusFileWriter;
use crate::application::dedup::SeenOrders;
use crate::application::engine::Engine;
use crate::application::intake::Intake;
use crate::application::risk::RiskSupervisor;
use crate::domain::OrderRef;
use crate::error::{ConfigError, Result};
use crate::infrastructure::config::settings::Config;
use crate::infrastructure::runtime::{Adapters, Runtime, RuntimeSettings};
use crate::port::{EventFeed, ExecutionVenue, MarketData, SessionCalendar, SnapshotSink};

/// Build the live adapters.
///
/// The bridge always serves market data. In dry-run mode orders go to a
/// paper venue priced from that market data instead of the bridge.
///
/// # Errors
///
/// Fails when the feed token is missing, an endpoint is invalid, or the
/// instrument cannot be fetched for the paper venue.
pub async fn build_adapters(config: &Config) -> Result<Adapters> {
    let token = config.feed_token.clone().ok_or(ConfigError::MissingField {
        field: "feed.token_env",
    })?;
    let feed: Arc<dyn EventFeed> = Arc::new(SirixFeed::new(&config.feed, token));

    let bridge = Arc::new(BridgeClient::new(
        &config.venue.bridge,
        config.symbol.as_str(),
        config.bridge_token.clone(),
    )?);
    let market: Arc<dyn MarketData> = bridge.clone();

    let venue: Arc<dyn ExecutionVenue> = if config.dry_run {
        let instrument = bridge.instrument().await?;
        info!(
            balance = %config.venue.paper.balance,
            "Dry run: orders are simulated on a paper account"
        );
        Arc::new(PaperVenue::new(instrument, Arc::clone(&market), &config.venue.paper))
    } else {
        bridge
    };

    let calendar: Arc<dyn SessionCalendar> = Arc::new(FileCalendar::new(
        config.session_tz()?,
        config.session_window()?,
        config.session.no_trade_zones.clone(),
    ));

    let snapshot = config.snapshot.enabled.then(|| {
        Arc::new(StatusFileWriter::new(config.snapshot.path.clone())) as Arc<dyn SnapshotSink>
    });

    Ok(Adapters {
        feed,
        venue,
        market,
        calendar,
        snapshot,
    })
}

/// Wire a runtime from configuration and ready adapters.
///
/// Every order id currently visible on the feed is marked seen, so only
/// opens after startup can form clusters. A failing bootstrap fetch starts
/// with an empty cache.
///
/// # Errors
///
/// Fails when the instrument cannot be fetched or a configured time zone is
/// invalid.
pub async fn build_runtime(config: &Config, adapters: Adapters) -> Result<Runtime> {
    let now = Utc::now();
    let settings = RuntimeSettings::from_config(config);

    let instrument = adapters.venue.instrument().await?;
    info!(
        symbol = %instrument.symbol,
        digits = instrument.digits,
        point = %instrument.point,
        stops_level = instrument.stops_level,
        contract_size = %instrument.contract_size,
        "Instrument loaded"
    );

    let intake = Intake::new(config.symbol.as_str(), config.source_tz()?);
    let mut seen = SeenOrders::new(config.timing.seen_max_age());
    match adapters.feed.fetch(settings.lookback).await {
        Ok(raws) => {
            let ids = raws
                .into_iter()
                .filter(|raw| raw.instrument == config.symbol && !raw.order_id.is_empty())
                .map(|raw| OrderRef::new(raw.order_id));
            let count = seen.bootstrap(ids, now);
            info!(feed = adapters.feed.name(), count, "Bootstrapped seen orders");
        }
        Err(e) => warn!(error = %e, "Seen-order bootstrap failed, starting empty"),
    }

    let engines: Vec<Engine> = config.engine_settings().into_iter().map(Engine::new).collect();
    for engine in &engines {
        let s = engine.settings();
        info!(
            engine = %s.name,
            magic = %s.magic,
            window_secs = s.window.num_seconds(),
            threshold = s.threshold,
            direction = ?s.direction.mode,
            stop_mode = ?s.stops.mode,
            "Engine configured"
        );
    }

    let supervisor = RiskSupervisor::new(config.risk.clone().into(), config.day_tz()?);

    Ok(Runtime::new(
        settings, adapters, instrument, intake, seen, engines, supervisor,
    ))
}
