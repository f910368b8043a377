//! Trait definitions (hexagonal ports).
//!
//! Ports are the seams between the decision core in `application` and the
//! outside world. The core never talks to HTTP, files or clocks directly;
//! adapters under `adapter::outbound` implement these traits.
//!
//! # Available Ports
//!
//! - [`EventFeed`](outbound::feed::EventFeed) - Raw participant trade opens
//! - [`ExecutionVenue`](outbound::venue::ExecutionVenue) - Orders, positions, P&L
//! - [`MarketData`](outbound::market::MarketData) - Quotes and OHLCV bars
//! - [`SessionCalendar`](outbound::calendar::SessionCalendar) - Trading hours and no-trade zones
//! - [`SnapshotSink`](outbound::snapshot::SnapshotSink) - Monitoring state dump

pub mod outbound;

pub use outbound::calendar::SessionCalendar;
pub use outbound::feed::{EventFeed, RawEvent};
pub use outbound::market::MarketData;
pub use outbound::snapshot::SnapshotSink;
pub use outbound::venue::{ExecutionVenue, VenuePosition};
