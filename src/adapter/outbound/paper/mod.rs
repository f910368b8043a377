//! In-memory paper venue.
//!
//! Simulates a broker for dry runs and tests: resting limit orders fill
//! when the quote crosses them, open positions close at their stop or
//! target, and closed deals accumulate realized P&L per engine. Prices come
//! from a [`MarketData`](crate::port::MarketData) source.

mod venue;

pub use venue::{PaperConfig, PaperVenue};
