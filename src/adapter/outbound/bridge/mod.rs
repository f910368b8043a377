//! JSON/REST broker bridge.
//!
//! A thin HTTP service in front of the trading terminal exposes symbol
//! data, quotes, bars, orders, positions and deal history. One client
//! implements both [`ExecutionVenue`](crate::port::ExecutionVenue) and
//! [`MarketData`](crate::port::MarketData) for the configured symbol.

pub mod client;
pub mod dto;
pub mod settings;

pub use client::BridgeClient;
pub use settings::BridgeConfig;
