//! cluster-hybrid - cluster follow/fade trading engine.
//!
//! Watches a feed of third-party trade opens, detects when enough distinct
//! participants pile onto one side within a rolling window, decides whether
//! to follow or fade that crowd, and manages the resulting limit order and
//! position through fill, trailing stop, breakeven and time exit. A
//! supervisor across all engines flattens everything and halts when a daily
//! loss limit is hit.
//!
//! # Architecture
//!
//! Hexagonal layout:
//!
//! - [`domain`] - Plain data: events, orders, positions, instrument grids
//! - [`port`] - Traits for the feed, venue, market data, calendar and snapshot sink
//! - [`application`] - Cluster detection, direction decision, engine lifecycle,
//!   risk supervision, intake and de-duplication
//! - [`adapter`] - SiRiX feed, bridge REST venue, paper venue, calendar,
//!   status file and the CLI
//! - [`infrastructure`] - Configuration, wiring and the polling loop
//!
//! # Features
//!
//! - `testkit` - Scripted feed, market data and calendar for integration tests

pub mod adapter;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
