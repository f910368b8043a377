//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`domain`] - Builders for instruments, events, raw feed records and bars.
//! - [`engine`] - Canonical engine settings.
//! - [`market`] - [`ScriptedMarket`](market::ScriptedMarket), settable quote and bars.
//! - [`feed`] - [`ScriptedFeed`](feed::ScriptedFeed), settable feed records.
//! - [`calendar`] - [`StaticCalendar`](calendar::StaticCalendar), switchable session and zones.
//! - [`sink`] - [`MemorySink`](sink::MemorySink), keeps every snapshot written.

pub mod calendar;
pub mod domain;
pub mod engine;
pub mod feed;
pub mod market;
pub mod sink;
