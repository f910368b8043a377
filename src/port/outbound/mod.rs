//! Outbound ports (driven side): interfaces implemented by outbound adapters.

pub mod calendar;
pub mod feed;
pub mod market;
pub mod snapshot;
pub mod venue;
