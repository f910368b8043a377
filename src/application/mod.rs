//! Application logic.
//!
//! Pure decision code (cluster detection, direction, indicators, sizing,
//! intake) plus the per-engine lifecycle and the risk supervisor that drive
//! the outbound ports.

pub mod cluster;
pub mod dedup;
pub mod direction;
pub mod engine;
pub mod indicator;
pub mod intake;
pub mod risk;
pub mod sizing;
pub mod snapshot;
