//! Outbound adapters (driven side).

pub mod bridge;
pub mod calendar;
pub mod http;
pub mod paper;
pub mod sirix;
pub mod status_file;
