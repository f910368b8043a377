//! SiRiX open-positions feed.
//!
//! Polls the management API for positions opened by the configured groups
//! and hands them to intake as [`RawEvent`](crate::port::RawEvent)s.

pub mod client;
pub mod dto;
pub mod settings;

pub use client::SirixFeed;
pub use settings::SirixConfig;
