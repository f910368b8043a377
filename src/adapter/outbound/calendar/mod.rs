//! File-backed session calendar.
//!
//! Combines an optional daily trading window with a JSON list of no-trade
//! zones that operators may edit while the bot runs.

mod session;
mod zones;

pub use session::SessionWindow;
pub use zones::{FileCalendar, NoTradeZone};
