//! Session calendar port.

use chrono::{DateTime, Utc};

/// Decides whether new entries are allowed at a given instant.
pub trait SessionCalendar: Send + Sync {
    /// Reload any external schedule data. Called once per tick; failures are
    /// handled inside the implementation.
    fn refresh(&self) {}

    /// Reason of the no-trade zone covering `now`, if any.
    fn active_block_reason(&self, now: DateTime<Utc>) -> Option<String>;

    /// Whether `now` lies inside the trading session.
    fn within_session(&self, now: DateTime<Utc>) -> bool;

    /// Inside the session and outside every no-trade zone.
    fn is_trading_allowed(&self, now: DateTime<Utc>) -> bool {
        self.within_session(now) && self.active_block_reason(now).is_none()
    }
}
