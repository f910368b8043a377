//! Switchable [`SessionCalendar`] for tests.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::port::SessionCalendar;

struct State {
    in_session: bool,
    block: Option<String>,
}

/// Calendar whose session flag and no-trade zone tests toggle directly.
/// Starts in session with no zone.
pub struct StaticCalendar {
    state: Mutex<State>,
}

impl Default for StaticCalendar {
    fn default() -> Self {
        Self {
            state: Mutex::new(State {
                in_session: true,
                block: None,
            }),
        }
    }
}

impl StaticCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_in_session(&self, in_session: bool) {
        self.state.lock().in_session = in_session;
    }

    /// Enter (`Some`) or leave (`None`) a no-trade zone.
    pub fn set_block(&self, reason: Option<&str>) {
        self.state.lock().block = reason.map(str::to_string);
    }
}

impl SessionCalendar for StaticCalendar {
    fn active_block_reason(&self, _now: DateTime<Utc>) -> Option<String> {
        self.state.lock().block.clone()
    }

    fn within_session(&self, _now: DateTime<Utc>) -> bool {
        self.state.lock().in_session
    }
}
