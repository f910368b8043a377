use std::str::FromStr;

use chrono::NaiveTime;

use crate::error::Error;

/// Daily trading window in local time, both ends inclusive. A window whose
/// end is not after its start runs overnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl SessionWindow {
    #[must_use]
    pub const fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    #[must_use]
    pub fn contains(&self, local: NaiveTime) -> bool {
        if self.is_overnight() {
            local >= self.start || local <= self.end
        } else {
            self.start <= local && local <= self.end
        }
    }

    #[must_use]
    pub fn is_overnight(&self) -> bool {
        self.end <= self.start
    }
}

/// Parse `HH:MM`.
fn parse_hhmm(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M").ok()
}

impl FromStr for SessionWindow {
    type Err = Error;

    /// Parse `HH:MM-HH:MM`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (start, end) = s
            .split_once('-')
            .ok_or_else(|| Error::Parse(format!("session window '{s}' is not HH:MM-HH:MM")))?;
        match (parse_hhmm(start), parse_hhmm(end)) {
            (Some(start), Some(end)) => Ok(Self::new(start, end)),
            _ => Err(Error::Parse(format!("session window '{s}' is not HH:MM-HH:MM"))),
        }
    }
}
