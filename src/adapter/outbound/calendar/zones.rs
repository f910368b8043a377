use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use parking_lot::Mutex;
use serde::Deserialize;
use tracing::warn;

use super::session::SessionWindow;
use crate::port::SessionCalendar;

const ZONE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";
const DEFAULT_REASON: &str = "no_trade_zone";

/// A closed interval during which the bot holds no exposure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoTradeZone {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub reason: String,
}

impl NoTradeZone {
    #[must_use]
    pub fn contains(&self, now: DateTime<Utc>) -> bool {
        self.start <= now && now <= self.end
    }
}

#[derive(Debug, Deserialize)]
struct ZoneEntry {
    start_local: String,
    end_local: String,
    #[serde(default)]
    reason: Option<String>,
}

fn local_to_utc(value: &str, tz: Tz) -> Option<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(value.trim(), ZONE_TIME_FORMAT).ok()?;
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
}

/// Parse a zones document. Malformed entries are skipped with a warning.
pub(crate) fn parse_zones(json: &str, tz: Tz) -> Vec<NoTradeZone> {
    let entries: Vec<serde_json::Value> = match serde_json::from_str(json) {
        Ok(serde_json::Value::Array(entries)) => entries,
        Ok(_) => {
            warn!("No-trade zones file is not a JSON list, ignoring");
            return Vec::new();
        }
        Err(e) => {
            warn!(error = %e, "Failed to parse no-trade zones file");
            return Vec::new();
        }
    };

    entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| {
            let zone = serde_json::from_value::<ZoneEntry>(value).ok().and_then(|entry| {
                Some(NoTradeZone {
                    start: local_to_utc(&entry.start_local, tz)?,
                    end: local_to_utc(&entry.end_local, tz)?,
                    reason: entry.reason.unwrap_or_else(|| DEFAULT_REASON.to_string()),
                })
            });
            if zone.is_none() {
                warn!(index, "Skipping malformed no-trade zone");
            }
            zone
        })
        .collect()
}

/// Session window plus a no-trade zones file reloaded on every refresh.
pub struct FileCalendar {
    tz: Tz,
    session: Option<SessionWindow>,
    zones_path: Option<PathBuf>,
    zones: Mutex<Vec<NoTradeZone>>,
}

impl FileCalendar {
    #[must_use]
    pub fn new(tz: Tz, session: Option<SessionWindow>, zones_path: Option<PathBuf>) -> Self {
        let calendar = Self {
            tz,
            session,
            zones_path,
            zones: Mutex::new(Vec::new()),
        };
        calendar.refresh();
        calendar
    }

    fn load(&self) -> Vec<NoTradeZone> {
        let Some(path) = &self.zones_path else {
            return Vec::new();
        };
        match fs::read_to_string(path) {
            Ok(json) => parse_zones(&json, self.tz),
            Err(e) if e.kind() == ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read no-trade zones file");
                Vec::new()
            }
        }
    }

    #[must_use]
    pub fn zones(&self) -> Vec<NoTradeZone> {
        self.zones.lock().clone()
    }
}

impl SessionCalendar for FileCalendar {
    fn refresh(&self) {
        let zones = self.load();
        *self.zones.lock() = zones;
    }

    fn active_block_reason(&self, now: DateTime<Utc>) -> Option<String> {
        self.zones
            .lock()
            .iter()
            .find(|zone| zone.contains(now))
            .map(|zone| zone.reason.clone())
    }

    fn within_session(&self, now: DateTime<Utc>) -> bool {
        self.session
            .map_or(true, |window| window.contains(now.with_timezone(&self.tz).time()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const LONDON: Tz = chrono_tz::Europe::London;

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn zones_are_read_in_local_time() {
        let zones = parse_zones(
            r#"[{"start_local":"2024-07-10 13:00","end_local":"2024-07-10 14:00","reason":"CPI"}]"#,
            LONDON,
        );
        assert_eq!(zones.len(), 1);
        // BST: local 13:00 is 12:00 UTC.
        assert_eq!(zones[0].start, utc("2024-07-10T12:00:00Z"));
        assert!(zones[0].contains(utc("2024-07-10T13:00:00Z")));
        assert!(!zones[0].contains(utc("2024-07-10T13:00:01Z")));
    }

    #[test]
    fn malformed_entries_are_skipped() {
        let zones = parse_zones(
            r#"[
                {"start_local":"2024-07-10 13:00","end_local":"2024-07-10 14:00"},
                {"start_local":"tomorrow","end_local":"2024-07-10 14:00"},
                {"reason":"missing times"},
                42
            ]"#,
            LONDON,
        );
        assert_eq!(zones.len(), 1);
        assert_eq!(zones[0].reason, DEFAULT_REASON);
    }

    #[test]
    fn non_list_document_yields_no_zones() {
        assert!(parse_zones(r#"{"zones":[]}"#, LONDON).is_empty());
        assert!(parse_zones("not json", LONDON).is_empty());
    }

    #[test]
    fn calendar_reloads_file_on_refresh() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[]").unwrap();
        let calendar = FileCalendar::new(LONDON, None, Some(file.path().to_path_buf()));
        let now = utc("2024-07-10T12:30:00Z");
        assert!(calendar.is_trading_allowed(now));

        fs::write(
            file.path(),
            r#"[{"start_local":"2024-07-10 13:00","end_local":"2024-07-10 14:00","reason":"CPI"}]"#,
        )
        .unwrap();
        calendar.refresh();
        assert_eq!(calendar.active_block_reason(now).as_deref(), Some("CPI"));
        assert!(!calendar.is_trading_allowed(now));
    }

    #[test]
    fn missing_file_means_no_zones() {
        let calendar = FileCalendar::new(LONDON, None, Some(PathBuf::from("/nonexistent/zones.json")));
        assert!(calendar.zones().is_empty());
    }

    #[test]
    fn session_uses_calendar_zone() {
        let window: SessionWindow = "08:00-18:00".parse().unwrap();
        let calendar = FileCalendar::new(LONDON, Some(window), None);
        // 07:30 UTC is 08:30 BST.
        assert!(calendar.within_session(utc("2024-07-10T07:30:00Z")));
        assert!(!calendar.within_session(utc("2024-07-10T17:30:00Z")));
    }
}
