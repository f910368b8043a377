//! CLI output formatting.
//!
//! Human-readable lines with colored markers, or one JSON object per line
//! when `--json` is set. Quiet mode drops informational lines; warnings and
//! errors always print.

use std::fmt::Display;
use std::sync::OnceLock;

use owo_colors::{OwoColorize, Stream};
use parking_lot::RwLock;
use serde_json::{json, Value};

const APP: &str = "cluster-hybrid";

/// Output mode chosen by the global CLI flags.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputConfig {
    pub json: bool,
    pub quiet: bool,
}

impl OutputConfig {
    #[must_use]
    pub const fn new(json: bool, quiet: bool) -> Self {
        Self { json, quiet }
    }

    const fn drops_info(self) -> bool {
        self.quiet && !self.json
    }
}

static MODE: OnceLock<RwLock<OutputConfig>> = OnceLock::new();

fn mode() -> OutputConfig {
    *MODE.get_or_init(RwLock::default).read()
}

pub fn configure(config: OutputConfig) {
    *MODE.get_or_init(RwLock::default).write() = config;
}

#[must_use]
pub fn is_json() -> bool {
    mode().json
}

/// Line importance; only `Info` is subject to quiet mode.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Level {
    Info,
    Warn,
    Error,
}

fn emit(level: Level, kind: &str, payload: Value, text: impl FnOnce() -> String) {
    let config = mode();
    if config.json {
        let line = json!({ "type": kind, "payload": payload });
        if level == Level::Error {
            eprintln!("{line}");
        } else {
            println!("{line}");
        }
        return;
    }
    match level {
        Level::Info if config.drops_info() => {}
        Level::Error => eprintln!("{}", text()),
        _ => println!("{}", text()),
    }
}

/// Application name and version, followed by a blank line.
pub fn header(version: &str) {
    emit(
        Level::Info,
        "header",
        json!({ "app": APP, "version": version }),
        || format!(
            "{} {}\n",
            APP.if_supports_color(Stream::Stdout, |t| t.bold()),
            version.if_supports_color(Stream::Stdout, |t| t.dimmed()),
        ),
    );
}

/// Labeled value, aligned under the current section.
pub fn field(label: &str, value: impl Display) {
    let value = value.to_string();
    emit(
        Level::Info,
        "field",
        json!({ "label": label, "value": &value }),
        || format!(
            "  {:<14} {}",
            label.if_supports_color(Stream::Stdout, |t| t.dimmed()),
            value,
        ),
    );
}

pub fn section(title: &str) {
    emit(Level::Info, "section", json!({ "title": title }), || {
        format!("\n{}", title.if_supports_color(Stream::Stdout, |t| t.bold()))
    });
}

pub fn success(message: &str) {
    emit(Level::Info, "success", json!({ "message": message }), || {
        format!("  {} {}", "✓".if_supports_color(Stream::Stdout, |t| t.green()), message)
    });
}

pub fn warning(message: &str) {
    emit(Level::Warn, "warning", json!({ "message": message }), || {
        format!("  {} {}", "⚠".if_supports_color(Stream::Stdout, |t| t.yellow()), message)
    });
}

/// Printed to stderr in both modes.
pub fn error(message: &str) {
    emit(Level::Error, "error", json!({ "message": message }), || {
        format!("  {} {}", "×".if_supports_color(Stream::Stderr, |t| t.red()), message)
    });
}

/// Cyan in text mode, plain in JSON mode.
pub fn highlight(value: impl Display) -> String {
    let value = value.to_string();
    if is_json() {
        return value;
    }
    value.if_supports_color(Stream::Stdout, |t| t.cyan()).to_string()
}

pub fn muted(value: impl Display) -> String {
    let value = value.to_string();
    if is_json() {
        return value;
    }
    value.if_supports_color(Stream::Stdout, |t| t.dimmed()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_drops_info_only_in_text_mode() {
        assert!(OutputConfig::new(false, true).drops_info());
        assert!(!OutputConfig::new(true, true).drops_info());
        assert!(!OutputConfig::new(false, false).drops_info());
    }
}
