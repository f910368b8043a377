//! Logging configuration and initialization.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Deserialize;
use tracing_subscriber::fmt::{self, MakeWriter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
    /// Console format: `pretty` or `json`.
    #[serde(default = "default_format")]
    pub format: String,
    /// Optional JSONL file receiving every event.
    #[serde(default)]
    pub file: Option<PathBuf>,
}

fn default_level() -> String {
    "info".into()
}

fn default_format() -> String {
    "pretty".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: default_format(),
            file: None,
        }
    }
}

/// Buffered, shareable JSONL file writer.
#[derive(Clone)]
struct FileSink(Arc<Mutex<BufWriter<File>>>);

impl Write for FileSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.lock().flush()
    }
}

impl<'a> MakeWriter<'a> for FileSink {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Owner of the logging sinks. Flushes the file sink on `flush`, `close`
/// and drop.
#[must_use = "dropping the handle closes the log file"]
pub struct LogHandle {
    file: Option<FileSink>,
}

impl LogHandle {
    pub fn flush(&self) {
        if let Some(sink) = &self.file {
            let _ = sink.0.lock().flush();
        }
    }

    /// Flush buffered file output and release the handle's reference to the
    /// sink. Called once on shutdown.
    pub fn close(&mut self) {
        self.flush();
        self.file = None;
    }
}

impl Drop for LogHandle {
    fn drop(&mut self) {
        self.flush();
    }
}

impl LoggingConfig {
    fn open_file(&self) -> Option<FileSink> {
        let path = self.file.as_ref()?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                let _ = fs::create_dir_all(parent);
            }
        }
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => Some(FileSink(Arc::new(Mutex::new(BufWriter::new(file))))),
            Err(e) => {
                eprintln!("Failed to open log file {}: {e}", path.display());
                None
            }
        }
    }

    /// Initialize the tracing subscriber with this logging configuration.
    ///
    /// A second call in the same process keeps the first subscriber.
    pub fn init(&self) -> LogHandle {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level));

        let console: Box<dyn Layer<Registry> + Send + Sync> = match self.format.as_str() {
            "json" => fmt::layer().json().boxed(),
            _ => fmt::layer().boxed(),
        };

        let file = self.open_file();
        let file_layer = file
            .clone()
            .map(|sink| fmt::layer().json().with_ansi(false).with_writer(sink));

        let _ = tracing_subscriber::registry()
            .with(console)
            .with(file_layer)
            .with(filter)
            .try_init();

        LogHandle { file }
    }
}
