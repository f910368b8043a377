//! JSON state file for external monitoring.
//!
//! Each snapshot replaces the file atomically so readers never observe a
//! partial document.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::application::snapshot::Snapshot;
use crate::error::Result;
use crate::port::SnapshotSink;

/// Writes snapshots to a fixed path.
pub struct StatusFileWriter {
    path: PathBuf,
}

impl StatusFileWriter {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotSink for StatusFileWriter {
    /// Write-to-temp-then-rename. Creates the parent directory if missing.
    #[allow(clippy::result_large_err)]
    fn write(&self, snapshot: &Snapshot) -> Result<()> {
        let json = serde_json::to_string_pretty(snapshot)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let temp_path = self.path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path)?;

        let cleanup_and_err = |e| {
            let _ = fs::remove_file(&temp_path);
            e
        };

        file.write_all(json.as_bytes()).map_err(cleanup_and_err)?;
        file.sync_all().map_err(cleanup_and_err)?;
        fs::rename(&temp_path, &self.path).map_err(cleanup_and_err)?;

        Ok(())
    }
}
