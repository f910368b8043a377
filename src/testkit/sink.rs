//! In-memory [`SnapshotSink`] for tests.

use parking_lot::Mutex;

use crate::application::snapshot::Snapshot;
use crate::error::Result;
use crate::port::SnapshotSink;

/// Keeps every snapshot written.
#[derive(Default)]
pub struct MemorySink {
    written: Mutex<Vec<Snapshot>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<Snapshot> {
        self.written.lock().last().cloned()
    }

    pub fn count(&self) -> usize {
        self.written.lock().len()
    }
}

impl SnapshotSink for MemorySink {
    fn write(&self, snapshot: &Snapshot) -> Result<()> {
        self.written.lock().push(snapshot.clone());
        Ok(())
    }
}
