//! Snapshot sink port for external monitoring.

use crate::application::snapshot::Snapshot;
use crate::error::Result;

/// Consumer of the per-tick state snapshot.
///
/// Callers log and discard errors; a failing sink never affects trading.
pub trait SnapshotSink: Send + Sync {
    fn write(&self, snapshot: &Snapshot) -> Result<()>;
}
