//! Cluster detection over participant trade opens.
//!
//! - [`detector`]: per-engine rolling window with threshold and refractory gate

pub mod detector;

pub use detector::{ClusterDetector, ClusterSummary};
