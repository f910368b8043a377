//! Cross-engine daily loss supervision.
//!
//! The supervisor reads every engine's realized-plus-unrealized P&L and
//! trips a latched circuit breaker when a per-engine or total daily loss
//! limit is reached.

pub mod supervisor;

pub use supervisor::{EnginePnl, RiskLimits, RiskSupervisor, RiskVerdict};
