use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::id::{EngineId, Ticket};

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

/// Execution venue errors.
///
/// Every variant is treated as transient by the lifecycle engine: the action
/// is skipped and retried on the next tick.
#[derive(Error, Debug)]
pub enum VenueError {
    #[error("order rejected: {0}")]
    Rejected(String),

    #[error("ticket {0} not found")]
    NotFound(Ticket),

    #[error("venue unavailable: {0}")]
    Unavailable(String),
}

/// Event feed errors.
#[derive(Error, Debug)]
pub enum FeedError {
    #[error("feed rejected request with status {status}")]
    Status { status: u16 },

    #[error("unexpected feed payload: {0}")]
    Payload(String),
}

/// Daily loss limit breaches reported by the risk supervisor.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RiskError {
    #[error("engine {engine} ({magic}) daily pnl {pnl} <= -{limit}")]
    EngineLimitBreached {
        engine: String,
        magic: EngineId,
        pnl: Decimal,
        limit: Decimal,
    },

    #[error("total daily pnl {pnl} <= -{limit}")]
    TotalLimitBreached { pnl: Decimal, limit: Decimal },
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Venue(#[from] VenueError),

    #[error(transparent)]
    Feed(#[from] FeedError),

    #[error(transparent)]
    Risk(#[from] RiskError),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("parse error: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, Error>;
