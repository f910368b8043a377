//! Market data port: top-of-book quote and recent one-minute bars.

use async_trait::async_trait;

use crate::domain::{Bar, Quote};
use crate::error::Result;

#[async_trait]
pub trait MarketData: Send + Sync {
    /// Live quote, or `None` when the venue has no valid tick.
    async fn current_quote(&self) -> Result<Option<Quote>>;

    /// Up to `count` most recent bars, oldest first. The last bar may still
    /// be forming.
    async fn recent_bars(&self, count: usize) -> Result<Vec<Bar>>;
}
