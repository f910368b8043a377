//! Event feed port for third-party trade opens.

use async_trait::async_trait;
use chrono::Duration;

use crate::domain::{Price, Volume};
use crate::error::Result;

/// One open-position record as delivered by the feed, before intake.
///
/// `open_time` is kept verbatim: it may carry an offset or be naive, in
/// which case intake interprets it in the feed's source time zone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEvent {
    pub order_id: String,
    pub participant_id: String,
    pub instrument: String,
    /// Platform action code: `0` buy, `1`/`2` sell.
    pub action_type: Option<i64>,
    pub open_price: Price,
    pub stop_loss: Option<Price>,
    pub take_profit: Option<Price>,
    pub size: Volume,
    pub open_time: String,
}

/// Source of participant trade opens.
#[async_trait]
pub trait EventFeed: Send + Sync {
    /// Fetch every position opened within `lookback` of now.
    async fn fetch(&self, lookback: Duration) -> Result<Vec<RawEvent>>;

    /// Feed name for logging.
    fn name(&self) -> &'static str;
}
