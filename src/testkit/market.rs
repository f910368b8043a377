//! Scripted [`MarketData`] for tests.

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::domain::{Bar, Price, Quote};
use crate::error::{Result, VenueError};
use crate::port::MarketData;

#[derive(Default)]
struct State {
    quote: Option<Quote>,
    bars: Vec<Bar>,
    fail_bars: bool,
}

/// Market data whose quote and bars tests set directly.
///
/// Starts without a quote and without bars.
#[derive(Default)]
pub struct ScriptedMarket {
    state: Mutex<State>,
}

impl ScriptedMarket {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_quote(&self, bid: Price, ask: Price) {
        self.state.lock().quote = Some(Quote::new(bid, ask));
    }

    pub fn clear_quote(&self) {
        self.state.lock().quote = None;
    }

    /// Replace the bar history, oldest first.
    pub fn set_bars(&self, bars: Vec<Bar>) {
        self.state.lock().bars = bars;
    }

    /// Make `recent_bars` fail until switched off.
    pub fn fail_bars(&self, fail: bool) {
        self.state.lock().fail_bars = fail;
    }
}

#[async_trait]
impl MarketData for ScriptedMarket {
    async fn current_quote(&self) -> Result<Option<Quote>> {
        Ok(self.state.lock().quote)
    }

    async fn recent_bars(&self, count: usize) -> Result<Vec<Bar>> {
        let state = self.state.lock();
        if state.fail_bars {
            return Err(VenueError::Unavailable("scripted bar failure".into()).into());
        }
        let skip = state.bars.len().saturating_sub(count);
        Ok(state.bars[skip..].to_vec())
    }
}
