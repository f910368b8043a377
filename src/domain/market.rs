//! Market data primitives: top-of-book quote and OHLCV bars.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::money::{Price, Volume};

/// Best bid and ask for the traded instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub bid: Price,
    pub ask: Price,
}

impl Quote {
    #[must_use]
    pub const fn new(bid: Price, ask: Price) -> Self {
        Self { bid, ask }
    }

    /// Quote with bid and ask both set to `price`, used when only a last
    /// trade or bar close is known.
    #[must_use]
    pub const fn flat(price: Price) -> Self {
        Self {
            bid: price,
            ask: price,
        }
    }

    #[must_use]
    pub fn mid(&self) -> Price {
        (self.bid + self.ask) / Decimal::TWO
    }
}

/// One OHLCV bar. `time` is the bar open time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bar {
    pub time: DateTime<Utc>,
    pub open: Price,
    pub high: Price,
    pub low: Price,
    pub close: Price,
    pub volume: Volume,
}

impl Bar {
    /// `(high + low + close) / 3`.
    #[must_use]
    pub fn typical_price(&self) -> Price {
        (self.high + self.low + self.close) / Decimal::from(3)
    }

    #[must_use]
    pub fn range(&self) -> Price {
        self.high - self.low
    }
}
