//! Monetary types for price, volume and P&L representation.

use rust_decimal::Decimal;

/// Price represented as a Decimal for precision.
pub type Price = Decimal;

/// Volume (lots) represented as a Decimal for precision.
pub type Volume = Decimal;

/// Profit and loss in account currency.
pub type Pnl = Decimal;

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn price_volume_and_pnl_are_decimal() {
        let price: Price = dec!(2350.25);
        let volume: Volume = dec!(0.10);
        let pnl: Pnl = dec!(-12.5);

        assert_eq!(price * volume + pnl, dec!(222.525));
    }
}
