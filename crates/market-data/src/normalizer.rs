//! Unit normalization onto the canonical per-100 basis.
//!
//! Sources quote either per 1 or per 100 foreign units. Every price leg and
//! the reference price are rescaled together by `100 / base_unit`, and the
//! quote is re-labelled `BaseUnit::Hundred`, so normalizing twice is a no-op.

use rust_decimal::Decimal;

use crate::models::{BaseUnit, Quote};

/// Rescale a quote to per-100 units.
pub fn normalize(quote: Quote) -> Quote {
    let factor = Decimal::ONE_HUNDRED / quote.base_unit.units();
    if factor == Decimal::ONE {
        return quote;
    }

    let scale = |price: Option<Decimal>| price.map(|p| p * factor);
    Quote {
        buy_spot: scale(quote.buy_spot),
        buy_cash: scale(quote.buy_cash),
        sell_spot: scale(quote.sell_spot),
        sell_cash: scale(quote.sell_cash),
        reference: scale(quote.reference),
        base_unit: BaseUnit::Hundred,
        ..quote
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::borrow::Cow;

    fn sample(base_unit: BaseUnit) -> Quote {
        let mut quote = Quote::new(Cow::Borrowed("TEST"), "日元");
        quote.buy_spot = Some(dec!(4.85));
        quote.buy_cash = None;
        quote.sell_spot = Some(dec!(13.50));
        quote.sell_cash = Some(dec!(5.02));
        quote.reference = Some(dec!(4.9));
        quote.base_unit = base_unit;
        quote
    }

    #[test]
    fn test_per_hundred_is_identity() {
        let quote = sample(BaseUnit::Hundred);
        assert_eq!(normalize(quote.clone()), quote);
    }

    #[test]
    fn test_per_unit_scales_every_leg() {
        let normalized = normalize(sample(BaseUnit::One));
        assert_eq!(normalized.buy_spot, Some(dec!(485)));
        assert_eq!(normalized.buy_cash, None);
        assert_eq!(normalized.sell_spot, Some(dec!(1350.00)));
        assert_eq!(normalized.sell_cash, Some(dec!(502)));
        assert_eq!(normalized.reference, Some(dec!(490)));
        assert_eq!(normalized.base_unit, BaseUnit::Hundred);
    }

    #[test]
    fn test_idempotent() {
        let once = normalize(sample(BaseUnit::One));
        let twice = normalize(once.clone());
        assert_eq!(once, twice);
    }
}
