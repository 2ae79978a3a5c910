//! Assorted helper functions for the TapToSell engine.
use tts_common::Money;

/// Calculates what a dropshipper pays for a product: the supplier's listed price marked up by the
/// platform commission, given in basis points (500 = 5%).
///
/// The result truncates towards zero, so the platform's cut is never rounded up at the buyer's
/// expense.
pub fn buyer_cost(price: Money, commission_bps: i64) -> Money {
    Money::from_cents(price.value() * (10_000 + commission_bps) / 10_000)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn five_percent_markup() {
        // RM10.00 at 5% -> RM10.50
        assert_eq!(buyer_cost(Money::from_rm(10), 500), Money::from_cents(1050));
    }

    #[test]
    fn markup_truncates() {
        // 999 sen at 5% is 1048.95 sen; the buyer pays 1048.
        assert_eq!(buyer_cost(Money::from_cents(999), 500), Money::from_cents(1048));
    }

    #[test]
    fn zero_commission_is_identity() {
        assert_eq!(buyer_cost(Money::from_cents(12345), 0), Money::from_cents(12345));
    }

    #[test]
    fn zero_price_stays_zero() {
        assert_eq!(buyer_cost(Money::default(), 500), Money::default());
    }
}
