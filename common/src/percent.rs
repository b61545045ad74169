//! [`Percent`]-related definitions.

use std::str::FromStr;

use derive_more::Display;
use rust_decimal::Decimal;

use crate::Money;

/// Floating-point percentage.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub struct Percent(Decimal);

impl Percent {
    /// 100%.
    pub const HUNDRED: Self = Self(Decimal::ONE_HUNDRED);

    /// 0%.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Creates a new [`Percent`] by checking the provided values is
    /// greater than `0` and less than `100`.
    #[must_use]
    pub fn new(val: Decimal) -> Option<Self> {
        if val < Decimal::ZERO || val > Decimal::ONE_HUNDRED {
            None
        } else {
            #[expect(
                clippy::allow_attributes,
                reason = "TODO: Remove once clippy is fixed"
            )]
            #[allow(unsafe_code, reason = "invariants checked already")]
            Some(unsafe { Self::new_unchecked(val) })
        }
    }

    /// Creates a new [`Percent`] without performing any validation.
    ///
    /// # Safety
    ///
    /// The provided value must be greater than `0` and less than `100`.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(val: Decimal) -> Self {
        Self(val)
    }

    /// Creates a new [`Percent`] representing the relative discount of the
    /// `discounted` price against the `original` one.
    ///
    /// `original = 100`, `discounted = 80` gives `20%`.
    ///
    /// [`None`] is returned if the `original` price is not positive, the
    /// `discounted` one exceeds it, or their currencies differ.
    #[must_use]
    pub fn discount_between(original: Money, discounted: Money) -> Option<Self> {
        if !original.is_positive() || original.currency != discounted.currency {
            return None;
        }
        Self::new(
            (Decimal::ONE - discounted.amount / original.amount)
                * Decimal::ONE_HUNDRED,
        )
    }

    /// Applies this [`Percent`] as a discount to the provided `price`.
    ///
    /// `price = 100`, `self = 10%` gives `90`.
    #[must_use]
    pub fn discount(self, price: Money) -> Money {
        Money {
            amount: price.amount
                * (Decimal::ONE - self.0 / Decimal::ONE_HUNDRED),
            currency: price.currency,
        }
    }

    /// Returns the [`Decimal`] representation of this [`Percent`].
    #[must_use]
    pub fn as_decimal(self) -> Decimal {
        self.0
    }
}

impl FromStr for Percent {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s)
            .ok()
            .and_then(Self::new)
            .ok_or("invalid percent value")
    }
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use super::{Money, Percent};

    #[test]
    fn rejects_out_of_range_values() {
        assert!(Percent::from_str("-1").is_err());
        assert!(Percent::from_str("100.5").is_err());
        assert!(Percent::from_str("0").is_ok());
        assert!(Percent::from_str("100").is_ok());
    }

    #[test]
    fn discounts_price() {
        let price = Money::from_str("100USD").unwrap();
        let discounted = Percent::from_str("10").unwrap().discount(price);
        assert_eq!(discounted, Money::from_str("90.00USD").unwrap());
    }

    #[test]
    fn derives_discount_between_prices() {
        let original = Money::from_str("100USD").unwrap();
        let discounted = Money::from_str("80USD").unwrap();
        assert_eq!(
            Percent::discount_between(original, discounted),
            Some(Percent::from_str("20").unwrap()),
        );
        assert_eq!(Percent::discount_between(discounted * 0, original), None);
    }
}
