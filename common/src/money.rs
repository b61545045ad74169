//! [`Money`]-related definitions.

use std::{cmp::Ordering, fmt, ops, str::FromStr};

use rust_decimal::{prelude::ToPrimitive as _, Decimal};

use crate::define_kind;

/// Amount of money in some [`Currency`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Money {
    /// Amount of this [`Money`].
    pub amount: Decimal,

    /// [`Currency`] of this amount.
    pub currency: Currency,
}

impl Money {
    /// Indicates whether this [`Money`] amount is strictly positive.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.amount > Decimal::ZERO
    }

    /// Clamps this [`Money`] from below by the provided `floor`.
    ///
    /// # Panics
    ///
    /// If the `floor` is in a different [`Currency`].
    #[must_use]
    pub fn clamp_min(self, floor: Self) -> Self {
        assert_eq!(self.currency, floor.currency, "`Currency` mismatch");
        if self.amount < floor.amount {
            floor
        } else {
            self
        }
    }

    /// Sums this [`Money`] with the `rhs` one.
    ///
    /// [`None`] is returned on a [`Currency`] mismatch.
    #[must_use]
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        (self.currency == rhs.currency).then(|| Self {
            amount: self.amount + rhs.amount,
            currency: self.currency,
        })
    }

    /// Subtracts the `rhs` [`Money`] from this one.
    ///
    /// [`None`] is returned on a [`Currency`] mismatch.
    #[must_use]
    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        (self.currency == rhs.currency).then(|| Self {
            amount: self.amount - rhs.amount,
            currency: self.currency,
        })
    }
}

impl PartialOrd for Money {
    /// Compares two [`Money`] amounts.
    ///
    /// Amounts in different [`Currency`]s are not comparable.
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        (self.currency == other.currency)
            .then(|| self.amount.cmp(&other.amount))
    }
}

impl ops::Mul<u32> for Money {
    type Output = Self;

    fn mul(self, rhs: u32) -> Self::Output {
        Self {
            amount: self.amount * Decimal::from(rhs),
            currency: self.currency,
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self { amount, currency } = self;
        if amount.is_integer() {
            write!(f, "{}{currency}", amount.to_i128().expect("integer"))
        } else {
            write!(f, "{amount}{currency}")
        }
    }
}

impl FromStr for Money {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() < 4 {
            return Err("too short");
        }

        let (amount, currency) = s.split_at(s.len() - 3);
        let amount = Decimal::from_str(amount).map_err(|_| "invalid amount")?;
        let currency =
            Currency::from_str(currency).map_err(|_| "invalid currency")?;

        Ok(Self { amount, currency })
    }
}

define_kind! {
    #[doc = "Currency of a [`Money`] amount."]
    enum Currency {
        #[doc = "US Dollar."]
        Usd = 1,

        #[doc = "Euro."]
        Eur = 2,
    }
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use rust_decimal::Decimal;

    use super::{Currency, Money};

    fn usd(s: &str) -> Money {
        Money {
            amount: s.parse().unwrap(),
            currency: Currency::Usd,
        }
    }

    #[test]
    fn from_str() {
        assert_eq!(
            Money::from_str("123.45USD").unwrap(),
            Money {
                amount: Decimal::from_str("123.45").unwrap(),
                currency: Currency::Usd,
            },
        );
        assert_eq!(
            Money::from_str("99EUR").unwrap(),
            Money {
                amount: Decimal::from_str("99").unwrap(),
                currency: Currency::Eur,
            },
        );

        assert!(Money::from_str("123.45").is_err());
        assert!(Money::from_str("123.45Us").is_err());
        assert!(Money::from_str("123.45Usdollar").is_err());
    }

    #[test]
    fn to_string() {
        assert_eq!(usd("123.45").to_string(), "123.45USD");
        assert_eq!(usd("123.00").to_string(), "123USD");
    }

    #[test]
    fn clamps_to_floor() {
        assert_eq!(usd("40").clamp_min(usd("50")), usd("50"));
        assert_eq!(usd("60").clamp_min(usd("50")), usd("60"));
    }

    #[test]
    fn multiplies_by_quantity() {
        assert_eq!(usd("19.99") * 3, usd("59.97"));
    }

    #[test]
    fn different_currencies_are_not_comparable() {
        let a = usd("10");
        let b = Money {
            currency: Currency::Eur,
            ..a
        };
        assert_eq!(a.partial_cmp(&b), None);
        assert_eq!(a.checked_add(b), None);
    }
}
