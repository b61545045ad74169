//! Stock ledger definitions.

use std::collections::HashMap;

use derive_more::Display;

use crate::domain::{flash_sale, product, user};

/// Quantity of stock units.
pub type Quantity = u32;

/// Key addressing a stock ledger [`Entry`].
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
#[display("{flash_sale_id}/{product_id}")]
pub struct Key {
    /// ID of the [`FlashSale`] the stock is allocated for.
    ///
    /// [`FlashSale`]: crate::domain::FlashSale
    pub flash_sale_id: flash_sale::Id,

    /// ID of the [`Product`] the stock is allocated for.
    ///
    /// [`Product`]: crate::domain::Product
    pub product_id: product::Id,
}

/// Request to reserve stock from a ledger [`Entry`].
#[derive(Clone, Copy, Debug)]
pub struct Reservation {
    /// [`Key`] of the ledger [`Entry`] to reserve from.
    pub key: Key,

    /// ID of the user reserving the stock.
    pub user_id: user::Id,

    /// Quantity to reserve.
    pub quantity: Quantity,
}

/// Stock allocation of a single [`Product`] within a single [`FlashSale`].
///
/// All mutations are compound: either every check passes and every counter
/// moves, or nothing does. The remaining count never goes negative and a
/// single user never exceeds the per-user limit.
///
/// [`FlashSale`]: crate::domain::FlashSale
/// [`Product`]: crate::domain::Product
#[derive(Clone, Debug)]
pub struct Entry {
    /// Total quantity allocated to the sale.
    allocated: Quantity,

    /// Quantity still available for purchase.
    remaining: Quantity,

    /// Maximum total [`Quantity`] a single user may accumulate.
    per_user_limit: Quantity,

    /// [`Quantity`]s successfully purchased per user.
    purchased: HashMap<user::Id, Quantity>,
}

impl Entry {
    /// Creates a new [`Entry`] with the whole allocation available.
    #[must_use]
    pub fn new(allocated: Quantity, per_user_limit: Quantity) -> Self {
        Self {
            allocated,
            remaining: allocated,
            per_user_limit,
            purchased: HashMap::new(),
        }
    }

    /// Total [`Quantity`] allocated to the sale.
    #[must_use]
    pub fn allocated(&self) -> Quantity {
        self.allocated
    }

    /// [`Quantity`] still available for purchase.
    #[must_use]
    pub fn remaining(&self) -> Quantity {
        self.remaining
    }

    /// Indicates whether no stock remains in this [`Entry`].
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }

    /// Attempts to reserve the provided [`Quantity`] for the provided user.
    ///
    /// Checks the remaining stock and the per-user limit together, and only
    /// then moves both counters, so a rejected attempt leaves this [`Entry`]
    /// untouched.
    pub fn try_reserve(
        &mut self,
        user_id: user::Id,
        quantity: Quantity,
    ) -> Outcome {
        let already = self.purchased.get(&user_id).copied().unwrap_or_default();
        let remaining_allowance =
            self.per_user_limit.saturating_sub(already);

        if quantity > remaining_allowance {
            return Outcome::Rejected(Rejection::LimitExceeded {
                remaining_allowance,
            });
        }
        if quantity > self.remaining {
            return Outcome::Rejected(Rejection::OutOfStock {
                remaining: self.remaining,
            });
        }

        self.remaining -= quantity;
        _ = self.purchased.insert(user_id, already + quantity);

        Outcome::Reserved(Reserved { remaining: self.remaining })
    }

    /// Returns a previously reserved [`Quantity`] back to this [`Entry`].
    ///
    /// Compensation for a reservation whose purchase failed to persist. The
    /// remaining count is capped at the allocation, so a spurious release
    /// cannot inflate the stock.
    pub fn release(&mut self, user_id: user::Id, quantity: Quantity) {
        self.remaining =
            self.remaining.saturating_add(quantity).min(self.allocated);
        if let Some(q) = self.purchased.get_mut(&user_id) {
            *q = q.saturating_sub(quantity);
        }
    }

    /// Total [`Quantity`] the provided user has purchased so far.
    #[must_use]
    pub fn purchased_by(&self, user_id: user::Id) -> Quantity {
        self.purchased.get(&user_id).copied().unwrap_or_default()
    }

    /// Current stock [`Levels`] of this [`Entry`].
    #[must_use]
    pub fn levels(&self) -> Levels {
        Levels { allocated: self.allocated, remaining: self.remaining }
    }
}

/// Outcome of an [`Entry::try_reserve()`] attempt.
#[derive(Clone, Copy, Debug)]
pub enum Outcome {
    /// Reservation succeeded.
    Reserved(Reserved),

    /// Reservation was rejected, nothing was mutated.
    Rejected(Rejection),
}

/// Successful reservation of stock.
#[derive(Clone, Copy, Debug)]
pub struct Reserved {
    /// [`Quantity`] remaining after the reservation.
    pub remaining: Quantity,
}

/// Reason of rejecting a reservation.
#[derive(Clone, Copy, Debug, Display)]
pub enum Rejection {
    /// Not enough stock remains to cover the requested [`Quantity`].
    #[display("out of stock: {remaining} remaining")]
    OutOfStock {
        /// [`Quantity`] still remaining.
        remaining: Quantity,
    },

    /// Request would push the user over the per-user limit.
    #[display("per-user limit exceeded: {remaining_allowance} allowed")]
    LimitExceeded {
        /// [`Quantity`] the user may still purchase.
        remaining_allowance: Quantity,
    },
}

/// Snapshot of the stock levels of an [`Entry`].
#[derive(Clone, Copy, Debug)]
pub struct Levels {
    /// Total [`Quantity`] allocated to the sale.
    pub allocated: Quantity,

    /// [`Quantity`] still available for purchase.
    pub remaining: Quantity,
}

#[cfg(test)]
mod spec {
    use super::*;

    #[test]
    fn reserves_within_stock_and_limit() {
        let mut entry = Entry::new(10, 3);
        let user = user::Id::new();

        let Outcome::Reserved(r) = entry.try_reserve(user, 2) else {
            panic!("expected `Outcome::Reserved`");
        };

        assert_eq!(r.remaining, 8);
        assert_eq!(entry.purchased_by(user), 2);
    }

    #[test]
    fn rejects_over_stock_without_mutating() {
        let mut entry = Entry::new(3, 10);
        let user = user::Id::new();

        let Outcome::Rejected(Rejection::OutOfStock { remaining }) =
            entry.try_reserve(user, 4)
        else {
            panic!("expected `Rejection::OutOfStock`");
        };

        assert_eq!(remaining, 3);
        assert_eq!(entry.remaining(), 3);
        assert_eq!(entry.purchased_by(user), 0);
    }

    #[test]
    fn rejects_over_limit_without_mutating() {
        let mut entry = Entry::new(10, 2);
        let user = user::Id::new();

        _ = entry.try_reserve(user, 2);
        let Outcome::Rejected(Rejection::LimitExceeded {
            remaining_allowance,
        }) = entry.try_reserve(user, 1)
        else {
            panic!("expected `Rejection::LimitExceeded`");
        };

        assert_eq!(remaining_allowance, 0);
        assert_eq!(entry.remaining(), 8);
        assert_eq!(entry.purchased_by(user), 2);
    }

    #[test]
    fn limit_is_checked_before_stock() {
        let mut entry = Entry::new(1, 2);
        let user = user::Id::new();

        // Both checks fail here; the limit one is reported.
        assert!(matches!(
            entry.try_reserve(user, 3),
            Outcome::Rejected(Rejection::LimitExceeded { .. }),
        ));
    }

    #[test]
    fn release_restores_stock_and_allowance() {
        let mut entry = Entry::new(5, 5);
        let user = user::Id::new();

        _ = entry.try_reserve(user, 3);
        entry.release(user, 3);

        assert_eq!(entry.remaining(), 5);
        assert_eq!(entry.purchased_by(user), 0);
    }

    #[test]
    fn release_never_exceeds_allocation() {
        let mut entry = Entry::new(5, 5);
        let user = user::Id::new();

        entry.release(user, 3);

        assert_eq!(entry.remaining(), 5);
    }

    #[test]
    fn exhausts_exactly_at_zero() {
        let mut entry = Entry::new(2, 5);
        let user = user::Id::new();

        assert!(!entry.is_exhausted());
        _ = entry.try_reserve(user, 2);
        assert!(entry.is_exhausted());
    }
}
