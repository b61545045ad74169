//! [`Purchase`] definitions.

use common::{unit, DateTimeOf, Money};
use derive_more::{Display, From, FromStr, Into};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{flash_sale, product, stock, user};

/// Committed purchase of a [`Product`] within a [`FlashSale`].
///
/// Append-only record: once persisted it's never mutated.
///
/// [`FlashSale`]: crate::domain::FlashSale
/// [`Product`]: crate::domain::Product
#[derive(Clone, Copy, Debug)]
pub struct Purchase {
    /// ID of this [`Purchase`].
    pub id: Id,

    /// ID of the [`attempt`] this [`Purchase`] was committed by.
    pub attempt_id: attempt::Id,

    /// ID of the purchasing user.
    pub user_id: user::Id,

    /// ID of the [`FlashSale`] this [`Purchase`] was made in.
    ///
    /// [`FlashSale`]: crate::domain::FlashSale
    pub flash_sale_id: flash_sale::Id,

    /// ID of the purchased [`Product`].
    ///
    /// [`Product`]: crate::domain::Product
    pub product_id: product::Id,

    /// Purchased [`stock::Quantity`].
    pub quantity: stock::Quantity,

    /// Price of a single unit at the moment of this [`Purchase`].
    pub unit_price: Money,

    /// Total price paid.
    pub total_price: Money,

    /// Amount saved against the original price.
    pub savings: Money,

    /// [`DateTime`] when this [`Purchase`] was committed.
    ///
    /// [`DateTime`]: common::DateTime
    pub at: CommitDateTime,
}

impl Purchase {
    /// Builds the [`Receipt`] of this [`Purchase`].
    #[must_use]
    pub fn receipt(&self) -> Receipt {
        Receipt {
            purchase_id: self.id,
            attempt_id: self.attempt_id,
            user_id: self.user_id,
            flash_sale_id: self.flash_sale_id,
            product_id: self.product_id,
            quantity: self.quantity,
            unit_price: self.unit_price,
            total_price: self.total_price,
            savings: self.savings,
            at: self.at,
        }
    }
}

/// ID of a [`Purchase`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    PartialEq,
    Serialize,
)]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Receipt acknowledging a committed [`Purchase`].
#[derive(Clone, Copy, Debug)]
pub struct Receipt {
    /// ID of the committed [`Purchase`].
    pub purchase_id: Id,

    /// ID of the [`attempt`] that committed the [`Purchase`].
    pub attempt_id: attempt::Id,

    /// ID of the purchasing user.
    pub user_id: user::Id,

    /// ID of the [`FlashSale`] the [`Purchase`] was made in.
    ///
    /// [`FlashSale`]: crate::domain::FlashSale
    pub flash_sale_id: flash_sale::Id,

    /// ID of the purchased [`Product`].
    ///
    /// [`Product`]: crate::domain::Product
    pub product_id: product::Id,

    /// Purchased [`stock::Quantity`].
    pub quantity: stock::Quantity,

    /// Price of a single unit.
    pub unit_price: Money,

    /// Total price paid.
    pub total_price: Money,

    /// Amount saved against the original price.
    pub savings: Money,

    /// [`DateTime`] when the [`Purchase`] was committed.
    ///
    /// [`DateTime`]: common::DateTime
    pub at: CommitDateTime,
}

/// [`DateTime`] when a [`Purchase`] was committed.
///
/// [`DateTime`]: common::DateTime
pub type CommitDateTime = DateTimeOf<(Purchase, unit::Creation)>;

pub mod attempt {
    //! Purchase attempt tracking.
    //!
    //! Every purchase request carries a client-generated attempt [`Id`]
    //! serving as the idempotency key: retries of the same attempt never
    //! commit twice.

    use common::define_kind;
    use derive_more::{Display, From, FromStr, Into};
    use serde::{Deserialize, Serialize};
    use uuid::Uuid;

    use crate::domain::{flash_sale, product, user};

    use super::Receipt;

    /// ID of a purchase attempt.
    ///
    /// Generated by the client, not by the core, so the same [`Id`] can be
    /// resubmitted after a timeout.
    #[derive(
        Clone,
        Copy,
        Debug,
        Default,
        Deserialize,
        Display,
        Eq,
        From,
        FromStr,
        Hash,
        Into,
        PartialEq,
        Serialize,
    )]
    pub struct Id(Uuid);

    impl Id {
        /// Creates a new random [`Id`].
        #[must_use]
        pub fn new() -> Self {
            Self(Uuid::new_v4())
        }
    }

    /// Tracked state of a purchase attempt.
    #[derive(Clone, Copy, Debug)]
    pub struct Record {
        /// ID of this attempt.
        pub id: Id,

        /// ID of the user making the attempt.
        pub user_id: user::Id,

        /// ID of the [`FlashSale`] being purchased in.
        ///
        /// [`FlashSale`]: crate::domain::FlashSale
        pub flash_sale_id: flash_sale::Id,

        /// ID of the [`Product`] being purchased.
        ///
        /// [`Product`]: crate::domain::Product
        pub product_id: product::Id,

        /// [`Status`] of this attempt.
        pub status: Status,
    }

    /// Status of a purchase attempt.
    #[derive(Clone, Copy, Debug)]
    pub enum Status {
        /// Attempt is accepted and queued, but not picked up yet.
        ///
        /// Recorded before the submission is acknowledged, so the attempt
        /// is queryable by its [`Id`] from that moment on.
        Submitted,

        /// Attempt is being processed.
        Pending,

        /// Attempt committed a [`Purchase`].
        ///
        /// [`Purchase`]: super::Purchase
        Committed(Receipt),

        /// Attempt failed and may be retried.
        Failed(Failure),
    }

    define_kind! {
        #[doc = "Reason a purchase attempt failed."]
        enum Failure {
            #[doc = "Referenced sale or product doesn't exist."]
            NotFound = 1,

            #[doc = "Sale is not in its active state."]
            SaleNotActive = 2,

            #[doc = "Client-stated price diverged from the resolved one."]
            PriceMismatch = 3,

            #[doc = "Not enough stock remained."]
            OutOfStock = 4,

            #[doc = "Per-user limit would be exceeded."]
            LimitExceeded = 5,

            #[doc = "Requested quantity is zero."]
            InvalidQuantity = 6,

            #[doc = "Storage failed mid-flight."]
            Internal = 7,
        }
    }

    /// Outcome of claiming an attempt [`Id`].
    ///
    /// Claiming for [`Status::Submitted`] queues the attempt; claiming for
    /// [`Status::Pending`] takes a queued (or fresh) attempt over for
    /// processing.
    #[derive(Clone, Copy, Debug)]
    pub enum ClaimOutcome {
        /// Claim acquired: this caller owns the attempt now.
        Acquired,

        /// Attempt is already queued or being processed by an earlier
        /// submission.
        InFlight,

        /// Attempt already committed a [`Purchase`].
        ///
        /// [`Purchase`]: super::Purchase
        Committed(Receipt),
    }
}
