//! Price history definitions.

use common::{define_kind, unit, DateTimeOf, Money};
use derive_more::{Display, From, FromStr, Into};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{pricing_rule, product};

/// Recorded change of a [`Product`]'s effective price.
///
/// [`Product`]: crate::domain::Product
#[derive(Clone, Copy, Debug)]
pub struct Entry {
    /// ID of this [`Entry`].
    pub id: Id,

    /// ID of the [`Product`] whose price changed.
    ///
    /// [`Product`]: crate::domain::Product
    pub product_id: product::Id,

    /// Price the [`Product`] changed to.
    ///
    /// [`Product`]: crate::domain::Product
    pub price: Money,

    /// [`Cause`] of the change.
    pub cause: Cause,

    /// [`DateTime`] when the price changed.
    ///
    /// [`DateTime`]: common::DateTime
    pub at: RecordDateTime,
}

/// ID of a price history [`Entry`].
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

define_kind! {
    #[doc = "Cause of a price change."]
    enum Cause {
        #[doc = "A pricing rule produced a new effective price."]
        RuleApplied = 1,

        #[doc = "A flash sale put the product on a flash price."]
        FlashSaleStarted = 2,

        #[doc = "The price was overridden by hand."]
        ManualOverride = 3,
    }
}

/// Periodic snapshot of a [`Product`]'s resolved price.
///
/// Taken on a schedule rather than on change, so analytics can reason
/// about the price level over time even when nothing changed.
///
/// [`Product`]: crate::domain::Product
#[derive(Clone, Debug)]
pub struct Snapshot {
    /// ID of the snapshotted [`Product`].
    ///
    /// [`Product`]: crate::domain::Product
    pub product_id: product::Id,

    /// Resolved price at the moment of the snapshot.
    pub price: Money,

    /// IDs of the [`PricingRule`]s applicable at the moment of the
    /// snapshot.
    ///
    /// [`PricingRule`]: crate::domain::PricingRule
    pub active_rules: Vec<pricing_rule::Id>,

    /// [`DateTime`] when the snapshot was taken.
    ///
    /// [`DateTime`]: common::DateTime
    pub at: RecordDateTime,
}

/// [`DateTime`] when a price record was taken.
///
/// [`DateTime`]: common::DateTime
pub type RecordDateTime = DateTimeOf<(Entry, unit::Creation)>;
