//! [`FlashSale`] definitions.

use std::collections::HashMap;

use common::{define_kind, unit, DateTime, DateTimeOf, Money, Percent};
use derive_more::{AsRef, Display, From, FromStr, Into};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{product, stock};

/// Time-boxed sale offering [`Product`]s at flash prices with a bounded
/// stock allocation.
///
/// A [`FlashSale`] carries no stored state field: its [`State`] is computed
/// lazily from the clock and the stock ledger at every access via
/// [`FlashSale::state_at()`].
///
/// [`Product`]: crate::domain::Product
#[derive(Clone, Debug)]
pub struct FlashSale {
    /// ID of this [`FlashSale`].
    pub id: Id,

    /// [`Name`] of this [`FlashSale`].
    pub name: Name,

    /// [`Description`] of this [`FlashSale`].
    pub description: Option<Description>,

    /// [`DateTime`] when this [`FlashSale`] starts.
    pub starts_at: StartDateTime,

    /// [`DateTime`] when this [`FlashSale`] ends.
    pub ends_at: EndDateTime,

    /// Number of visits recorded for this [`FlashSale`].
    ///
    /// Feeds the conversion rate denominator of analytics.
    pub visitors: u64,

    /// [`DateTime`] when this [`FlashSale`] was ended manually, if it was.
    ///
    /// Once set, the sale is [`State::Ended`] regardless of the clock.
    pub force_ended_at: Option<EndDateTime>,

    /// [`Product`]s participating in this [`FlashSale`].
    pub products: HashMap<product::Id, Product>,
}

impl FlashSale {
    /// Computes the [`State`] of this [`FlashSale`] at the provided
    /// [`DateTime`].
    ///
    /// `stock_exhausted` reports whether every participating [`Product`]
    /// has zero remaining stock, which ends the sale early.
    #[must_use]
    pub fn state_at(&self, at: DateTime, stock_exhausted: bool) -> State {
        if self.force_ended_at.is_some() {
            State::Ended
        } else if at < self.starts_at.coerce() {
            State::Scheduled
        } else if at >= self.ends_at.coerce() || stock_exhausted {
            State::Ended
        } else {
            State::Active
        }
    }

    /// Returns the [`stock::Key`] addressing the ledger entry of the
    /// provided [`Product`] within this [`FlashSale`].
    #[must_use]
    pub fn stock_key(&self, product_id: product::Id) -> stock::Key {
        stock::Key { flash_sale_id: self.id, product_id }
    }
}

/// [`Product`] participating in a [`FlashSale`].
#[derive(Clone, Copy, Debug)]
pub struct Product {
    /// ID of the participating [`Product`].
    ///
    /// [`Product`]: crate::domain::Product
    pub product_id: product::Id,

    /// Price the [`Product`] is sold at while the sale is active.
    ///
    /// Not subject to the floor price: a below-floor flash price is an
    /// explicit, conscious decision of the sale creator.
    ///
    /// [`Product`]: crate::domain::Product
    pub flash_price: Money,

    /// Price of the [`Product`] at the moment the sale was created.
    ///
    /// [`Product`]: crate::domain::Product
    pub original_price: Money,

    /// Discount of the [`Product::flash_price`] against the
    /// [`Product::original_price`].
    pub discount: Percent,

    /// Stock allocated to the sale for this [`Product`].
    ///
    /// [`Product`]: crate::domain::Product
    pub allocated_stock: stock::Quantity,

    /// Maximum total quantity a single user may purchase.
    pub per_user_limit: stock::Quantity,
}

/// ID of a [`FlashSale`].
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

/// Recorded visit of a [`FlashSale`] page.
#[derive(Clone, Copy, Debug)]
pub struct Visit(pub Id);

define_kind! {
    #[doc = "Lifecycle state of a [`FlashSale`]."]
    enum State {
        #[doc = "Sale hasn't started yet."]
        Scheduled = 1,

        #[doc = "Sale is running: flash prices and purchases apply."]
        Active = 2,

        #[doc = "Sale is over, by clock, by exhaustion or by hand."]
        Ended = 3,
    }
}

/// Name of a [`FlashSale`].
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[as_ref(forward)]
pub struct Name(String);

impl Name {
    /// Creates a new [`Name`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `name` matches the format.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Creates a new [`Name`] if the given `name` is valid.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        Self::check(&name).then_some(Self(name))
    }

    /// Checks whether the given `name` is a valid [`Name`].
    fn check(name: impl AsRef<str>) -> bool {
        let name = name.as_ref();
        name.trim() == name && !name.is_empty() && name.len() <= 256
    }
}

impl FromStr for Name {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Name`")
    }
}

/// Description of a [`FlashSale`].
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[as_ref(forward)]
pub struct Description(String);

impl Description {
    /// Creates a new [`Description`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `description` matches the
    /// format.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(description: impl Into<String>) -> Self {
        Self(description.into())
    }

    /// Creates a new [`Description`] if the given `description` is valid.
    #[must_use]
    pub fn new(description: impl Into<String>) -> Option<Self> {
        let description = description.into();
        Self::check(&description).then_some(Self(description))
    }

    /// Checks whether the given `description` is a valid [`Description`].
    fn check(description: impl AsRef<str>) -> bool {
        let description = description.as_ref();
        !description.is_empty() && description.len() <= 4096
    }
}

impl FromStr for Description {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Description`")
    }
}

/// [`DateTime`] when a [`FlashSale`] starts.
pub type StartDateTime = DateTimeOf<(FlashSale, unit::Start)>;

/// [`DateTime`] when a [`FlashSale`] ends.
pub type EndDateTime = DateTimeOf<(FlashSale, unit::End)>;

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use super::*;

    const HOUR: Duration = Duration::from_secs(3600);

    #[expect(unsafe_code, reason = "bypass")]
    fn sale(
        starts_at: DateTime,
        ends_at: DateTime,
        force_ended_at: Option<DateTime>,
    ) -> FlashSale {
        FlashSale {
            id: Id::new(),
            // SAFETY: Valid constant.
            name: unsafe { Name::new_unchecked("Big Friday") },
            description: None,
            starts_at: starts_at.coerce(),
            ends_at: ends_at.coerce(),
            visitors: 0,
            force_ended_at: force_ended_at.map(DateTimeOf::coerce),
            products: HashMap::new(),
        }
    }

    #[test]
    fn scheduled_before_start() {
        let now = DateTime::now();
        let s = sale(now + HOUR, now + HOUR + HOUR, None);

        assert_eq!(s.state_at(now, false), State::Scheduled);
    }

    #[test]
    fn active_inside_window() {
        let now = DateTime::now();
        let s = sale(now - HOUR, now + HOUR, None);

        assert_eq!(s.state_at(now, false), State::Active);
    }

    #[test]
    fn ended_after_window() {
        let now = DateTime::now();
        let s = sale(now - HOUR - HOUR, now - HOUR, None);

        assert_eq!(s.state_at(now, false), State::Ended);
    }

    #[test]
    fn ended_when_stock_exhausted() {
        let now = DateTime::now();
        let s = sale(now - HOUR, now + HOUR, None);

        assert_eq!(s.state_at(now, true), State::Ended);
    }

    #[test]
    fn force_ending_wins_over_clock() {
        let now = DateTime::now();
        let s = sale(now - HOUR, now + HOUR, Some(now));

        assert_eq!(s.state_at(now, false), State::Ended);
    }
}
