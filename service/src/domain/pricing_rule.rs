//! [`PricingRule`] definitions.

use std::collections::HashSet;

use common::{define_kind, unit, DateTime, DateTimeOf, Percent};
use derive_more::{
    AsRef, Display, Error as StdError, From, FromStr, Into,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{product, user, Product};

/// Conditional price adjustment keyed on time, quantity or user tier.
///
/// Multiple rules may apply to one [`Product`] at the same instant, but
/// exactly one of them (the applicable one with the highest
/// [`PricingRule::priority`], ties broken by [`Id`] ascending) determines
/// the price at resolution time.
#[derive(Clone, Debug)]
pub struct PricingRule {
    /// ID of this [`PricingRule`].
    pub id: Id,

    /// [`Name`] of this [`PricingRule`].
    pub name: Name,

    /// IDs of the [`Product`]s this [`PricingRule`] is scoped to.
    ///
    /// An empty set scopes the rule to every [`Product`].
    pub product_ids: HashSet<product::Id>,

    /// [`product::Category`]s this [`PricingRule`] is scoped to.
    ///
    /// An empty set scopes the rule to every [`product::Category`].
    pub categories: HashSet<product::Category>,

    /// [`Kind`] of this [`PricingRule`] with its parameters.
    pub kind: Kind,

    /// [`Priority`] of this [`PricingRule`].
    ///
    /// Greater value wins over a lower one.
    pub priority: Priority,

    /// [`Status`] of this [`PricingRule`].
    pub status: Status,

    /// [`DateTime`] since which this [`PricingRule`] is applicable, if
    /// bounded.
    pub valid_from: Option<ValidityDateTime>,

    /// [`DateTime`] until which this [`PricingRule`] is applicable, if
    /// bounded.
    pub valid_until: Option<ValidityDateTime>,

    /// [`DateTime`] when this [`PricingRule`] was created.
    pub created_at: CreationDateTime,

    /// [`DateTime`] when this [`PricingRule`] was updated last time.
    pub updated_at: UpdateDateTime,
}

impl PricingRule {
    /// Indicates whether this [`PricingRule`] is scoped to the provided
    /// [`Product`].
    #[must_use]
    pub fn applies_to(&self, product: &Product) -> bool {
        (self.product_ids.is_empty()
            || self.product_ids.contains(&product.id))
            && (self.categories.is_empty()
                || self.categories.contains(&product.category))
    }

    /// Indicates whether this [`PricingRule`] is active and inside its
    /// validity window at the provided [`DateTime`].
    #[must_use]
    pub fn is_valid_at(&self, at: DateTime) -> bool {
        self.status == Status::Active
            && self.valid_from.is_none_or(|from| at >= from.coerce())
            && self.valid_until.is_none_or(|until| at <= until.coerce())
    }

    /// Returns the discount this [`PricingRule`] yields for the provided
    /// [`Context`].
    ///
    /// [`None`] is returned if the activation predicate of this
    /// [`PricingRule`]'s [`Kind`] doesn't match the [`Context`].
    #[must_use]
    pub fn discount_for(&self, context: &Context) -> Option<Percent> {
        match &self.kind {
            Kind::TimeWindow(w) => {
                ((w.days_of_week.is_empty()
                    || w.days_of_week.contains(&context.at.weekday()))
                    && (w.starts_at..=w.ends_at)
                        .contains(&context.at.time_of_day()))
                .then_some(w.discount)
            }
            Kind::QuantityTier(tiers) => tiers
                .iter()
                .find(|t| {
                    context.quantity >= t.min_quantity
                        && t.max_quantity
                            .is_none_or(|max| context.quantity <= max)
                })
                .map(|t| t.discount),
            Kind::UserTier(t) => context
                .user_tier
                .filter(|tier| t.tiers.contains(tier))
                .map(|_| t.discount),
        }
    }

    /// Validates the configuration of this [`PricingRule`].
    ///
    /// # Errors
    ///
    /// Returns an [`InvalidConfiguration`] if the parameters of this
    /// [`PricingRule`] are malformed.
    pub fn validate(&self) -> Result<(), InvalidConfiguration> {
        use InvalidConfiguration as E;

        if let (Some(from), Some(until)) = (self.valid_from, self.valid_until)
        {
            if from > until {
                return Err(E::ValidityInverted);
            }
        }
        match &self.kind {
            Kind::TimeWindow(w) => {
                if w.starts_at > w.ends_at {
                    return Err(E::WindowInverted);
                }
            }
            Kind::QuantityTier(tiers) => {
                if tiers.is_empty() {
                    return Err(E::EmptyTiers);
                }
                if tiers.iter().any(|t| {
                    t.max_quantity.is_some_and(|max| max < t.min_quantity)
                }) {
                    return Err(E::TierBoundsInverted);
                }
            }
            Kind::UserTier(t) => {
                if t.tiers.is_empty() {
                    return Err(E::EmptyUserTiers);
                }
            }
        }
        Ok(())
    }
}

/// ID of a [`PricingRule`].
///
/// [`Ord`] is derived, because rule IDs serve as the deterministic
/// tie-break key of price resolution: among equal-priority applicable
/// rules the smallest ID wins.
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
    Ord,
    PartialEq,
    PartialOrd,
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

/// Name of a [`PricingRule`].
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

/// Priority of a [`PricingRule`].
pub type Priority = i32;

define_kind! {
    #[doc = "Status of a [`PricingRule`]."]
    enum Status {
        #[doc = "Rule participates in price resolution."]
        Active = 1,

        #[doc = "Rule is ignored by price resolution."]
        Inactive = 2,
    }
}

/// Kind of a [`PricingRule`] along with its parameters.
#[derive(Clone, Debug, From)]
pub enum Kind {
    /// Discount applying inside a recurring time window.
    TimeWindow(TimeWindow),

    /// Discount keyed on the purchased quantity.
    QuantityTier(Vec<QuantityTier>),

    /// Discount keyed on the [`user::Tier`] of the purchaser.
    UserTier(UserTier),
}

/// Parameters of a [`Kind::TimeWindow`] rule.
#[derive(Clone, Debug)]
pub struct TimeWindow {
    /// Days of week the window recurs on.
    ///
    /// An empty list means every day.
    pub days_of_week: Vec<time::Weekday>,

    /// UTC wall-clock time the window opens at.
    pub starts_at: time::Time,

    /// UTC wall-clock time the window closes at.
    pub ends_at: time::Time,

    /// Discount applied inside the window.
    pub discount: Percent,
}

/// Single tier of a [`Kind::QuantityTier`] rule.
#[derive(Clone, Copy, Debug)]
pub struct QuantityTier {
    /// Minimum quantity (inclusive) this tier starts at.
    pub min_quantity: u32,

    /// Maximum quantity (inclusive) this tier ends at, if bounded.
    pub max_quantity: Option<u32>,

    /// Discount of this tier.
    pub discount: Percent,
}

/// Parameters of a [`Kind::UserTier`] rule.
#[derive(Clone, Debug)]
pub struct UserTier {
    /// [`user::Tier`]s the discount is granted to.
    pub tiers: HashSet<user::Tier>,

    /// Discount granted to the matching [`user::Tier`]s.
    pub discount: Percent,
}

/// Context a price is resolved for.
#[derive(Clone, Copy, Debug)]
pub struct Context {
    /// Quantity of the priced [`Product`] being purchased.
    pub quantity: u32,

    /// [`user::Tier`] of the purchaser, if known.
    pub user_tier: Option<user::Tier>,

    /// [`DateTime`] the price is resolved at.
    pub at: DateTime,
}

/// Error of validating a [`PricingRule`] configuration.
#[derive(Clone, Copy, Debug, Display, StdError)]
pub enum InvalidConfiguration {
    /// [`Kind::QuantityTier`] rule without any tiers.
    #[display("`Kind::QuantityTier` rule has no tiers")]
    EmptyTiers,

    /// [`Kind::UserTier`] rule without any [`user::Tier`]s.
    #[display("`Kind::UserTier` rule has no user tiers")]
    EmptyUserTiers,

    /// [`QuantityTier`] with `max_quantity` below `min_quantity`.
    #[display("`QuantityTier` bounds are inverted")]
    TierBoundsInverted,

    /// `valid_from` is after `valid_until`.
    #[display("`valid_from` is after `valid_until`")]
    ValidityInverted,

    /// [`TimeWindow`] closing before it opens.
    #[display("`TimeWindow` closes before it opens")]
    WindowInverted,
}

/// [`DateTime`] when a [`PricingRule`] was created.
pub type CreationDateTime = DateTimeOf<(PricingRule, unit::Creation)>;

/// [`DateTime`] when a [`PricingRule`] was updated last time.
pub type UpdateDateTime = DateTimeOf<(PricingRule, unit::Update)>;

/// [`DateTime`] bounding the validity window of a [`PricingRule`].
pub type ValidityDateTime = DateTimeOf<PricingRule>;
