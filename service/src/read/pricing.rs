//! Pricing read models.

use common::Money;

use crate::domain::{flash_sale, pricing_rule, product, stock};

/// Result of resolving the effective price of a [`Product`].
///
/// [`Product`]: crate::domain::Product
#[derive(Clone, Copy, Debug)]
pub struct Resolution {
    /// ID of the priced [`Product`].
    ///
    /// [`Product`]: crate::domain::Product
    pub product_id: product::Id,

    /// Resolved price of a single unit.
    pub unit_price: Money,

    /// [`Source`] the price was resolved from.
    pub source: Source,

    /// Indicates whether the price was raised to the floor price.
    pub clamped: bool,
}

/// Source a price [`Resolution`] was produced by.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Source {
    /// Flash price of an active [`FlashSale`].
    ///
    /// [`FlashSale`]: crate::domain::FlashSale
    FlashSale(flash_sale::Id),

    /// Discount of the winning [`PricingRule`].
    ///
    /// [`PricingRule`]: crate::domain::PricingRule
    Rule(pricing_rule::Id),

    /// Base price of the [`Product`], with no rule applicable.
    ///
    /// [`Product`]: crate::domain::Product
    BasePrice,
}

/// Active flash offer covering a [`Product`] at some instant.
///
/// [`Product`]: crate::domain::Product
#[derive(Clone, Copy, Debug)]
pub struct FlashOffer {
    /// ID of the [`FlashSale`] making the offer.
    ///
    /// [`FlashSale`]: crate::domain::FlashSale
    pub flash_sale_id: flash_sale::Id,

    /// Flash price of the offer.
    pub flash_price: Money,

    /// Maximum total [`stock::Quantity`] a single user may purchase.
    pub per_user_limit: stock::Quantity,

    /// [`stock::Quantity`] still available for purchase.
    pub remaining: stock::Quantity,
}
