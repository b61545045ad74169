//! [`Purchase`] read models.
//!
//! [`Purchase`]: crate::domain::Purchase

use crate::domain::{flash_sale, product, purchase, stock, user};

/// Key addressing the [`Purchase`]s of a single user on a single
/// [`Product`] within a single [`FlashSale`].
///
/// [`FlashSale`]: crate::domain::FlashSale
/// [`Product`]: crate::domain::Product
/// [`Purchase`]: crate::domain::Purchase
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Actor {
    /// ID of the purchasing user.
    pub user_id: user::Id,

    /// ID of the [`FlashSale`].
    ///
    /// [`FlashSale`]: crate::domain::FlashSale
    pub flash_sale_id: flash_sale::Id,

    /// ID of the [`Product`].
    ///
    /// [`Product`]: crate::domain::Product
    pub product_id: product::Id,
}

/// Summary of the [`Purchase`]s made by a single [`Actor`].
///
/// [`Purchase`]: crate::domain::Purchase
#[derive(Clone, Debug)]
pub struct Summary {
    /// Individual [`Purchase`]s, oldest first.
    ///
    /// [`Purchase`]: crate::domain::Purchase
    pub entries: Vec<Entry>,

    /// Total [`stock::Quantity`] purchased.
    pub total_purchased: stock::Quantity,

    /// [`stock::Quantity`] the user may still purchase before hitting the
    /// per-user limit.
    pub limit_remaining: stock::Quantity,
}

/// Single [`Purchase`] of a [`Summary`].
///
/// [`Purchase`]: crate::domain::Purchase
#[derive(Clone, Copy, Debug)]
pub struct Entry {
    /// ID of the [`Purchase`].
    ///
    /// [`Purchase`]: crate::domain::Purchase
    pub purchase_id: purchase::Id,

    /// Purchased [`stock::Quantity`].
    pub quantity: stock::Quantity,

    /// [`DateTime`] when the [`Purchase`] was committed.
    ///
    /// [`DateTime`]: common::DateTime
    /// [`Purchase`]: crate::domain::Purchase
    pub at: purchase::CommitDateTime,
}
