//! [`FlashSale`] read models.
//!
//! [`FlashSale`]: crate::domain::FlashSale

/// Indicator of every stock ledger entry of a [`FlashSale`] being drained
/// to zero.
///
/// [`FlashSale`]: crate::domain::FlashSale
#[derive(Clone, Copy, Debug)]
pub struct StockExhausted(pub bool);
