//! In-memory [`Database`] implementation.

mod impls;

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use derive_more::{Display, Error as StdError};

use crate::domain::{
    flash_sale, price_history, pricing_rule, product, purchase::attempt,
    stock, FlashSale, PricingRule, Product, Purchase,
};
#[cfg(doc)]
use crate::infra::Database;

/// In-memory [`Database`] keeping the whole state of the process.
///
/// The process is the single authority over its data, so plain locked maps
/// are enough: aggregates live behind one [`RwLock`] each, while every
/// stock ledger [`stock::Entry`] carries its own [`Mutex`] serializing the
/// compound reserve/release updates of that entry only.
#[derive(Clone, Debug, Default)]
pub struct InMemory(Arc<Inner>);

/// Inner state of an [`InMemory`] database.
#[derive(Debug, Default)]
struct Inner {
    /// Stored [`Product`]s.
    products: RwLock<HashMap<product::Id, Product>>,

    /// Stored [`PricingRule`]s.
    rules: RwLock<HashMap<pricing_rule::Id, PricingRule>>,

    /// Stored [`FlashSale`]s.
    sales: RwLock<HashMap<flash_sale::Id, FlashSale>>,

    /// Stock ledger [`stock::Entry`]s of the stored [`FlashSale`]s.
    ledger: RwLock<HashMap<stock::Key, Arc<Mutex<stock::Entry>>>>,

    /// Committed [`Purchase`]s, oldest first.
    purchases: RwLock<Vec<Purchase>>,

    /// Recorded [`price_history::Entry`]s, oldest first.
    history: RwLock<Vec<price_history::Entry>>,

    /// Taken [`price_history::Snapshot`]s, oldest first.
    snapshots: RwLock<Vec<price_history::Snapshot>>,

    /// Tracked purchase [`attempt::Record`]s.
    attempts: RwLock<HashMap<attempt::Id, attempt::Record>>,
}

/// Acquires a read lock, surviving poisoning.
fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

/// Acquires a write lock, surviving poisoning.
fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

/// [`InMemory`] database [`Error`].
#[derive(Clone, Copy, Debug, Display, StdError)]
pub enum Error {
    /// [`Product`] with the same ID is stored already.
    #[display("`Product` {_0} exists already")]
    DuplicateProduct(#[error(not(source))] product::Id),

    /// Referenced [`Product`] is not stored.
    #[display("`Product` {_0} doesn't exist")]
    ProductNotFound(#[error(not(source))] product::Id),

    /// [`PricingRule`] with the same ID is stored already.
    #[display("`PricingRule` {_0} exists already")]
    DuplicateRule(#[error(not(source))] pricing_rule::Id),

    /// Referenced [`PricingRule`] is not stored.
    #[display("`PricingRule` {_0} doesn't exist")]
    RuleNotFound(#[error(not(source))] pricing_rule::Id),

    /// [`FlashSale`] with the same ID is stored already.
    #[display("`FlashSale` {_0} exists already")]
    DuplicateSale(#[error(not(source))] flash_sale::Id),

    /// Referenced [`FlashSale`] is not stored.
    #[display("`FlashSale` {_0} doesn't exist")]
    SaleNotFound(#[error(not(source))] flash_sale::Id),

    /// Referenced stock ledger entry is not stored.
    #[display("no stock ledger entry under {_0}")]
    LedgerEntryNotFound(#[error(not(source))] stock::Key),
}
