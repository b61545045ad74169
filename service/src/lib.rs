//! Service contains the business logic of the application.
#![deny(
    nonstandard_style,
    rust_2018_idioms,
    rustdoc::all,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code
)]
#![forbid(non_ascii_idents)]
#![warn(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    clippy::pedantic,
    clippy::wildcard_enum_match_arm,
    deprecated_in_future,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unreachable_pub,
    unused_crate_dependencies,
    unused_import_braces,
    unused_labels,
    unused_lifetimes,
    unused_qualifications,
    unused_results
)]

pub mod command;
pub mod domain;
pub mod infra;
pub mod query;
pub mod read;
pub mod task;

use std::error::Error;

use common::operations::{By, Start};
use tokio::sync::mpsc;

use self::command::PurchaseInFlashSale;
#[cfg(doc)]
use self::infra::Database;
use self::infra::PriceCache;

pub use self::{command::Command, query::Query, task::Task};

/// [`Service`] configuration.
#[derive(Clone, Copy, Debug, Default)]
pub struct Config {
    /// [`PriceCache`] configuration.
    pub price_cache: infra::cache::Config,

    /// [`task::CapturePriceSnapshots`] configuration.
    pub price_snapshots: task::capture_price_snapshots::Config,

    /// [`task::ProcessPurchases`] queue configuration.
    pub purchase_queue: task::process_purchases::Config,
}

/// Domain service.
#[derive(Clone, Debug)]
pub struct Service<Db> {
    /// Configuration of this [`Service`].
    config: Config,

    /// [`Database`] of this [`Service`].
    database: Db,

    /// [`PriceCache`] of this [`Service`].
    price_cache: PriceCache,

    /// Sending side of the purchase queue.
    purchase_queue: mpsc::Sender<PurchaseInFlashSale>,
}

impl<Db> Service<Db> {
    /// Creates a new [`Service`] with the provided parameters, along with
    /// the [`task::Background`] environment running its background
    /// [`Task`]s.
    pub fn new(config: Config, database: Db) -> (Self, task::Background)
    where
        Self: Task<
                Start<
                    By<
                        task::CapturePriceSnapshots<Self>,
                        task::capture_price_snapshots::Config,
                    >,
                >,
                Ok = (),
                Err: Error,
            > + Task<
                Start<
                    By<
                        task::ProcessPurchases,
                        mpsc::Receiver<PurchaseInFlashSale>,
                    >,
                >,
                Ok = (),
                Err: Error,
            > + Clone
            + 'static,
    {
        let (queue, accepted) =
            mpsc::channel(config.purchase_queue.capacity);
        let this = Service {
            price_cache: PriceCache::new(config.price_cache),
            purchase_queue: queue,
            config,
            database,
        };

        let mut bg = task::Background::default();
        let svc = this.clone();
        bg.spawn(async move {
            svc.execute(Start(
                By::<task::CapturePriceSnapshots<Self>, _>::new(
                    svc.config().price_snapshots,
                ),
            ))
            .await
        });
        let svc = this.clone();
        bg.spawn(async move {
            svc.execute(Start(By::<task::ProcessPurchases, _>::new(
                accepted,
            )))
            .await
        });

        (this, bg)
    }

    /// Returns [`Config`] of this [`Service`].
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns [`Database`] of this [`Service`].
    #[must_use]
    pub fn database(&self) -> &Db {
        &self.database
    }

    /// Returns the [`PriceCache`] of this [`Service`].
    #[must_use]
    pub fn price_cache(&self) -> &PriceCache {
        &self.price_cache
    }

    /// Returns the sending side of the purchase queue of this [`Service`].
    pub(crate) fn purchase_queue(&self) -> &mpsc::Sender<PurchaseInFlashSale> {
        &self.purchase_queue
    }
}
