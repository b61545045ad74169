//! [`CapturePriceSnapshots`] [`Task`].

use std::{convert::Infallible, error::Error, time};

use common::{
    operations::{By, Insert, Perform, Select, Start, Update},
    DateTime,
};
use smart_default::SmartDefault;
use tokio::time::interval;
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{price_history, pricing_rule, PricingRule, Product},
    infra::{database, Database},
    query::price::resolve_from_rules,
    Service,
};

use super::Task;

/// Configuration for the [`CapturePriceSnapshots`] [`Task`].
#[derive(Clone, Copy, Debug, SmartDefault)]
pub struct Config {
    /// Interval between snapshot rounds.
    #[default(time::Duration::from_secs(3600))]
    pub interval: time::Duration,
}

/// [`Task`] periodically snapshotting the resolved price of every
/// [`Product`].
///
/// Each round resolves every [`Product`] for the neutral context (single
/// unit, no user tier), stores a [`price_history::Snapshot`] and refreshes
/// the derived [`Product::current_price`], recording a
/// [`price_history::Entry`] whenever the effective price moved.
#[derive(Clone, Copy, Debug)]
pub struct CapturePriceSnapshots<S> {
    /// [`Config`] of this [`Task`].
    config: Config,

    /// [`Service`] instance.
    service: S,
}

impl<Db> Task<Start<By<CapturePriceSnapshots<Self>, Config>>> for Service<Db>
where
    CapturePriceSnapshots<Service<Db>>:
        Task<Perform<()>, Ok = (), Err: Error> + Send + Sync + 'static,
    Self: Clone,
{
    type Ok = ();
    type Err = Infallible;

    async fn execute(
        &self,
        Start(by): Start<By<CapturePriceSnapshots<Self>, Config>>,
    ) -> Result<Self::Ok, Self::Err> {
        let config = by.into_inner();
        let task = CapturePriceSnapshots {
            config,
            service: self.clone(),
        };

        let mut interval = interval(task.config.interval);
        loop {
            let _ = interval.tick().await;
            _ = task.execute(Perform(())).await.map_err(|e| {
                log::error!("`task::CapturePriceSnapshots` failed: {e}");
            });
        }
    }
}

impl<Db> Task<Perform<()>> for CapturePriceSnapshots<Service<Db>>
where
    Db: Database<
            Select<By<Vec<Product>, ()>>,
            Ok = Vec<Product>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<PricingRule>, ()>>,
            Ok = Vec<PricingRule>,
            Err = Traced<database::Error>,
        > + Database<
            Insert<price_history::Snapshot>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<
            Insert<price_history::Entry>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<Update<Product>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = ExecutionError;

    async fn execute(&self, _: Perform<()>) -> Result<Self::Ok, Self::Err> {
        let db = self.service.database();
        let products = db
            .execute(Select(By::<Vec<Product>, _>::new(())))
            .await
            .map_err(tracerr::wrap!())?;
        let rules = db
            .execute(Select(By::<Vec<PricingRule>, _>::new(())))
            .await
            .map_err(tracerr::wrap!())?;

        let now = DateTime::now();
        let context = pricing_rule::Context {
            quantity: 1,
            user_tier: None,
            at: now,
        };
        for mut product in products {
            let resolution = resolve_from_rules(&product, &rules, &context);

            db.execute(Insert(price_history::Snapshot {
                product_id: product.id,
                price: resolution.unit_price,
                active_rules: rules
                    .iter()
                    .filter(|r| {
                        r.applies_to(&product)
                            && r.is_valid_at(now)
                            && r.discount_for(&context).is_some()
                    })
                    .map(|r| r.id)
                    .collect(),
                at: now.coerce(),
            }))
            .await
            .map_err(tracerr::wrap!())?;

            if product.current_price != resolution.unit_price {
                product.current_price = resolution.unit_price;
                db.execute(Update(product.clone()))
                    .await
                    .map_err(tracerr::wrap!())?;
                db.execute(Insert(price_history::Entry {
                    id: price_history::Id::new(),
                    product_id: product.id,
                    price: resolution.unit_price,
                    cause: price_history::Cause::RuleApplied,
                    at: now.coerce(),
                }))
                .await
                .map_err(tracerr::wrap!())?;
            }
        }
        Ok(())
    }
}

/// Error of [`CapturePriceSnapshots`] execution.
pub type ExecutionError = Traced<database::Error>;
