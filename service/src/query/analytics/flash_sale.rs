//! [`Query`] aggregating the [`Metrics`] of a [`FlashSale`].

use std::time::Duration;

use common::operations::{By, Select};
use derive_more::{Display, Error, From};
use smart_default::SmartDefault;
use tracerr::Traced;

use crate::{
    domain::{flash_sale, purchase::attempt, FlashSale, Purchase},
    infra::{database, Database},
    read::analytics::{self, Metrics},
    Service,
};

use super::super::Query;

/// [`Query`] aggregating the performance [`Metrics`] of a [`FlashSale`].
#[derive(Clone, Copy, Debug, SmartDefault)]
pub struct FlashSaleAnalytics {
    /// ID of the [`FlashSale`] to aggregate.
    pub flash_sale_id: flash_sale::Id,

    /// Width of a peak activity window.
    #[default(Duration::from_secs(300))]
    pub bucket: Duration,
}

impl<Db> Query<FlashSaleAnalytics> for Service<Db>
where
    Db: Database<
            Select<By<Option<FlashSale>, flash_sale::Id>>,
            Ok = Option<FlashSale>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<Purchase>, flash_sale::Id>>,
            Ok = Vec<Purchase>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<attempt::Record>, flash_sale::Id>>,
            Ok = Vec<attempt::Record>,
            Err = Traced<database::Error>,
        >,
{
    type Ok = Metrics;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        FlashSaleAnalytics { flash_sale_id, bucket }: FlashSaleAnalytics,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let sale = self
            .database()
            .execute(Select(By::<Option<FlashSale>, _>::new(flash_sale_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::SaleNotFound(flash_sale_id))
            .map_err(tracerr::wrap!())?;

        let purchases = self
            .database()
            .execute(Select(By::<Vec<Purchase>, _>::new(flash_sale_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let attempts = self
            .database()
            .execute(Select(By::<Vec<attempt::Record>, _>::new(
                flash_sale_id,
            )))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        Ok(analytics::metrics(&sale, &purchases, &attempts, bucket))
    }
}

/// Error of [`FlashSaleAnalytics`] [`Query`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`FlashSale`] with the provided ID doesn't exist.
    #[display("`FlashSale(id: {_0})` doesn't exist")]
    SaleNotFound(#[error(not(source))] flash_sale::Id),
}
