//! [`Query`] estimating the price elasticity of a [`Product`].

use common::operations::{By, Select};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{product, Product, Purchase},
    infra::{database, Database},
    read::analytics::{ArcEstimator, Elasticity, Estimator},
    Service,
};

use super::super::Query;

/// [`Query`] estimating the price [`Elasticity`] of demand of a
/// [`Product`].
///
/// The estimation strategy is pluggable; the default is the arc (midpoint)
/// formula of [`ArcEstimator`].
#[derive(Clone, Copy, Debug)]
pub struct PriceElasticity<E = ArcEstimator> {
    /// ID of the [`Product`] to estimate for.
    pub product_id: product::Id,

    /// [`Estimator`] to run.
    pub estimator: E,
}

impl PriceElasticity {
    /// Creates a new [`PriceElasticity`] [`Query`] running the default
    /// [`ArcEstimator`].
    #[must_use]
    pub fn new(product_id: product::Id) -> Self {
        Self {
            product_id,
            estimator: ArcEstimator,
        }
    }
}

impl<Db, E> Query<PriceElasticity<E>> for Service<Db>
where
    E: Estimator,
    Db: Database<
            Select<By<Option<Product>, product::Id>>,
            Ok = Option<Product>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<Purchase>, product::Id>>,
            Ok = Vec<Purchase>,
            Err = Traced<database::Error>,
        >,
{
    type Ok = Elasticity;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        PriceElasticity { product_id, estimator }: PriceElasticity<E>,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as Error;

        let product = self
            .database()
            .execute(Select(By::<Option<Product>, _>::new(product_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> Error))?
            .ok_or(Error::ProductNotFound(product_id))
            .map_err(tracerr::wrap!())?;

        let purchases = self
            .database()
            .execute(Select(By::<Vec<Purchase>, _>::new(product_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> Error))?;

        Ok(estimator.estimate(&product, &purchases))
    }
}

/// Error of [`PriceElasticity`] [`Query`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Product`] with the provided ID doesn't exist.
    #[display("`Product(id: {_0})` doesn't exist")]
    ProductNotFound(#[error(not(source))] product::Id),
}
