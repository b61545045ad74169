//! [`Command`] for registering a new [`Product`].

use common::{operations::Insert, DateTime, Money};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{product, Product},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for registering a new [`Product`] in the catalog.
#[derive(Clone, Debug)]
pub struct CreateProduct {
    /// [`product::Name`] of a new [`Product`].
    pub name: product::Name,

    /// [`product::Category`] of a new [`Product`].
    pub category: product::Category,

    /// Base price of a new [`Product`].
    pub base_price: Money,

    /// Floor price of a new [`Product`].
    pub min_price: Money,

    /// Informational cost price of a new [`Product`].
    pub cost_price: Money,
}

impl<Db> Command<CreateProduct> for Service<Db>
where
    Db: Database<Insert<Product>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = Product;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreateProduct,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateProduct { name, category, base_price, min_price, cost_price } =
            cmd;

        if !base_price.is_positive()
            || base_price.partial_cmp(&min_price).is_none()
            || min_price > base_price
        {
            return Err(tracerr::new!(E::InvalidPrices {
                base_price,
                min_price,
            }));
        }

        let product = Product {
            id: product::Id::new(),
            name,
            category,
            current_price: base_price,
            base_price,
            min_price,
            cost_price,
            created_at: DateTime::now().coerce(),
        };
        self.database()
            .execute(Insert(product.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        Ok(product)
    }
}

/// Error of [`CreateProduct`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Provided prices are inconsistent.
    #[display(
        "invalid prices: base price {base_price} must be positive and not \
         below the floor price {min_price}"
    )]
    InvalidPrices {
        /// Provided base price.
        base_price: Money,

        /// Provided floor price.
        min_price: Money,
    },
}
