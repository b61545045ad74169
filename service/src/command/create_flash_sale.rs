//! [`Command`] for scheduling a new [`FlashSale`].

use std::collections::HashMap;

use common::{
    operations::{By, Insert, Select},
    Money, Percent,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{flash_sale, product, stock, FlashSale, Product},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for scheduling a new [`FlashSale`].
///
/// The sale is stored together with its stock ledger entries, and comes to
/// life by itself once the clock passes its start.
#[derive(Clone, Debug)]
pub struct CreateFlashSale {
    /// [`flash_sale::Name`] of a new [`FlashSale`].
    pub name: flash_sale::Name,

    /// [`flash_sale::Description`] of a new [`FlashSale`].
    pub description: Option<flash_sale::Description>,

    /// [`DateTime`] when a new [`FlashSale`] starts.
    ///
    /// [`DateTime`]: common::DateTime
    pub starts_at: flash_sale::StartDateTime,

    /// [`DateTime`] when a new [`FlashSale`] ends.
    ///
    /// [`DateTime`]: common::DateTime
    pub ends_at: flash_sale::EndDateTime,

    /// Offers of a new [`FlashSale`].
    pub products: Vec<ProductOffer>,
}

/// Single [`Product`] offer of a [`CreateFlashSale`] [`Command`].
#[derive(Clone, Copy, Debug)]
pub struct ProductOffer {
    /// ID of the offered [`Product`].
    pub product_id: product::Id,

    /// Flash price of the offered [`Product`].
    pub flash_price: Money,

    /// Stock allocated to the sale for the offered [`Product`].
    pub allocated_stock: stock::Quantity,

    /// Maximum total quantity a single user may purchase.
    pub per_user_limit: stock::Quantity,
}

impl<Db> Command<CreateFlashSale> for Service<Db>
where
    Db: Database<
            Select<By<Option<Product>, product::Id>>,
            Ok = Option<Product>,
            Err = Traced<database::Error>,
        > + Database<Insert<FlashSale>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = FlashSale;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreateFlashSale,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateFlashSale { name, description, starts_at, ends_at, products } =
            cmd;

        if starts_at.coerce() >= ends_at {
            return Err(tracerr::new!(E::WindowInverted));
        }
        if products.is_empty() {
            return Err(tracerr::new!(E::NoProducts));
        }

        let mut offers = HashMap::with_capacity(products.len());
        for offer in products {
            if !offer.flash_price.is_positive() {
                return Err(tracerr::new!(E::InvalidFlashPrice(
                    offer.product_id,
                )));
            }
            if offer.allocated_stock == 0 || offer.per_user_limit == 0 {
                return Err(tracerr::new!(E::InvalidAllocation(
                    offer.product_id,
                )));
            }

            let product = self
                .database()
                .execute(Select(By::<Option<Product>, _>::new(
                    offer.product_id,
                )))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?
                .ok_or(E::ProductNotFound(offer.product_id))
                .map_err(tracerr::wrap!())?;

            _ = offers.insert(offer.product_id, flash_sale::Product {
                product_id: offer.product_id,
                flash_price: offer.flash_price,
                original_price: product.current_price,
                discount: Percent::discount_between(
                    product.current_price,
                    offer.flash_price,
                )
                .unwrap_or(Percent::ZERO),
                allocated_stock: offer.allocated_stock,
                per_user_limit: offer.per_user_limit,
            });
        }

        let sale = FlashSale {
            id: flash_sale::Id::new(),
            name,
            description,
            starts_at,
            ends_at,
            visitors: 0,
            force_ended_at: None,
            products: offers,
        };
        self.database()
            .execute(Insert(sale.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // No cache bookkeeping here: flash offers are checked against the
        // live store on every resolution, since a sale may cross into its
        // window at any instant anyway.

        Ok(sale)
    }
}

/// Error of [`CreateFlashSale`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Offered stock allocation or per-user limit is zero.
    #[display("invalid stock allocation for `Product(id: {_0})`")]
    InvalidAllocation(#[error(not(source))] product::Id),

    /// Offered flash price is not positive.
    #[display("invalid flash price for `Product(id: {_0})`")]
    InvalidFlashPrice(#[error(not(source))] product::Id),

    /// No [`Product`] offers were provided.
    #[display("a `FlashSale` must offer at least one `Product`")]
    NoProducts,

    /// Offered [`Product`] doesn't exist.
    #[display("`Product(id: {_0})` doesn't exist")]
    ProductNotFound(#[error(not(source))] product::Id),

    /// Provided sale window ends before it starts.
    #[display("a `FlashSale` must end after it starts")]
    WindowInverted,
}
