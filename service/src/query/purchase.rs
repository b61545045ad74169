//! [`Query`] collection related to [`Purchase`]s.
//!
//! [`Purchase`]: crate::domain::Purchase

use common::operations::{By, Select};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{flash_sale, product, purchase::attempt, FlashSale, Purchase},
    infra::{database, Database},
    read,
    Service,
};

use super::{DatabaseQuery, Query};

/// Queries a purchase [`attempt::Record`] by its [`attempt::Id`].
///
/// This is how a client learns the outcome of a purchase submitted through
/// [`SubmitPurchase`].
///
/// [`SubmitPurchase`]: crate::command::SubmitPurchase
pub type AttemptStatus =
    DatabaseQuery<By<Option<attempt::Record>, attempt::Id>>;

/// [`Query`] summarizing the [`Purchase`]s a single user has made of a
/// single [`Product`] within a single [`FlashSale`].
///
/// [`Product`]: crate::domain::Product
/// [`Purchase`]: crate::domain::Purchase
#[derive(Clone, Copy, Debug)]
pub struct SummaryForUser {
    /// [`read::purchase::Actor`] to summarize for.
    pub actor: read::purchase::Actor,
}

impl<Db> Query<SummaryForUser> for Service<Db>
where
    Db: Database<
            Select<By<Option<FlashSale>, flash_sale::Id>>,
            Ok = Option<FlashSale>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<Purchase>, read::purchase::Actor>>,
            Ok = Vec<Purchase>,
            Err = Traced<database::Error>,
        >,
{
    type Ok = read::purchase::Summary;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        SummaryForUser { actor }: SummaryForUser,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let sale = self
            .database()
            .execute(Select(By::<Option<FlashSale>, _>::new(
                actor.flash_sale_id,
            )))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::SaleNotFound(actor.flash_sale_id))
            .map_err(tracerr::wrap!())?;
        let offer = sale
            .products
            .get(&actor.product_id)
            .ok_or(E::ProductNotInSale(actor.product_id))
            .map_err(tracerr::wrap!())?;

        let purchases = self
            .database()
            .execute(Select(By::<Vec<Purchase>, _>::new(actor)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let total_purchased =
            purchases.iter().map(|p| p.quantity).sum::<u32>();
        Ok(read::purchase::Summary {
            entries: purchases
                .iter()
                .map(|p| read::purchase::Entry {
                    purchase_id: p.id,
                    quantity: p.quantity,
                    at: p.at,
                })
                .collect(),
            total_purchased,
            limit_remaining: offer
                .per_user_limit
                .saturating_sub(total_purchased),
        })
    }
}

/// Error of [`SummaryForUser`] [`Query`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Product`] is not offered by the [`FlashSale`].
    ///
    /// [`Product`]: crate::domain::Product
    #[display("`Product(id: {_0})` is not offered by the `FlashSale`")]
    ProductNotInSale(#[error(not(source))] product::Id),

    /// [`FlashSale`] with the provided ID doesn't exist.
    #[display("`FlashSale(id: {_0})` doesn't exist")]
    SaleNotFound(#[error(not(source))] flash_sale::Id),
}
