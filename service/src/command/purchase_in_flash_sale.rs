//! [`Command`] for purchasing a [`Product`] within a [`FlashSale`].

use common::{
    operations::{By, Insert, Release, Reserve, Select, Update},
    DateTime, Money,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        flash_sale, price_history, pricing_rule, product,
        purchase::{self, attempt, Receipt},
        stock, user, FlashSale, Purchase,
    },
    infra::{database, Database},
    query::{price, Query, ResolvePrice},
    read,
    Service,
};
#[cfg(doc)]
use crate::domain::Product;

use super::Command;

/// [`Command`] for purchasing a [`Product`] within a [`FlashSale`].
///
/// The pipeline runs as: attempt claim, lifecycle gate, price check, stock
/// reservation, persistence. Stock is the only step mutating shared state
/// before the [`Purchase`] is stored, so a persistence failure is
/// compensated by releasing the reservation.
///
/// Re-submitting an attempt that already committed returns the original
/// [`Receipt`] instead of purchasing twice.
#[derive(Clone, Copy, Debug)]
pub struct PurchaseInFlashSale {
    /// Client-generated ID of this attempt, serving as the idempotency key.
    pub attempt_id: attempt::Id,

    /// ID of the purchasing user.
    pub user_id: user::Id,

    /// [`user::Tier`] of the purchasing user, if known.
    pub user_tier: Option<user::Tier>,

    /// ID of the [`FlashSale`] to purchase in.
    pub flash_sale_id: flash_sale::Id,

    /// ID of the [`Product`] to purchase.
    pub product_id: product::Id,

    /// [`stock::Quantity`] to purchase.
    pub quantity: stock::Quantity,

    /// Unit price the client saw when deciding to buy.
    ///
    /// Diverging from the resolved price fails the attempt instead of
    /// silently charging a different amount.
    pub stated_price: Money,
}

impl<Db> Command<PurchaseInFlashSale> for Service<Db>
where
    Db: Database<
            Reserve<attempt::Record>,
            Ok = attempt::ClaimOutcome,
            Err = Traced<database::Error>,
        > + Database<
            Update<attempt::Record>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<FlashSale>, flash_sale::Id>>,
            Ok = Option<FlashSale>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<read::flash_sale::StockExhausted, flash_sale::Id>>,
            Ok = read::flash_sale::StockExhausted,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<Purchase>, product::Id>>,
            Ok = Vec<Purchase>,
            Err = Traced<database::Error>,
        > + Database<
            Reserve<stock::Reservation>,
            Ok = stock::Outcome,
            Err = Traced<database::Error>,
        > + Database<
            Release<stock::Reservation>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<Insert<Purchase>, Ok = (), Err = Traced<database::Error>>
        + Database<
            Insert<price_history::Entry>,
            Ok = (),
            Err = Traced<database::Error>,
        >,
    Self: Query<
        ResolvePrice,
        Ok = read::pricing::Resolution,
        Err = Traced<price::ExecutionError>,
    >,
{
    type Ok = Receipt;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: PurchaseInFlashSale,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let claim = self
            .database()
            .execute(Reserve(attempt::Record {
                id: cmd.attempt_id,
                user_id: cmd.user_id,
                flash_sale_id: cmd.flash_sale_id,
                product_id: cmd.product_id,
                status: attempt::Status::Pending,
            }))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        match claim {
            attempt::ClaimOutcome::Committed(receipt) => {
                return Ok(receipt);
            }
            attempt::ClaimOutcome::InFlight => {
                return Err(tracerr::new!(E::AttemptPending(
                    cmd.attempt_id,
                )));
            }
            attempt::ClaimOutcome::Acquired => {}
        }

        let result = async {
            if cmd.quantity == 0 {
                return Err(tracerr::new!(E::InvalidQuantity));
            }

            let sale = self
                .database()
                .execute(Select(By::<Option<FlashSale>, _>::new(
                    cmd.flash_sale_id,
                )))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?
                .ok_or(E::SaleNotFound(cmd.flash_sale_id))
                .map_err(tracerr::wrap!())?;
            let offer = *sale
                .products
                .get(&cmd.product_id)
                .ok_or(E::ProductNotInSale(cmd.product_id))
                .map_err(tracerr::wrap!())?;

            let now = DateTime::now();
            let read::flash_sale::StockExhausted(exhausted) = self
                .database()
                .execute(Select(
                    By::<read::flash_sale::StockExhausted, _>::new(sale.id),
                ))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;
            let state = sale.state_at(now, exhausted);
            if state != flash_sale::State::Active {
                return Err(tracerr::new!(E::SaleNotActive(state)));
            }

            let resolution = self
                .execute(ResolvePrice {
                    product_id: cmd.product_id,
                    // Pricing against the very sale being purchased in, so
                    // an overlapping earlier sale cannot hijack the check.
                    flash_sale_id: Some(cmd.flash_sale_id),
                    context: pricing_rule::Context {
                        quantity: cmd.quantity,
                        user_tier: cmd.user_tier,
                        at: now,
                    },
                })
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;
            if resolution.unit_price != cmd.stated_price {
                return Err(tracerr::new!(E::PriceMismatch {
                    stated: cmd.stated_price,
                    actual: resolution.unit_price,
                }));
            }

            let first_of_product = self
                .database()
                .execute(Select(By::<Vec<Purchase>, _>::new(cmd.product_id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?
                .iter()
                .all(|p| p.flash_sale_id != sale.id);

            let reservation = stock::Reservation {
                key: sale.stock_key(cmd.product_id),
                user_id: cmd.user_id,
                quantity: cmd.quantity,
            };
            match self
                .database()
                .execute(Reserve(reservation))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?
            {
                stock::Outcome::Reserved(_) => {}
                stock::Outcome::Rejected(stock::Rejection::OutOfStock {
                    remaining,
                }) => {
                    return Err(tracerr::new!(E::OutOfStock { remaining }));
                }
                stock::Outcome::Rejected(
                    stock::Rejection::LimitExceeded { remaining_allowance },
                ) => {
                    return Err(tracerr::new!(E::LimitExceeded {
                        remaining_allowance,
                    }));
                }
            }

            let total_price = resolution.unit_price * cmd.quantity;
            let savings = (offer.original_price * cmd.quantity)
                .checked_sub(total_price)
                .filter(Money::is_positive)
                .unwrap_or(total_price * 0);
            let purchase = Purchase {
                id: purchase::Id::new(),
                attempt_id: cmd.attempt_id,
                user_id: cmd.user_id,
                flash_sale_id: sale.id,
                product_id: cmd.product_id,
                quantity: cmd.quantity,
                unit_price: resolution.unit_price,
                total_price,
                savings,
                at: now.coerce(),
            };
            if let Err(e) =
                self.database().execute(Insert(purchase)).await
            {
                // The slot was taken but the purchase won't exist, so the
                // stock goes back before the failure surfaces.
                if let Err(e) =
                    self.database().execute(Release(reservation)).await
                {
                    log::error!(
                        "failed to release stock under {}: {e}",
                        reservation.key,
                    );
                }
                return Err(e).map_err(tracerr::map_from_and_wrap!(=> E));
            }

            if first_of_product {
                let entry = price_history::Entry {
                    id: price_history::Id::new(),
                    product_id: cmd.product_id,
                    price: resolution.unit_price,
                    cause: price_history::Cause::FlashSaleStarted,
                    at: now.coerce(),
                };
                // History is informational: losing an entry must not undo
                // a committed purchase.
                if let Err(e) =
                    self.database().execute(Insert(entry)).await
                {
                    log::error!(
                        "failed to record price history of `Product` {}: \
                         {e}",
                        cmd.product_id,
                    );
                }
            }

            Ok(purchase.receipt())
        }
        .await;

        let status = match &result {
            Ok(receipt) => attempt::Status::Committed(*receipt),
            Err(e) => attempt::Status::Failed(e.as_ref().failure()),
        };
        if let Err(e) = self
            .database()
            .execute(Update(attempt::Record {
                id: cmd.attempt_id,
                user_id: cmd.user_id,
                flash_sale_id: cmd.flash_sale_id,
                product_id: cmd.product_id,
                status,
            }))
            .await
        {
            log::error!(
                "failed to update purchase attempt {}: {e}",
                cmd.attempt_id,
            );
        }

        result
    }
}

/// Error of [`PurchaseInFlashSale`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// Same attempt is being processed already.
    #[display("purchase attempt {_0} is being processed already")]
    AttemptPending(#[error(not(source))] attempt::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Requested quantity is zero.
    #[display("purchase quantity must be positive")]
    InvalidQuantity,

    /// Purchase would push the user over the per-user limit.
    #[display(
        "per-user limit exceeded: {remaining_allowance} more may be \
         purchased"
    )]
    LimitExceeded {
        /// [`stock::Quantity`] the user may still purchase.
        remaining_allowance: stock::Quantity,
    },

    /// Not enough stock remains.
    #[display("out of stock: {remaining} remaining")]
    OutOfStock {
        /// [`stock::Quantity`] still remaining.
        remaining: stock::Quantity,
    },

    /// Price resolution failed.
    #[display("price resolution failed: {_0}")]
    #[from]
    Price(price::ExecutionError),

    /// Resolved price diverged from the one the client stated.
    #[display("price mismatch: stated {stated}, actual {actual}")]
    PriceMismatch {
        /// Unit price the client stated.
        stated: Money,

        /// Unit price actually resolved.
        actual: Money,
    },

    /// [`Product`] is not offered by the [`FlashSale`].
    #[display("`Product(id: {_0})` is not offered by the `FlashSale`")]
    ProductNotInSale(#[error(not(source))] product::Id),

    /// [`FlashSale`] is not in its active state.
    #[display("`FlashSale` is {_0}, not active")]
    SaleNotActive(#[error(not(source))] flash_sale::State),

    /// [`FlashSale`] with the provided ID doesn't exist.
    #[display("`FlashSale(id: {_0})` doesn't exist")]
    SaleNotFound(#[error(not(source))] flash_sale::Id),
}

impl ExecutionError {
    /// Maps this [`ExecutionError`] to the [`attempt::Failure`] recorded on
    /// the attempt.
    fn failure(&self) -> attempt::Failure {
        use attempt::Failure as F;

        match self {
            Self::AttemptPending(_) | Self::Db(_) => F::Internal,
            Self::InvalidQuantity => F::InvalidQuantity,
            Self::LimitExceeded { .. } => F::LimitExceeded,
            Self::OutOfStock { .. } => F::OutOfStock,
            Self::Price(price::ExecutionError::Db(_)) => F::Internal,
            Self::Price(price::ExecutionError::NoPriceAvailable(_))
            | Self::ProductNotInSale(_)
            | Self::SaleNotFound(_) => F::NotFound,
            Self::PriceMismatch { .. } => F::PriceMismatch,
            Self::SaleNotActive(_) => F::SaleNotActive,
        }
    }
}
