//! [`Command`] for enqueueing a [`PurchaseInFlashSale`].

use common::operations::{Reserve, Update};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::purchase::attempt,
    infra::{database, Database},
    Service,
};

use super::{Command, PurchaseInFlashSale};

/// [`Command`] handing a [`PurchaseInFlashSale`] over to the background
/// purchase worker.
///
/// The attempt is recorded as [`attempt::Status::Submitted`] before the
/// acknowledgment, so its [`attempt::Id`] is queryable immediately, not
/// only once the worker has picked it up. Re-submitting a queued or
/// committed attempt acknowledges again without enqueueing a duplicate.
#[derive(Clone, Copy, Debug, From)]
pub struct SubmitPurchase(pub PurchaseInFlashSale);

impl<Db> Command<SubmitPurchase> for Service<Db>
where
    Db: Database<
            Reserve<attempt::Record>,
            Ok = attempt::ClaimOutcome,
            Err = Traced<database::Error>,
        > + Database<
            Update<attempt::Record>,
            Ok = (),
            Err = Traced<database::Error>,
        >,
{
    type Ok = attempt::Id;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        SubmitPurchase(cmd): SubmitPurchase,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let attempt_id = cmd.attempt_id;
        let claim = self
            .database()
            .execute(Reserve(attempt::Record {
                id: attempt_id,
                user_id: cmd.user_id,
                flash_sale_id: cmd.flash_sale_id,
                product_id: cmd.product_id,
                status: attempt::Status::Submitted,
            }))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        match claim {
            attempt::ClaimOutcome::Acquired => {
                if self.purchase_queue().send(cmd).await.is_err() {
                    // The queued record would never be picked up, so it
                    // fails instead of sticking around as submitted.
                    if let Err(e) = self
                        .database()
                        .execute(Update(attempt::Record {
                            id: attempt_id,
                            user_id: cmd.user_id,
                            flash_sale_id: cmd.flash_sale_id,
                            product_id: cmd.product_id,
                            status: attempt::Status::Failed(
                                attempt::Failure::Internal,
                            ),
                        }))
                        .await
                    {
                        log::error!(
                            "failed to fail unqueued attempt {attempt_id}: \
                             {e}",
                        );
                    }
                    return Err(tracerr::new!(E::QueueClosed));
                }
            }
            // Queued, in processing or done already: the acknowledgment
            // alone is the answer.
            attempt::ClaimOutcome::InFlight
            | attempt::ClaimOutcome::Committed(_) => {}
        }
        Ok(attempt_id)
    }
}

/// Error of [`SubmitPurchase`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Purchase worker has shut down.
    #[display("purchase queue is closed")]
    QueueClosed,
}
