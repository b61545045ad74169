//! [`ProcessPurchases`] [`Task`].

use std::convert::Infallible;

use common::operations::{By, Start};
use smart_default::SmartDefault;
use tokio::sync::mpsc;
use tracerr::Traced;
use tracing as log;

use crate::{
    command::{purchase_in_flash_sale, Command, PurchaseInFlashSale},
    domain::purchase::Receipt,
    Service,
};

use super::Task;

/// Configuration for the [`ProcessPurchases`] [`Task`].
#[derive(Clone, Copy, Debug, SmartDefault)]
pub struct Config {
    /// Capacity of the purchase queue.
    ///
    /// Submissions beyond it apply backpressure to their callers.
    #[default = 1024]
    pub capacity: usize,
}

/// [`Task`] draining the purchase queue.
///
/// [`SubmitPurchase`] acknowledges with an attempt ID and hands the
/// [`PurchaseInFlashSale`] over here; a failed attempt is recorded on its
/// [`attempt::Record`] by the command itself, so this [`Task`] only logs
/// it.
///
/// [`SubmitPurchase`]: crate::command::SubmitPurchase
/// [`attempt::Record`]: crate::domain::purchase::attempt::Record
#[derive(Clone, Copy, Debug)]
pub struct ProcessPurchases;

impl<Db> Task<Start<By<ProcessPurchases, mpsc::Receiver<PurchaseInFlashSale>>>>
    for Service<Db>
where
    Self: Command<
        PurchaseInFlashSale,
        Ok = Receipt,
        Err = Traced<purchase_in_flash_sale::ExecutionError>,
    >,
{
    type Ok = ();
    type Err = Infallible;

    async fn execute(
        &self,
        Start(by): Start<
            By<ProcessPurchases, mpsc::Receiver<PurchaseInFlashSale>>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let mut queue = by.into_inner();
        while let Some(cmd) = queue.recv().await {
            let attempt_id = cmd.attempt_id;
            _ = self.execute(cmd).await.map_err(|e| {
                log::warn!("purchase attempt {attempt_id} failed: {e}");
            });
        }
        // All senders are gone, so no more purchases can arrive.
        Ok(())
    }
}
