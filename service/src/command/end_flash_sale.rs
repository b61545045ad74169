//! [`Command`] for ending a [`FlashSale`] by hand.

use common::{
    operations::{By, Select, Update},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{flash_sale, FlashSale},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for ending a [`FlashSale`] ahead of its schedule.
///
/// Idempotent: ending an already ended sale keeps its original ending
/// moment.
#[derive(Clone, Copy, Debug)]
pub struct EndFlashSale {
    /// ID of the [`FlashSale`] to end.
    pub id: flash_sale::Id,
}

impl<Db> Command<EndFlashSale> for Service<Db>
where
    Db: Database<
            Select<By<Option<FlashSale>, flash_sale::Id>>,
            Ok = Option<FlashSale>,
            Err = Traced<database::Error>,
        > + Database<Update<FlashSale>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = FlashSale;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        EndFlashSale { id }: EndFlashSale,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let mut sale = self
            .database()
            .execute(Select(By::<Option<FlashSale>, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::SaleNotFound(id))
            .map_err(tracerr::wrap!())?;

        if sale.force_ended_at.is_none() {
            sale.force_ended_at = Some(DateTime::now().coerce());
            self.database()
                .execute(Update(sale.clone()))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;
        }

        Ok(sale)
    }
}

/// Error of [`EndFlashSale`] [`Command`] execution.
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
