//! [`Command`] for recording a [`FlashSale`] visit.

use common::operations::Update;
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::flash_sale,
    infra::{database, Database},
    Service,
};
#[cfg(doc)]
use crate::domain::FlashSale;

use super::Command;

/// [`Command`] for recording a visit of a [`FlashSale`] page.
///
/// Visits feed the conversion rate denominator of analytics.
#[derive(Clone, Copy, Debug)]
pub struct RecordVisit {
    /// ID of the visited [`FlashSale`].
    pub flash_sale_id: flash_sale::Id,
}

impl<Db> Command<RecordVisit> for Service<Db>
where
    Db: Database<
        Update<flash_sale::Visit>,
        Ok = Option<u64>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = u64;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        RecordVisit { flash_sale_id }: RecordVisit,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        self.database()
            .execute(Update(flash_sale::Visit(flash_sale_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::SaleNotFound(flash_sale_id))
            .map_err(tracerr::wrap!())
    }
}

/// Error of [`RecordVisit`] [`Command`] execution.
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
