//! Stock-ledger [`Database`] implementations.

use std::sync::{Arc, PoisonError};

use common::operations::{By, Release, Reserve, Select};
use tracerr::Traced;

use crate::{
    domain::stock,
    infra::{
        database::{self, in_memory, InMemory},
        Database,
    },
};

impl InMemory {
    /// Looks up the ledger [`stock::Entry`] under the provided
    /// [`stock::Key`].
    fn ledger_entry(
        &self,
        key: stock::Key,
    ) -> Result<Arc<std::sync::Mutex<stock::Entry>>, Traced<database::Error>>
    {
        in_memory::read(&self.0.ledger).get(&key).cloned().ok_or_else(|| {
            tracerr::new!(database::Error::InMemory(
                in_memory::Error::LedgerEntryNotFound(key),
            ))
        })
    }
}

impl Database<Reserve<stock::Reservation>> for InMemory {
    type Ok = stock::Outcome;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Reserve(r): Reserve<stock::Reservation>,
    ) -> Result<Self::Ok, Self::Err> {
        let entry = self.ledger_entry(r.key).map_err(tracerr::wrap!())?;
        // The per-entry lock makes the stock and limit checks and both
        // counter updates a single indivisible step.
        let mut entry =
            entry.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entry.try_reserve(r.user_id, r.quantity))
    }
}

impl Database<Release<stock::Reservation>> for InMemory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Release(r): Release<stock::Reservation>,
    ) -> Result<Self::Ok, Self::Err> {
        let entry = self.ledger_entry(r.key).map_err(tracerr::wrap!())?;
        entry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .release(r.user_id, r.quantity);
        Ok(())
    }
}

impl Database<Select<By<Option<stock::Levels>, stock::Key>>> for InMemory {
    type Ok = Option<stock::Levels>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<stock::Levels>, stock::Key>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(in_memory::read(&self.0.ledger).get(&by.into_inner()).map(
            |entry| {
                entry
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .levels()
            },
        ))
    }
}
