//! Price-history [`Database`] implementations.

use common::operations::{By, Insert, Select};
use tracerr::Traced;

use crate::{
    domain::{price_history, product},
    infra::{
        database::{self, in_memory, InMemory},
        Database,
    },
};

impl Database<Insert<price_history::Entry>> for InMemory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(entry): Insert<price_history::Entry>,
    ) -> Result<Self::Ok, Self::Err> {
        in_memory::write(&self.0.history).push(entry);
        Ok(())
    }
}

impl Database<Select<By<Vec<price_history::Entry>, product::Id>>>
    for InMemory
{
    type Ok = Vec<price_history::Entry>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<price_history::Entry>, product::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(in_memory::read(&self.0.history)
            .iter()
            .filter(|e| e.product_id == id)
            .copied()
            .collect())
    }
}

impl Database<Insert<price_history::Snapshot>> for InMemory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(snapshot): Insert<price_history::Snapshot>,
    ) -> Result<Self::Ok, Self::Err> {
        in_memory::write(&self.0.snapshots).push(snapshot);
        Ok(())
    }
}

impl Database<Select<By<Vec<price_history::Snapshot>, product::Id>>>
    for InMemory
{
    type Ok = Vec<price_history::Snapshot>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<price_history::Snapshot>, product::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(in_memory::read(&self.0.snapshots)
            .iter()
            .filter(|s| s.product_id == id)
            .cloned()
            .collect())
    }
}
