//! [`Purchase`]-related [`Database`] implementations.

use common::operations::{By, Insert, Select};
use tracerr::Traced;

use crate::{
    domain::{flash_sale, product, Purchase},
    infra::{
        database::{self, in_memory, InMemory},
        Database,
    },
    read,
};

impl Database<Insert<Purchase>> for InMemory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(purchase): Insert<Purchase>,
    ) -> Result<Self::Ok, Self::Err> {
        in_memory::write(&self.0.purchases).push(purchase);
        Ok(())
    }
}

impl Database<Select<By<Vec<Purchase>, ()>>> for InMemory {
    type Ok = Vec<Purchase>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Select<By<Vec<Purchase>, ()>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(in_memory::read(&self.0.purchases).clone())
    }
}

impl Database<Select<By<Vec<Purchase>, flash_sale::Id>>> for InMemory {
    type Ok = Vec<Purchase>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Purchase>, flash_sale::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(in_memory::read(&self.0.purchases)
            .iter()
            .filter(|p| p.flash_sale_id == id)
            .copied()
            .collect())
    }
}

impl Database<Select<By<Vec<Purchase>, product::Id>>> for InMemory {
    type Ok = Vec<Purchase>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Purchase>, product::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(in_memory::read(&self.0.purchases)
            .iter()
            .filter(|p| p.product_id == id)
            .copied()
            .collect())
    }
}

impl Database<Select<By<Vec<Purchase>, read::purchase::Actor>>> for InMemory {
    type Ok = Vec<Purchase>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Purchase>, read::purchase::Actor>>,
    ) -> Result<Self::Ok, Self::Err> {
        let actor = by.into_inner();
        Ok(in_memory::read(&self.0.purchases)
            .iter()
            .filter(|p| {
                p.user_id == actor.user_id
                    && p.flash_sale_id == actor.flash_sale_id
                    && p.product_id == actor.product_id
            })
            .copied()
            .collect())
    }
}
