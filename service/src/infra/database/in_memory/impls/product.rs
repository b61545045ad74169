//! [`Product`]-related [`Database`] implementations.

use common::operations::{By, Insert, Select, Update};
use tracerr::Traced;

use crate::{
    domain::{product, Product},
    infra::{
        database::{self, in_memory, InMemory},
        Database,
    },
};

impl Database<Insert<Product>> for InMemory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(product): Insert<Product>,
    ) -> Result<Self::Ok, Self::Err> {
        let mut products = in_memory::write(&self.0.products);
        if products.contains_key(&product.id) {
            return Err(tracerr::new!(database::Error::InMemory(
                in_memory::Error::DuplicateProduct(product.id),
            )));
        }
        _ = products.insert(product.id, product);
        Ok(())
    }
}

impl Database<Update<Product>> for InMemory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(product): Update<Product>,
    ) -> Result<Self::Ok, Self::Err> {
        let mut products = in_memory::write(&self.0.products);
        if !products.contains_key(&product.id) {
            return Err(tracerr::new!(database::Error::InMemory(
                in_memory::Error::ProductNotFound(product.id),
            )));
        }
        _ = products.insert(product.id, product);
        Ok(())
    }
}

impl Database<Select<By<Option<Product>, product::Id>>> for InMemory {
    type Ok = Option<Product>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Product>, product::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(in_memory::read(&self.0.products).get(&by.into_inner()).cloned())
    }
}

impl Database<Select<By<Vec<Product>, ()>>> for InMemory {
    type Ok = Vec<Product>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Select<By<Vec<Product>, ()>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(in_memory::read(&self.0.products).values().cloned().collect())
    }
}
