//! [`FlashSale`]-related [`Database`] implementations.

use std::sync::{Arc, Mutex, PoisonError};

use common::{
    operations::{By, Insert, Select, Update},
    DateTime,
};
use tracerr::Traced;

use crate::{
    domain::{flash_sale, product, stock, FlashSale},
    infra::{
        database::{self, in_memory, InMemory},
        Database,
    },
    read,
};

impl Database<Insert<FlashSale>> for InMemory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(sale): Insert<FlashSale>,
    ) -> Result<Self::Ok, Self::Err> {
        let mut sales = in_memory::write(&self.0.sales);
        if sales.contains_key(&sale.id) {
            return Err(tracerr::new!(database::Error::InMemory(
                in_memory::Error::DuplicateSale(sale.id),
            )));
        }

        // Ledger entries are born together with the sale, so a reservation
        // can never observe a sale without its stock.
        let mut ledger = in_memory::write(&self.0.ledger);
        for p in sale.products.values() {
            _ = ledger.insert(
                sale.stock_key(p.product_id),
                Arc::new(Mutex::new(stock::Entry::new(
                    p.allocated_stock,
                    p.per_user_limit,
                ))),
            );
        }
        drop(ledger);

        _ = sales.insert(sale.id, sale);
        Ok(())
    }
}

impl Database<Update<FlashSale>> for InMemory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(sale): Update<FlashSale>,
    ) -> Result<Self::Ok, Self::Err> {
        let mut sales = in_memory::write(&self.0.sales);
        if !sales.contains_key(&sale.id) {
            return Err(tracerr::new!(database::Error::InMemory(
                in_memory::Error::SaleNotFound(sale.id),
            )));
        }
        _ = sales.insert(sale.id, sale);
        Ok(())
    }
}

impl Database<Select<By<Option<FlashSale>, flash_sale::Id>>> for InMemory {
    type Ok = Option<FlashSale>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<FlashSale>, flash_sale::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(in_memory::read(&self.0.sales).get(&by.into_inner()).cloned())
    }
}

impl Database<Update<flash_sale::Visit>> for InMemory {
    type Ok = Option<u64>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(flash_sale::Visit(id)): Update<flash_sale::Visit>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(in_memory::write(&self.0.sales).get_mut(&id).map(|sale| {
            sale.visitors += 1;
            sale.visitors
        }))
    }
}

impl
    Database<
        Select<
            By<
                Option<read::pricing::FlashOffer>,
                (Option<flash_sale::Id>, product::Id, DateTime),
            >,
        >,
    > for InMemory
{
    type Ok = Option<read::pricing::FlashOffer>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<
                Option<read::pricing::FlashOffer>,
                (Option<flash_sale::Id>, product::Id, DateTime),
            >,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let (sale_id, product_id, at) = by.into_inner();

        let sales = in_memory::read(&self.0.sales);
        let ledger = in_memory::read(&self.0.ledger);
        Ok(sales
            .values()
            .filter(|sale| {
                sale_id.is_none_or(|id| sale.id == id)
                    && sale.force_ended_at.is_none()
                    && at >= sale.starts_at.coerce()
                    && at < sale.ends_at.coerce()
                    && sale.products.contains_key(&product_id)
            })
            // Untargeted overlapping sales resolve to the earliest started
            // one.
            .min_by_key(|sale| sale.starts_at)
            .and_then(|sale| {
                let p = sale.products.get(&product_id)?;
                let remaining = ledger
                    .get(&sale.stock_key(product_id))?
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .remaining();
                (remaining > 0).then(|| read::pricing::FlashOffer {
                    flash_sale_id: sale.id,
                    flash_price: p.flash_price,
                    per_user_limit: p.per_user_limit,
                    remaining,
                })
            }))
    }
}

impl Database<Select<By<read::flash_sale::StockExhausted, flash_sale::Id>>>
    for InMemory
{
    type Ok = read::flash_sale::StockExhausted;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<read::flash_sale::StockExhausted, flash_sale::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        let sales = in_memory::read(&self.0.sales);
        let Some(sale) = sales.get(&id) else {
            return Err(tracerr::new!(database::Error::InMemory(
                in_memory::Error::SaleNotFound(id),
            )));
        };

        let ledger = in_memory::read(&self.0.ledger);
        let exhausted = sale.products.keys().all(|product_id| {
            ledger.get(&sale.stock_key(*product_id)).is_none_or(|entry| {
                entry
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .is_exhausted()
            })
        });
        Ok(read::flash_sale::StockExhausted(exhausted))
    }
}
