//! [`Query`] grouping revenue by UTC calendar day.

use common::operations::{By, Select};
use tracerr::Traced;

use crate::{
    domain::Purchase,
    infra::{database, Database},
    read::analytics::{self, DayRevenue},
    Service,
};

use super::super::Query;

/// [`Query`] grouping the revenue of all committed [`Purchase`]s by UTC
/// calendar day, oldest day first.
#[derive(Clone, Copy, Debug, Default)]
pub struct RevenueByDay;

impl<Db> Query<RevenueByDay> for Service<Db>
where
    Db: Database<
        Select<By<Vec<Purchase>, ()>>,
        Ok = Vec<Purchase>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Vec<DayRevenue>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: RevenueByDay,
    ) -> Result<Self::Ok, Self::Err> {
        let purchases = self
            .database()
            .execute(Select(By::<Vec<Purchase>, _>::new(())))
            .await
            .map_err(tracerr::wrap!())?;
        Ok(analytics::revenue_by_day(&purchases))
    }
}
