//! [`Command`] for deleting a [`PricingRule`].

use common::operations::{By, Delete};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{pricing_rule, PricingRule},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for deleting an existing [`PricingRule`].
#[derive(Clone, Copy, Debug)]
pub struct DeletePricingRule {
    /// ID of the [`PricingRule`] to delete.
    pub id: pricing_rule::Id,
}

impl<Db> Command<DeletePricingRule> for Service<Db>
where
    Db: Database<
        Delete<By<Option<PricingRule>, pricing_rule::Id>>,
        Ok = Option<PricingRule>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = PricingRule;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        DeletePricingRule { id }: DeletePricingRule,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let removed = self
            .database()
            .execute(Delete(By::<Option<PricingRule>, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::RuleNotFound(id))
            .map_err(tracerr::wrap!())?;

        self.price_cache().invalidate_rule_scope(&removed);

        Ok(removed)
    }
}

/// Error of [`DeletePricingRule`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`PricingRule`] with the provided ID doesn't exist.
    #[display("`PricingRule(id: {_0})` doesn't exist")]
    RuleNotFound(#[error(not(source))] pricing_rule::Id),
}
