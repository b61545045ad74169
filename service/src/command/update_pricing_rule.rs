//! [`Command`] for updating an existing [`PricingRule`].

use std::collections::HashSet;

use common::{
    operations::{By, Select, Update},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{pricing_rule, product, PricingRule},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for replacing the parameters of an existing [`PricingRule`].
///
/// Invalidates the price cache for both the old and the new scope of the
/// rule, since either may hold prices the mutation made stale.
#[derive(Clone, Debug)]
pub struct UpdatePricingRule {
    /// ID of the [`PricingRule`] to update.
    pub id: pricing_rule::Id,

    /// New [`pricing_rule::Name`] of the [`PricingRule`].
    pub name: pricing_rule::Name,

    /// New [`Product`] scope of the [`PricingRule`].
    ///
    /// [`Product`]: crate::domain::Product
    pub product_ids: HashSet<product::Id>,

    /// New [`product::Category`] scope of the [`PricingRule`].
    pub categories: HashSet<product::Category>,

    /// New [`pricing_rule::Kind`] of the [`PricingRule`].
    pub kind: pricing_rule::Kind,

    /// New [`pricing_rule::Priority`] of the [`PricingRule`].
    pub priority: pricing_rule::Priority,

    /// New [`pricing_rule::Status`] of the [`PricingRule`].
    pub status: pricing_rule::Status,

    /// New lower validity bound of the [`PricingRule`].
    pub valid_from: Option<pricing_rule::ValidityDateTime>,

    /// New upper validity bound of the [`PricingRule`].
    pub valid_until: Option<pricing_rule::ValidityDateTime>,
}

impl<Db> Command<UpdatePricingRule> for Service<Db>
where
    Db: Database<
            Select<By<Option<PricingRule>, pricing_rule::Id>>,
            Ok = Option<PricingRule>,
            Err = Traced<database::Error>,
        > + Database<Update<PricingRule>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = PricingRule;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: UpdatePricingRule,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UpdatePricingRule {
            id,
            name,
            product_ids,
            categories,
            kind,
            priority,
            status,
            valid_from,
            valid_until,
        } = cmd;

        let existing = self
            .database()
            .execute(Select(By::<Option<PricingRule>, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::RuleNotFound(id))
            .map_err(tracerr::wrap!())?;

        let rule = PricingRule {
            id,
            name,
            product_ids,
            categories,
            kind,
            priority,
            status,
            valid_from,
            valid_until,
            created_at: existing.created_at,
            updated_at: DateTime::now().coerce(),
        };
        rule.validate().map_err(E::from).map_err(tracerr::wrap!())?;

        self.database()
            .execute(Update(rule.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        self.price_cache().invalidate_rule_scope(&existing);
        self.price_cache().invalidate_rule_scope(&rule);

        Ok(rule)
    }
}

/// Error of [`UpdatePricingRule`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Provided [`PricingRule`] parameters are malformed.
    #[display("invalid `PricingRule` configuration: {_0}")]
    #[from]
    InvalidConfiguration(pricing_rule::InvalidConfiguration),

    /// [`PricingRule`] with the provided ID doesn't exist.
    #[display("`PricingRule(id: {_0})` doesn't exist")]
    RuleNotFound(#[error(not(source))] pricing_rule::Id),
}
