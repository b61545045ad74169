//! [`Command`] for creating a new [`PricingRule`].

use std::collections::HashSet;

use common::{operations::Insert, DateTime};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{pricing_rule, product, PricingRule},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for creating a new [`PricingRule`].
///
/// The price cache is invalidated for the scope of the new rule before the
/// [`Command`] acknowledges, so no stale price survives the mutation.
#[derive(Clone, Debug)]
pub struct CreatePricingRule {
    /// [`pricing_rule::Name`] of a new [`PricingRule`].
    pub name: pricing_rule::Name,

    /// IDs of the [`Product`]s a new [`PricingRule`] is scoped to.
    ///
    /// [`Product`]: crate::domain::Product
    pub product_ids: HashSet<product::Id>,

    /// [`product::Category`]s a new [`PricingRule`] is scoped to.
    pub categories: HashSet<product::Category>,

    /// [`pricing_rule::Kind`] of a new [`PricingRule`].
    pub kind: pricing_rule::Kind,

    /// [`pricing_rule::Priority`] of a new [`PricingRule`].
    pub priority: pricing_rule::Priority,

    /// [`pricing_rule::Status`] of a new [`PricingRule`].
    pub status: pricing_rule::Status,

    /// [`DateTime`] since which a new [`PricingRule`] applies, if bounded.
    pub valid_from: Option<pricing_rule::ValidityDateTime>,

    /// [`DateTime`] until which a new [`PricingRule`] applies, if bounded.
    pub valid_until: Option<pricing_rule::ValidityDateTime>,
}

impl<Db> Command<CreatePricingRule> for Service<Db>
where
    Db: Database<Insert<PricingRule>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = PricingRule;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreatePricingRule,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreatePricingRule {
            name,
            product_ids,
            categories,
            kind,
            priority,
            status,
            valid_from,
            valid_until,
        } = cmd;

        let rule = PricingRule {
            id: pricing_rule::Id::new(),
            name,
            product_ids,
            categories,
            kind,
            priority,
            status,
            valid_from,
            valid_until,
            created_at: DateTime::now().coerce(),
            updated_at: DateTime::now().coerce(),
        };
        rule.validate().map_err(E::from).map_err(tracerr::wrap!())?;

        self.database()
            .execute(Insert(rule.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        self.price_cache().invalidate_rule_scope(&rule);

        Ok(rule)
    }
}

/// Error of [`CreatePricingRule`] [`Command`] execution.
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
}
