//! [`PricingRule`]-related [`Database`] implementations.

use common::operations::{By, Delete, Insert, Select, Update};
use tracerr::Traced;

use crate::{
    domain::{pricing_rule, PricingRule},
    infra::{
        database::{self, in_memory, InMemory},
        Database,
    },
};

impl Database<Insert<PricingRule>> for InMemory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(rule): Insert<PricingRule>,
    ) -> Result<Self::Ok, Self::Err> {
        let mut rules = in_memory::write(&self.0.rules);
        if rules.contains_key(&rule.id) {
            return Err(tracerr::new!(database::Error::InMemory(
                in_memory::Error::DuplicateRule(rule.id),
            )));
        }
        _ = rules.insert(rule.id, rule);
        Ok(())
    }
}

impl Database<Update<PricingRule>> for InMemory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(rule): Update<PricingRule>,
    ) -> Result<Self::Ok, Self::Err> {
        let mut rules = in_memory::write(&self.0.rules);
        if !rules.contains_key(&rule.id) {
            return Err(tracerr::new!(database::Error::InMemory(
                in_memory::Error::RuleNotFound(rule.id),
            )));
        }
        _ = rules.insert(rule.id, rule);
        Ok(())
    }
}

impl Database<Delete<By<Option<PricingRule>, pricing_rule::Id>>>
    for InMemory
{
    type Ok = Option<PricingRule>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Option<PricingRule>, pricing_rule::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(in_memory::write(&self.0.rules).remove(&by.into_inner()))
    }
}

impl Database<Select<By<Option<PricingRule>, pricing_rule::Id>>>
    for InMemory
{
    type Ok = Option<PricingRule>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<PricingRule>, pricing_rule::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(in_memory::read(&self.0.rules).get(&by.into_inner()).cloned())
    }
}

impl Database<Select<By<Vec<PricingRule>, ()>>> for InMemory {
    type Ok = Vec<PricingRule>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Select<By<Vec<PricingRule>, ()>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(in_memory::read(&self.0.rules).values().cloned().collect())
    }
}
