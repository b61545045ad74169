//! [`Query`] resolving the effective price of a [`Product`].

use std::cmp;

use common::{
    operations::{By, Select},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{flash_sale, pricing_rule, product, PricingRule, Product},
    infra::{cache, database, Database},
    read::pricing::{FlashOffer, Resolution, Source},
    Service,
};
#[cfg(doc)]
use crate::domain::FlashSale;

use super::Query;

/// [`Query`] resolving the effective unit price of a [`Product`] for the
/// provided [`pricing_rule::Context`].
///
/// An active flash offer short-circuits rule evaluation entirely; otherwise
/// the applicable [`PricingRule`] with the highest priority wins, ties
/// going to the smallest rule ID.
///
/// Flash offers are always checked against the live store, since a sale
/// may become active (or stop being active) at any instant. Only rule and
/// base-price resolutions go through the price cache.
#[derive(Clone, Copy, Debug)]
pub struct ResolvePrice {
    /// ID of the [`Product`] to price.
    pub product_id: product::Id,

    /// ID of the [`FlashSale`] to price within, if the caller targets a
    /// concrete one.
    ///
    /// Without it, overlapping active sales resolve to the earliest
    /// started one.
    pub flash_sale_id: Option<flash_sale::Id>,

    /// [`pricing_rule::Context`] to price for.
    pub context: pricing_rule::Context,
}

impl<Db> Query<ResolvePrice> for Service<Db>
where
    Db: Database<
            Select<By<Option<Product>, product::Id>>,
            Ok = Option<Product>,
            Err = Traced<database::Error>,
        > + Database<
            Select<
                By<
                    Option<FlashOffer>,
                    (Option<flash_sale::Id>, product::Id, DateTime),
                >,
            >,
            Ok = Option<FlashOffer>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<PricingRule>, ()>>,
            Ok = Vec<PricingRule>,
            Err = Traced<database::Error>,
        >,
{
    type Ok = Resolution;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        ResolvePrice { product_id, flash_sale_id, context }: ResolvePrice,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        // A sale may cross into (or out of) its window between two
        // resolutions of the same cache key, so the offer is looked up in
        // the live store before the cache gets a say.
        let offer = self
            .database()
            .execute(Select(By::<Option<FlashOffer>, _>::new((
                flash_sale_id,
                product_id,
                context.at,
            ))))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if let Some(offer) = offer {
            // Flash prices are not clamped to the floor price: pricing a
            // sale below the floor is a conscious decision of its creator.
            return Ok(Resolution {
                product_id,
                unit_price: offer.flash_price,
                source: Source::FlashSale(offer.flash_sale_id),
                clamped: false,
            });
        }

        let key = cache::Key::quantized(product_id, &context);
        if let Some(cached) = self.price_cache().get(&key) {
            return Ok(cached);
        }

        let product = self
            .database()
            .execute(Select(By::<Option<Product>, _>::new(product_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::NoPriceAvailable(product_id))
            .map_err(tracerr::wrap!())?;
        let rules = self
            .database()
            .execute(Select(By::<Vec<PricingRule>, _>::new(())))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        let resolution = resolve_from_rules(&product, &rules, &context);

        self.price_cache().insert(key, resolution);
        Ok(resolution)
    }
}

/// Resolves the price of the provided [`Product`] from the provided
/// [`PricingRule`]s alone.
///
/// The applicable rule with the highest priority wins, ties going to the
/// smallest [`pricing_rule::Id`], and the result never goes below the
/// floor price of the [`Product`].
#[must_use]
pub fn resolve_from_rules(
    product: &Product,
    rules: &[PricingRule],
    context: &pricing_rule::Context,
) -> Resolution {
    let winner = rules
        .iter()
        .filter(|r| r.applies_to(product) && r.is_valid_at(context.at))
        .filter_map(|r| r.discount_for(context).map(|d| (r, d)))
        .max_by_key(|(r, _)| (r.priority, cmp::Reverse(r.id)));

    let (discounted, source) = match winner {
        Some((rule, discount)) => {
            (discount.discount(product.base_price), Source::Rule(rule.id))
        }
        None => (product.base_price, Source::BasePrice),
    };
    let unit_price = discounted.clamp_min(product.min_price);
    Resolution {
        product_id: product.id,
        unit_price,
        source,
        clamped: discounted.partial_cmp(&product.min_price)
            == Some(cmp::Ordering::Less),
    }
}

/// Error of [`ResolvePrice`] [`Query`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// No price can be resolved for the provided [`Product`].
    #[display("no price is available for `Product(id: {_0})`")]
    NoPriceAvailable(#[error(not(source))] product::Id),
}

#[cfg(test)]
mod spec {
    use std::{collections::HashSet, str::FromStr as _};

    use common::{Money, Percent};
    use uuid::Uuid;

    use super::*;

    fn usd(s: &str) -> Money {
        Money::from_str(&format!("{s}USD")).unwrap()
    }

    #[expect(unsafe_code, reason = "bypass")]
    fn product() -> Product {
        Product {
            id: product::Id::new(),
            // SAFETY: Valid constant.
            name: unsafe { product::Name::new_unchecked("Widget") },
            // SAFETY: Valid constant.
            category: unsafe {
                product::Category::new_unchecked("gadgets")
            },
            base_price: usd("100"),
            current_price: usd("100"),
            min_price: usd("60"),
            cost_price: usd("40"),
            created_at: DateTime::now().coerce(),
        }
    }

    #[expect(unsafe_code, reason = "bypass")]
    fn rule(
        id: pricing_rule::Id,
        priority: pricing_rule::Priority,
        discount: Percent,
    ) -> PricingRule {
        PricingRule {
            id,
            // SAFETY: Valid constant.
            name: unsafe { pricing_rule::Name::new_unchecked("Rule") },
            product_ids: HashSet::new(),
            categories: HashSet::new(),
            kind: pricing_rule::Kind::QuantityTier(vec![
                pricing_rule::QuantityTier {
                    min_quantity: 1,
                    max_quantity: None,
                    discount,
                },
            ]),
            priority,
            status: pricing_rule::Status::Active,
            valid_from: None,
            valid_until: None,
            created_at: DateTime::now().coerce(),
            updated_at: DateTime::now().coerce(),
        }
    }

    fn context() -> pricing_rule::Context {
        pricing_rule::Context {
            quantity: 1,
            user_tier: None,
            at: DateTime::now(),
        }
    }

    #[test]
    fn base_price_without_applicable_rules() {
        let product = product();

        let r = resolve_from_rules(&product, &[], &context());

        assert_eq!(r.unit_price, usd("100"));
        assert_eq!(r.source, Source::BasePrice);
        assert!(!r.clamped);
    }

    #[test]
    fn highest_priority_rule_wins() {
        let product = product();
        let ten = Percent::from_str("10").unwrap();
        let twenty = Percent::from_str("20").unwrap();
        let low = rule(pricing_rule::Id::new(), 1, ten);
        let high = rule(pricing_rule::Id::new(), 5, twenty);

        let r = resolve_from_rules(
            &product,
            &[low.clone(), high.clone()],
            &context(),
        );

        assert_eq!(r.source, Source::Rule(high.id));
        assert_eq!(r.unit_price, usd("80"));
    }

    #[test]
    fn equal_priority_ties_break_by_smallest_id() {
        let product = product();
        let ten = Percent::from_str("10").unwrap();
        let twenty = Percent::from_str("20").unwrap();
        let id_a = pricing_rule::Id::from(Uuid::from_u128(1));
        let id_b = pricing_rule::Id::from(Uuid::from_u128(2));
        let a = rule(id_a, 3, ten);
        let b = rule(id_b, 3, twenty);

        let r =
            resolve_from_rules(&product, &[b.clone(), a.clone()], &context());

        assert_eq!(r.source, Source::Rule(id_a));
        assert_eq!(r.unit_price, usd("90"));
    }

    #[test]
    fn overlapping_rules_of_different_kinds_resolve_by_priority() {
        let product = product();
        let ten = Percent::from_str("10").unwrap();
        let five = Percent::from_str("5").unwrap();
        let bulk = rule(pricing_rule::Id::new(), 10, ten);
        let gold = PricingRule {
            kind: pricing_rule::Kind::UserTier(pricing_rule::UserTier {
                tiers: HashSet::from([crate::domain::user::Tier::Gold]),
                discount: five,
            }),
            ..rule(pricing_rule::Id::new(), 5, five)
        };
        let context = pricing_rule::Context {
            quantity: 6,
            user_tier: Some(crate::domain::user::Tier::Gold),
            at: DateTime::now(),
        };

        // Both rules match the context; only the higher-priority one
        // shapes the price.
        let r = resolve_from_rules(
            &product,
            &[gold, bulk.clone()],
            &context,
        );

        assert_eq!(r.source, Source::Rule(bulk.id));
        assert_eq!(r.unit_price, usd("90"));
    }

    #[test]
    fn discount_is_clamped_to_floor_price() {
        let product = product();
        let half = Percent::from_str("50").unwrap();
        let deep = rule(pricing_rule::Id::new(), 1, half);

        let r = resolve_from_rules(&product, &[deep], &context());

        assert_eq!(r.unit_price, usd("60"));
        assert!(r.clamped);
    }

    #[test]
    fn inactive_and_expired_rules_are_skipped() {
        let product = product();
        let ten = Percent::from_str("10").unwrap();
        let mut inactive = rule(pricing_rule::Id::new(), 9, ten);
        inactive.status = pricing_rule::Status::Inactive;
        let mut expired = rule(pricing_rule::Id::new(), 9, ten);
        expired.valid_until = Some(
            (DateTime::now() - std::time::Duration::from_secs(60)).coerce(),
        );

        let r =
            resolve_from_rules(&product, &[inactive, expired], &context());

        assert_eq!(r.source, Source::BasePrice);
    }

    #[test]
    fn scoped_rule_skips_foreign_products() {
        let product = product();
        let ten = Percent::from_str("10").unwrap();
        let mut foreign = rule(pricing_rule::Id::new(), 9, ten);
        foreign.product_ids = HashSet::from([product::Id::new()]);

        let r = resolve_from_rules(&product, &[foreign], &context());

        assert_eq!(r.source, Source::BasePrice);
    }
}
