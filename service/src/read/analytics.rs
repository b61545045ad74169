//! Analytics read models and their computations.
//!
//! Everything here is a pure function over already-loaded data, so the
//! queries driving it stay thin and the formulas stay unit-testable.
//!
//! Monetary aggregates assume a single [`Currency`] per data set and come
//! out as [`None`] when the set is empty or mixes currencies.
//!
//! [`Currency`]: common::money::Currency

use std::{collections::HashSet, time::Duration};

use common::{DateTime, Money};
use itertools::Itertools as _;
use rust_decimal::{prelude::ToPrimitive as _, Decimal};

use crate::domain::{purchase::attempt, FlashSale, Product, Purchase};

/// Aggregated performance metrics of a single [`FlashSale`].
#[derive(Clone, Debug)]
pub struct Metrics {
    /// Total number of units sold.
    pub units_sold: u64,

    /// Total revenue of the sale.
    pub total_revenue: Option<Money>,

    /// Number of distinct purchasing users.
    pub unique_buyers: u64,

    /// Share of visitors who ended up buying.
    ///
    /// Falls back to the share of attempting users when no visits were
    /// recorded, and to zero when there were no attempts either.
    pub conversion_rate: f64,

    /// Average revenue per committed [`Purchase`].
    pub average_order_value: Option<Money>,

    /// Share of the allocated stock that was sold.
    pub sell_through_rate: f64,

    /// Purchase-count buckets, busiest first.
    pub peak_windows: Vec<PeakWindow>,
}

/// Fixed-width time bucket of [`Purchase`] activity.
#[derive(Clone, Copy, Debug)]
pub struct PeakWindow {
    /// [`DateTime`] the bucket starts at.
    pub starts_at: DateTime,

    /// Number of [`Purchase`]s committed inside the bucket.
    pub count: u64,
}

/// Revenue of a single UTC calendar day.
#[derive(Clone, Copy, Debug)]
pub struct DayRevenue {
    /// UTC calendar day.
    pub date: time::Date,

    /// Revenue committed on that day.
    pub revenue: Money,
}

/// Computes the [`Metrics`] of the provided [`FlashSale`].
///
/// `bucket` is the width of a [`PeakWindow`].
#[expect( // analytics tolerates the precision loss of wide counters
    clippy::cast_precision_loss,
    reason = "counters fit `f64` comfortably"
)]
#[must_use]
pub fn metrics(
    sale: &FlashSale,
    purchases: &[Purchase],
    attempts: &[attempt::Record],
    bucket: Duration,
) -> Metrics {
    let units_sold =
        purchases.iter().map(|p| u64::from(p.quantity)).sum::<u64>();
    let total_revenue = sum(purchases.iter().map(|p| p.total_price));
    let unique_buyers = purchases
        .iter()
        .map(|p| p.user_id)
        .collect::<HashSet<_>>()
        .len() as u64;

    let conversion_rate = if sale.visitors > 0 {
        unique_buyers as f64 / sale.visitors as f64
    } else {
        let attempting = attempts
            .iter()
            .map(|a| a.user_id)
            .collect::<HashSet<_>>()
            .len() as u64;
        if attempting > 0 {
            unique_buyers as f64 / attempting as f64
        } else {
            0.0
        }
    };

    let average_order_value = total_revenue.and_then(|total| {
        (!purchases.is_empty()).then(|| Money {
            amount: total.amount / Decimal::from(purchases.len()),
            currency: total.currency,
        })
    });

    let allocated = sale
        .products
        .values()
        .map(|p| u64::from(p.allocated_stock))
        .sum::<u64>();
    let sell_through_rate = if allocated > 0 {
        units_sold as f64 / allocated as f64
    } else {
        0.0
    };

    Metrics {
        units_sold,
        total_revenue,
        unique_buyers,
        conversion_rate,
        average_order_value,
        sell_through_rate,
        peak_windows: peak_windows(purchases, bucket),
    }
}

/// Buckets the provided [`Purchase`]s into fixed-width [`PeakWindow`]s,
/// busiest first.
#[must_use]
pub fn peak_windows(
    purchases: &[Purchase],
    bucket: Duration,
) -> Vec<PeakWindow> {
    #[expect(clippy::cast_possible_wrap, reason = "sane bucket widths")]
    let width = bucket.as_secs().max(1) as i64;

    purchases
        .iter()
        .counts_by(|p| p.at.unix_timestamp().div_euclid(width))
        .into_iter()
        .map(|(slot, count)| PeakWindow {
            starts_at: DateTime::from_unix_timestamp(slot * width)
                .unwrap_or(DateTime::UNIX_EPOCH),
            count: count as u64,
        })
        .sorted_by_key(|w| (std::cmp::Reverse(w.count), w.starts_at))
        .collect()
}

/// Groups the provided [`Purchase`]s into per-UTC-day revenue, oldest day
/// first.
///
/// Days mixing currencies are dropped.
#[must_use]
pub fn revenue_by_day(purchases: &[Purchase]) -> Vec<DayRevenue> {
    purchases
        .iter()
        .map(|p| (p.at.date(), p.total_price))
        .into_group_map()
        .into_iter()
        .filter_map(|(date, prices)| {
            sum(prices.into_iter())
                .map(|revenue| DayRevenue { date, revenue })
        })
        .sorted_by_key(|d| d.date)
        .collect()
}

/// Sums the provided [`Money`] amounts.
///
/// [`None`] is returned for an empty iterator or mixed currencies.
fn sum(mut amounts: impl Iterator<Item = Money>) -> Option<Money> {
    let first = amounts.next()?;
    amounts.try_fold(first, Money::checked_add)
}

/// Estimated price elasticity of demand of a single [`Product`].
#[derive(Clone, Copy, Debug)]
pub struct Elasticity {
    /// Base price the estimate compares against.
    pub base_price: Money,

    /// Average unit price of the discounted sales, if any were made.
    pub average_sale_price: Option<Money>,

    /// Units sold at the base price or above.
    pub units_at_full_price: u64,

    /// Units sold below the base price.
    pub units_at_discount: u64,

    /// Arc elasticity coefficient.
    ///
    /// [`None`] when the data is insufficient to compute one.
    pub coefficient: Option<f64>,

    /// Suggested price point given the estimate.
    pub optimal_price_point: Money,
}

/// Estimation strategy of price [`Elasticity`].
pub trait Estimator {
    /// Estimates the price [`Elasticity`] of the provided [`Product`] from
    /// its [`Purchase`] history.
    fn estimate(&self, product: &Product, purchases: &[Purchase])
        -> Elasticity;
}

/// [`Estimator`] using the arc (midpoint) elasticity formula between the
/// full-price and the discounted sales of a [`Product`].
#[derive(Clone, Copy, Debug, Default)]
pub struct ArcEstimator;

impl Estimator for ArcEstimator {
    #[expect(
        clippy::cast_precision_loss,
        reason = "counters fit `f64` comfortably"
    )]
    fn estimate(
        &self,
        product: &Product,
        purchases: &[Purchase],
    ) -> Elasticity {
        let mut units_at_full_price = 0_u64;
        let mut units_at_discount = 0_u64;
        let mut discounted_value = Decimal::ZERO;
        for p in purchases {
            // Prices in a foreign currency are not comparable to the base
            // price, so they count as full-price sales.
            if p.unit_price.partial_cmp(&product.base_price)
                == Some(std::cmp::Ordering::Less)
            {
                units_at_discount += u64::from(p.quantity);
                discounted_value +=
                    p.unit_price.amount * Decimal::from(p.quantity);
            } else {
                units_at_full_price += u64::from(p.quantity);
            }
        }

        let average_sale_price = (units_at_discount > 0).then(|| Money {
            amount: discounted_value / Decimal::from(units_at_discount),
            currency: product.base_price.currency,
        });

        let coefficient = average_sale_price.and_then(|avg| {
            let q1 = units_at_full_price as f64;
            let q2 = units_at_discount as f64;
            let p1 = product.base_price.amount.to_f64()?;
            let p2 = avg.amount.to_f64()?;

            let quantity_change = (q2 - q1) / ((q2 + q1) / 2.0);
            let price_change = (p2 - p1) / ((p2 + p1) / 2.0);
            (price_change != 0.0 && price_change.is_finite())
                .then(|| quantity_change / price_change)
                .filter(|e| e.is_finite())
        });

        // Elastic demand rewards the discounted price, inelastic demand
        // leaves the base price in place.
        let optimal_price_point = match (coefficient, average_sale_price) {
            (Some(e), Some(avg)) if e.abs() > 1.0 => avg,
            _ => product.base_price,
        };

        Elasticity {
            base_price: product.base_price,
            average_sale_price,
            units_at_full_price,
            units_at_discount,
            coefficient,
            optimal_price_point,
        }
    }
}

#[cfg(test)]
mod spec {
    use std::{collections::HashMap, str::FromStr as _};

    use crate::domain::{
        flash_sale, product, purchase, stock, user, FlashSale,
    };

    use super::*;

    fn usd(s: &str) -> Money {
        Money::from_str(&format!("{s}USD")).unwrap()
    }

    #[expect(unsafe_code, reason = "bypass")]
    fn sale(visitors: u64, allocated: stock::Quantity) -> FlashSale {
        FlashSale {
            id: flash_sale::Id::new(),
            // SAFETY: Valid constant.
            name: unsafe { flash_sale::Name::new_unchecked("Drop") },
            description: None,
            starts_at: DateTime::now().coerce(),
            ends_at: DateTime::now().coerce(),
            visitors,
            force_ended_at: None,
            products: HashMap::from([(
                product::Id::default(),
                flash_sale::Product {
                    product_id: product::Id::default(),
                    flash_price: usd("8"),
                    original_price: usd("10"),
                    discount: common::Percent::ZERO,
                    allocated_stock: allocated,
                    per_user_limit: allocated,
                },
            )]),
        }
    }

    #[expect(unsafe_code, reason = "bypass")]
    fn widget() -> Product {
        Product {
            id: product::Id::new(),
            // SAFETY: Valid constant.
            name: unsafe { product::Name::new_unchecked("Widget") },
            // SAFETY: Valid constant.
            category: unsafe {
                product::Category::new_unchecked("gadgets")
            },
            base_price: usd("10"),
            current_price: usd("10"),
            min_price: usd("5"),
            cost_price: usd("4"),
            created_at: DateTime::now().coerce(),
        }
    }

    fn bought(
        user_id: user::Id,
        quantity: stock::Quantity,
        unit_price: Money,
        at: DateTime,
    ) -> Purchase {
        Purchase {
            id: purchase::Id::new(),
            attempt_id: purchase::attempt::Id::new(),
            user_id,
            flash_sale_id: flash_sale::Id::default(),
            product_id: product::Id::default(),
            quantity,
            unit_price,
            total_price: unit_price * quantity,
            savings: usd("0"),
            at: at.coerce(),
        }
    }

    #[test]
    fn aggregates_revenue_buyers_and_sell_through() {
        let buyer = user::Id::new();
        let now = DateTime::now();
        let purchases = [
            bought(buyer, 2, usd("8"), now),
            bought(buyer, 1, usd("8"), now),
            bought(user::Id::new(), 1, usd("8"), now),
        ];

        let m = metrics(
            &sale(10, 8),
            &purchases,
            &[],
            Duration::from_secs(300),
        );

        assert_eq!(m.units_sold, 4);
        assert_eq!(m.total_revenue, Some(usd("32")));
        assert_eq!(m.unique_buyers, 2);
        assert!((m.conversion_rate - 0.2).abs() < 1e-9);
        assert_eq!(m.sell_through_rate, 0.5);
    }

    #[test]
    fn conversion_falls_back_to_attempting_users() {
        let buyer = user::Id::new();
        let purchases = [bought(buyer, 1, usd("8"), DateTime::now())];
        let attempts = [
            attempt::Record {
                id: attempt::Id::new(),
                user_id: buyer,
                flash_sale_id: flash_sale::Id::default(),
                product_id: product::Id::default(),
                status: attempt::Status::Pending,
            },
            attempt::Record {
                id: attempt::Id::new(),
                user_id: user::Id::new(),
                flash_sale_id: flash_sale::Id::default(),
                product_id: product::Id::default(),
                status: attempt::Status::Pending,
            },
        ];

        let m = metrics(
            &sale(0, 8),
            &purchases,
            &attempts,
            Duration::from_secs(300),
        );

        assert!((m.conversion_rate - 0.5).abs() < 1e-9);
    }

    #[test]
    fn empty_sale_yields_zeroes() {
        let m = metrics(&sale(0, 0), &[], &[], Duration::from_secs(300));

        assert_eq!(m.units_sold, 0);
        assert_eq!(m.total_revenue, None);
        assert_eq!(m.average_order_value, None);
        assert_eq!(m.conversion_rate, 0.0);
        assert_eq!(m.sell_through_rate, 0.0);
        assert!(m.peak_windows.is_empty());
    }

    #[test]
    fn peak_windows_come_busiest_first() {
        let base = DateTime::from_unix_timestamp(1_700_000_000).unwrap();
        let purchases = [
            bought(user::Id::new(), 1, usd("8"), base),
            bought(
                user::Id::new(),
                1,
                usd("8"),
                base + Duration::from_secs(10),
            ),
            bought(
                user::Id::new(),
                1,
                usd("8"),
                base + Duration::from_secs(600),
            ),
        ];

        let windows = peak_windows(&purchases, Duration::from_secs(300));

        assert_eq!(windows.len(), 2);
        assert_eq!(windows[0].count, 2);
        assert_eq!(windows[1].count, 1);
    }

    #[test]
    fn groups_revenue_by_utc_day() {
        let day1 = DateTime::from_unix_timestamp(1_700_000_000).unwrap();
        let day2 = day1 + Duration::from_secs(86_400);
        let purchases = [
            bought(user::Id::new(), 1, usd("10"), day1),
            bought(user::Id::new(), 2, usd("10"), day2),
            bought(user::Id::new(), 1, usd("5"), day2),
        ];

        let days = revenue_by_day(&purchases);

        assert_eq!(days.len(), 2);
        assert_eq!(days[0].revenue, usd("10"));
        assert_eq!(days[1].revenue, usd("25"));
        assert!(days[0].date < days[1].date);
    }

    #[test]
    fn arc_estimator_splits_full_price_and_discounted_units() {
        let product = widget();
        let purchases = [
            bought(user::Id::new(), 10, usd("10"), DateTime::now()),
            bought(user::Id::new(), 30, usd("8"), DateTime::now()),
        ];

        let e = ArcEstimator.estimate(&product, &purchases);

        assert_eq!(e.units_at_full_price, 10);
        assert_eq!(e.units_at_discount, 30);
        assert_eq!(e.average_sale_price, Some(usd("8")));
        // (30-10)/20 = 1.0 quantity change, (8-10)/9 price change.
        let coefficient = e.coefficient.unwrap();
        assert!((coefficient - (1.0 / (-2.0 / 9.0))).abs() < 1e-9);
        // Elastic demand suggests the discounted price.
        assert_eq!(e.optimal_price_point, usd("8"));
    }

    #[test]
    fn arc_estimator_without_discounted_sales_keeps_base_price() {
        let product = widget();
        let purchases =
            [bought(user::Id::new(), 3, usd("10"), DateTime::now())];

        let e = ArcEstimator.estimate(&product, &purchases);

        assert_eq!(e.units_at_discount, 0);
        assert_eq!(e.average_sale_price, None);
        assert_eq!(e.coefficient, None);
        assert_eq!(e.optimal_price_point, usd("10"));
    }
}
