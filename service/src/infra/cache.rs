//! Cache of price [`Resolution`]s.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
    time::{Duration, Instant},
};

use smart_default::SmartDefault;

use crate::{
    domain::{pricing_rule, product, user, PricingRule},
    read::pricing::Resolution,
};

/// Configuration of a [`PriceCache`].
#[derive(Clone, Copy, Debug, SmartDefault)]
pub struct Config {
    /// Time a cached [`Resolution`] stays valid for.
    #[default(Duration::from_secs(30))]
    pub ttl: Duration,

    /// Maximum number of cached [`Resolution`]s.
    #[default = 4096]
    pub capacity: usize,
}

/// Shared cache of price [`Resolution`]s.
///
/// Keys quantize the resolution instant to a minute, so two lookups inside
/// the same minute with the same quantity and tier hit the same slot.
///
/// Only rule-based and base-price [`Resolution`]s are cached: flash offers
/// come and go with the clock, so they are resolved against the live store
/// every time. Expiry alone would still serve stale prices after a rule
/// mutation, which is why every rule-mutating command calls
/// [`PriceCache::invalidate()`] synchronously before acknowledging.
#[derive(Clone, Debug)]
pub struct PriceCache {
    /// Configuration of this [`PriceCache`].
    config: Config,

    /// Cached [`Resolution`]s.
    entries: Arc<Mutex<HashMap<Key, Entry>>>,
}

impl PriceCache {
    /// Creates a new empty [`PriceCache`].
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Looks up a cached [`Resolution`] by the provided [`Key`].
    ///
    /// Expired entries are dropped on the way out.
    #[must_use]
    pub fn get(&self, key: &Key) -> Option<Resolution> {
        let mut entries =
            self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = entries.get(key)?;
        if entry.stored_at.elapsed() >= self.config.ttl {
            _ = entries.remove(key);
            return None;
        }
        Some(entry.resolution)
    }

    /// Caches the provided [`Resolution`] under the provided [`Key`].
    ///
    /// The oldest entry is evicted once the capacity is reached.
    pub fn insert(&self, key: Key, resolution: Resolution) {
        let mut entries =
            self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if entries.len() >= self.config.capacity
            && !entries.contains_key(&key)
        {
            if let Some(oldest) = entries
                .iter()
                .min_by_key(|(_, e)| e.stored_at)
                .map(|(k, _)| *k)
            {
                _ = entries.remove(&oldest);
            }
        }
        _ = entries.insert(key, Entry {
            resolution,
            stored_at: Instant::now(),
        });
    }

    /// Drops every cached [`Resolution`] of the provided [`Product`].
    ///
    /// [`Product`]: crate::domain::Product
    pub fn invalidate(&self, product_id: product::Id) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|k, _| k.product_id != product_id);
    }

    /// Drops every cached [`Resolution`] the provided [`PricingRule`] may
    /// influence.
    ///
    /// A rule scoped to concrete [`Product`]s touches only those; anything
    /// broader (category-wide or global) flushes the whole cache.
    ///
    /// [`Product`]: crate::domain::Product
    pub fn invalidate_rule_scope(&self, rule: &PricingRule) {
        if rule.product_ids.is_empty() {
            self.clear();
        } else {
            for id in &rule.product_ids {
                self.invalidate(*id);
            }
        }
    }

    /// Drops every cached [`Resolution`].
    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

/// Key of a cached [`Resolution`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Key {
    /// ID of the priced [`Product`].
    ///
    /// [`Product`]: crate::domain::Product
    pub product_id: product::Id,

    /// Quantity the price was resolved for.
    pub quantity: u32,

    /// [`user::Tier`] the price was resolved for.
    pub user_tier: Option<user::Tier>,

    /// Resolution instant quantized to a minute.
    pub minute: i64,
}

impl Key {
    /// Builds a [`Key`] out of the provided [`pricing_rule::Context`].
    #[must_use]
    pub fn quantized(
        product_id: product::Id,
        context: &pricing_rule::Context,
    ) -> Self {
        Self {
            product_id,
            quantity: context.quantity,
            user_tier: context.user_tier,
            minute: context.at.unix_timestamp().div_euclid(60),
        }
    }
}

/// Cached [`Resolution`] along with its storing [`Instant`].
#[derive(Clone, Copy, Debug)]
struct Entry {
    /// Cached [`Resolution`] itself.
    resolution: Resolution,

    /// [`Instant`] the [`Resolution`] was cached at.
    stored_at: Instant,
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use common::Money;

    use crate::read::pricing::Source;

    use super::*;

    fn resolution(product_id: product::Id) -> Resolution {
        Resolution {
            product_id,
            unit_price: Money::from_str("10USD").unwrap(),
            source: Source::BasePrice,
            clamped: false,
        }
    }

    fn key(product_id: product::Id, minute: i64) -> Key {
        Key {
            product_id,
            quantity: 1,
            user_tier: None,
            minute,
        }
    }

    #[test]
    fn returns_cached_resolution_within_ttl() {
        let cache = PriceCache::new(Config::default());
        let product_id = product::Id::new();
        let k = key(product_id, 0);

        cache.insert(k, resolution(product_id));

        assert!(cache.get(&k).is_some());
    }

    #[test]
    fn expires_by_ttl() {
        let cache = PriceCache::new(Config {
            ttl: Duration::ZERO,
            ..Config::default()
        });
        let product_id = product::Id::new();
        let k = key(product_id, 0);

        cache.insert(k, resolution(product_id));

        assert!(cache.get(&k).is_none());
    }

    #[test]
    fn invalidates_single_product_only() {
        let cache = PriceCache::new(Config::default());
        let product_a = product::Id::new();
        let product_b = product::Id::new();
        cache.insert(key(product_a, 0), resolution(product_a));
        cache.insert(key(product_a, 1), resolution(product_a));
        cache.insert(key(product_b, 0), resolution(product_b));

        cache.invalidate(product_a);

        assert!(cache.get(&key(product_a, 0)).is_none());
        assert!(cache.get(&key(product_a, 1)).is_none());
        assert!(cache.get(&key(product_b, 0)).is_some());
    }

    #[test]
    fn evicts_oldest_once_full() {
        let cache = PriceCache::new(Config {
            capacity: 2,
            ..Config::default()
        });
        let product_id = product::Id::new();
        cache.insert(key(product_id, 0), resolution(product_id));
        cache.insert(key(product_id, 1), resolution(product_id));
        cache.insert(key(product_id, 2), resolution(product_id));

        let cached = (0..3)
            .filter(|m| cache.get(&key(product_id, *m)).is_some())
            .count();
        assert_eq!(cached, 2);
        assert!(cache.get(&key(product_id, 2)).is_some());
    }
}
