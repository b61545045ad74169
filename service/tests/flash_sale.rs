//! End-to-end tests of the flash-sale purchase pipeline against the
//! in-memory database.

use std::{
    collections::HashMap, future::IntoFuture as _, str::FromStr as _,
    time::Duration,
};

use common::{
    operations::{By, Insert, Select},
    DateTime, Money, Percent,
};
use service::{
    command::{
        purchase_in_flash_sale::ExecutionError as PurchaseError,
        create_flash_sale::ProductOffer, Command as _, CreateFlashSale,
        CreatePricingRule, CreateProduct, EndFlashSale,
        PurchaseInFlashSale, SubmitPurchase,
    },
    domain::{
        flash_sale, pricing_rule, product, purchase::attempt, stock, user,
        FlashSale, Product,
    },
    infra::database::InMemory,
    query::{purchase::AttemptStatus, ResolvePrice},
    read::pricing::Source,
    task::Background,
    Config, Service,
};

const HOUR: Duration = Duration::from_secs(3600);

fn usd(s: &str) -> Money {
    Money::from_str(&format!("{s}USD")).unwrap()
}

fn setup() -> (Service<InMemory>, Background) {
    Service::new(Config::default(), InMemory::default())
}

async fn create_product(svc: &Service<InMemory>) -> Product {
    svc.execute(CreateProduct {
        name: product::Name::new("Widget").unwrap(),
        category: product::Category::new("gadgets").unwrap(),
        base_price: usd("100"),
        min_price: usd("50"),
        cost_price: usd("30"),
    })
    .await
    .unwrap()
}

async fn create_active_sale(
    svc: &Service<InMemory>,
    product_id: product::Id,
    allocated: stock::Quantity,
    per_user_limit: stock::Quantity,
) -> FlashSale {
    svc.execute(CreateFlashSale {
        name: flash_sale::Name::new("Drop").unwrap(),
        description: None,
        starts_at: (DateTime::now() - HOUR).coerce(),
        ends_at: (DateTime::now() + HOUR).coerce(),
        products: vec![ProductOffer {
            product_id,
            flash_price: usd("80"),
            allocated_stock: allocated,
            per_user_limit,
        }],
    })
    .await
    .unwrap()
}

fn purchase_cmd(
    sale: &FlashSale,
    product_id: product::Id,
    user_id: user::Id,
    quantity: stock::Quantity,
) -> PurchaseInFlashSale {
    PurchaseInFlashSale {
        attempt_id: attempt::Id::new(),
        user_id,
        user_tier: None,
        flash_sale_id: sale.id,
        product_id,
        quantity,
        stated_price: usd("80"),
    }
}

async fn stock_levels(
    svc: &Service<InMemory>,
    sale: &FlashSale,
    product_id: product::Id,
) -> stock::Levels {
    svc.database()
        .execute(Select(By::<Option<stock::Levels>, _>::new(
            sale.stock_key(product_id),
        )))
        .await
        .unwrap()
        .unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_purchases_never_oversell() {
    let (svc, _bg) = setup();
    let product = create_product(&svc).await;
    let sale = create_active_sale(&svc, product.id, 5, 2).await;

    let mut handles = Vec::new();
    for _ in 0..5 {
        let svc = svc.clone();
        let cmd = purchase_cmd(&sale, product.id, user::Id::new(), 2);
        handles.push(tokio::spawn(async move { svc.execute(cmd).await }));
    }
    let mut committed = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            committed += 1;
        }
    }

    // 5 allocated units cannot satisfy a third two-unit purchase.
    assert_eq!(committed, 2);
    let levels = stock_levels(&svc, &sale, product.id).await;
    assert_eq!(levels.remaining, 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_attempts_never_breach_the_per_user_limit() {
    let (svc, _bg) = setup();
    let product = create_product(&svc).await;
    let sale = create_active_sale(&svc, product.id, 10, 2).await;
    let user_id = user::Id::new();

    let mut handles = Vec::new();
    for _ in 0..5 {
        let svc = svc.clone();
        let cmd = purchase_cmd(&sale, product.id, user_id, 1);
        handles.push(tokio::spawn(async move { svc.execute(cmd).await }));
    }
    let mut committed = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => committed += 1,
            Err(e) => {
                assert!(matches!(
                    e.as_ref(),
                    PurchaseError::LimitExceeded { .. },
                ));
            }
        }
    }

    // One user racing against themselves still tops out at the limit.
    assert_eq!(committed, 2);
    let levels = stock_levels(&svc, &sale, product.id).await;
    assert_eq!(levels.remaining, 8);
}

#[tokio::test]
async fn repeated_attempt_returns_original_receipt() {
    let (svc, _bg) = setup();
    let product = create_product(&svc).await;
    let sale = create_active_sale(&svc, product.id, 10, 10).await;
    let cmd = purchase_cmd(&sale, product.id, user::Id::new(), 2);

    let first = svc.execute(cmd).await.unwrap();
    let second = svc.execute(cmd).await.unwrap();

    assert_eq!(first.purchase_id, second.purchase_id);
    let levels = stock_levels(&svc, &sale, product.id).await;
    assert_eq!(levels.remaining, 8);
}

#[tokio::test]
async fn price_mismatch_rejects_without_reserving() {
    let (svc, _bg) = setup();
    let product = create_product(&svc).await;
    let sale = create_active_sale(&svc, product.id, 10, 10).await;
    let mut cmd = purchase_cmd(&sale, product.id, user::Id::new(), 1);
    cmd.stated_price = usd("99");

    let err = svc.execute(cmd).await.unwrap_err();

    assert!(matches!(
        err.as_ref(),
        PurchaseError::PriceMismatch { .. },
    ));
    let levels = stock_levels(&svc, &sale, product.id).await;
    assert_eq!(levels.remaining, 10);

    // The failure lands on the attempt record too.
    let record = svc
        .execute(AttemptStatus::by(cmd.attempt_id))
        .await
        .unwrap()
        .unwrap();
    assert!(matches!(
        record.status,
        attempt::Status::Failed(attempt::Failure::PriceMismatch),
    ));
}

#[tokio::test]
async fn purchase_charges_flash_price_and_computes_savings() {
    let (svc, _bg) = setup();
    let product = create_product(&svc).await;
    let sale = create_active_sale(&svc, product.id, 10, 10).await;

    let receipt = svc
        .execute(purchase_cmd(&sale, product.id, user::Id::new(), 2))
        .await
        .unwrap();

    assert_eq!(receipt.unit_price, usd("80"));
    assert_eq!(receipt.total_price, usd("160"));
    assert_eq!(receipt.savings, usd("40"));
}

#[tokio::test]
async fn scheduled_sale_rejects_purchases() {
    let (svc, _bg) = setup();
    let product = create_product(&svc).await;
    let sale = svc
        .execute(CreateFlashSale {
            name: flash_sale::Name::new("Soon").unwrap(),
            description: None,
            starts_at: (DateTime::now() + HOUR).coerce(),
            ends_at: (DateTime::now() + HOUR + HOUR).coerce(),
            products: vec![ProductOffer {
                product_id: product.id,
                flash_price: usd("80"),
                allocated_stock: 10,
                per_user_limit: 10,
            }],
        })
        .await
        .unwrap();

    let err = svc
        .execute(purchase_cmd(&sale, product.id, user::Id::new(), 1))
        .await
        .unwrap_err();

    assert!(matches!(
        err.as_ref(),
        PurchaseError::SaleNotActive(flash_sale::State::Scheduled),
    ));
}

#[tokio::test]
async fn flash_price_wins_resolution_until_sale_ends() {
    let (svc, _bg) = setup();
    let product = create_product(&svc).await;
    let sale = create_active_sale(&svc, product.id, 10, 10).await;
    let context = pricing_rule::Context {
        quantity: 1,
        user_tier: None,
        at: DateTime::now(),
    };

    let resolved = svc
        .execute(ResolvePrice {
            product_id: product.id,
            flash_sale_id: None,
            context,
        })
        .await
        .unwrap();
    assert_eq!(resolved.source, Source::FlashSale(sale.id));
    assert_eq!(resolved.unit_price, usd("80"));

    // Ending the sale takes effect on the very next resolution.
    let _ = svc.execute(EndFlashSale { id: sale.id }).await.unwrap();
    let resolved = svc
        .execute(ResolvePrice {
            product_id: product.id,
            flash_sale_id: None,
            context,
        })
        .await
        .unwrap();
    assert_eq!(resolved.source, Source::BasePrice);
    assert_eq!(resolved.unit_price, usd("100"));

    // Ending is terminal: no purchase goes through afterwards.
    let err = svc
        .execute(purchase_cmd(&sale, product.id, user::Id::new(), 1))
        .await
        .unwrap_err();
    assert!(matches!(
        err.as_ref(),
        PurchaseError::SaleNotActive(flash_sale::State::Ended),
    ));
}

#[tokio::test]
async fn sale_activation_supersedes_cached_resolution() {
    let (svc, _bg) = setup();
    let product = create_product(&svc).await;
    let context = pricing_rule::Context {
        quantity: 1,
        user_tier: None,
        at: DateTime::now(),
    };

    let resolved = svc
        .execute(ResolvePrice {
            product_id: product.id,
            flash_sale_id: None,
            context,
        })
        .await
        .unwrap();
    assert_eq!(resolved.source, Source::BasePrice);

    // The sale lands in the store without any cache bookkeeping, the same
    // way a scheduled sale silently crosses into its window.
    let sale = FlashSale {
        id: flash_sale::Id::new(),
        name: flash_sale::Name::new("Drop").unwrap(),
        description: None,
        starts_at: (DateTime::now() - HOUR).coerce(),
        ends_at: (DateTime::now() + HOUR).coerce(),
        visitors: 0,
        force_ended_at: None,
        products: HashMap::from([(product.id, flash_sale::Product {
            product_id: product.id,
            flash_price: usd("80"),
            original_price: usd("100"),
            discount: Percent::from_str("20").unwrap(),
            allocated_stock: 10,
            per_user_limit: 10,
        })]),
    };
    svc.database().execute(Insert(sale.clone())).await.unwrap();

    // Same context inside the same minute: the flash price must win even
    // though a fresh base-price resolution sits in the cache.
    let resolved = svc
        .execute(ResolvePrice {
            product_id: product.id,
            flash_sale_id: None,
            context,
        })
        .await
        .unwrap();
    assert_eq!(resolved.source, Source::FlashSale(sale.id));
    assert_eq!(resolved.unit_price, usd("80"));
}

#[tokio::test]
async fn purchase_prices_against_its_own_sale() {
    let (svc, _bg) = setup();
    let product = create_product(&svc).await;
    let earlier = svc
        .execute(CreateFlashSale {
            name: flash_sale::Name::new("Early bird").unwrap(),
            description: None,
            starts_at: (DateTime::now() - HOUR - HOUR).coerce(),
            ends_at: (DateTime::now() + HOUR).coerce(),
            products: vec![ProductOffer {
                product_id: product.id,
                flash_price: usd("70"),
                allocated_stock: 10,
                per_user_limit: 10,
            }],
        })
        .await
        .unwrap();
    let later = create_active_sale(&svc, product.id, 10, 10).await;

    // An untargeted resolution prefers the earliest started sale...
    let context = pricing_rule::Context {
        quantity: 1,
        user_tier: None,
        at: DateTime::now(),
    };
    let resolved = svc
        .execute(ResolvePrice {
            product_id: product.id,
            flash_sale_id: None,
            context,
        })
        .await
        .unwrap();
    assert_eq!(resolved.source, Source::FlashSale(earlier.id));
    assert_eq!(resolved.unit_price, usd("70"));

    // ...while a purchase is checked against the flash price of the very
    // sale it's made in.
    let receipt = svc
        .execute(purchase_cmd(&later, product.id, user::Id::new(), 1))
        .await
        .unwrap();
    assert_eq!(receipt.flash_sale_id, later.id);
    assert_eq!(receipt.unit_price, usd("80"));
}

#[tokio::test]
async fn rule_creation_invalidates_cached_prices() {
    let (svc, _bg) = setup();
    let product = create_product(&svc).await;
    let context = pricing_rule::Context {
        quantity: 1,
        user_tier: None,
        at: DateTime::now(),
    };

    let resolved = svc
        .execute(ResolvePrice {
            product_id: product.id,
            flash_sale_id: None,
            context,
        })
        .await
        .unwrap();
    assert_eq!(resolved.unit_price, usd("100"));

    let rule = svc
        .execute(CreatePricingRule {
            name: pricing_rule::Name::new("Ten off").unwrap(),
            product_ids: [product.id].into_iter().collect(),
            categories: Default::default(),
            kind: pricing_rule::Kind::QuantityTier(vec![
                pricing_rule::QuantityTier {
                    min_quantity: 1,
                    max_quantity: None,
                    discount: Percent::from_str("10").unwrap(),
                },
            ]),
            priority: 1,
            status: pricing_rule::Status::Active,
            valid_from: None,
            valid_until: None,
        })
        .await
        .unwrap();

    // Same context inside the same minute: only the synchronous
    // invalidation can explain seeing the new price immediately.
    let resolved = svc
        .execute(ResolvePrice {
            product_id: product.id,
            flash_sale_id: None,
            context,
        })
        .await
        .unwrap();
    assert_eq!(resolved.source, Source::Rule(rule.id));
    assert_eq!(resolved.unit_price, usd("90"));
}

#[tokio::test]
async fn submitted_purchase_is_processed_in_background() {
    let (svc, bg) = setup();
    let product = create_product(&svc).await;
    let sale = create_active_sale(&svc, product.id, 10, 10).await;
    let cmd = purchase_cmd(&sale, product.id, user::Id::new(), 1);

    let attempt_id = svc.execute(SubmitPurchase(cmd)).await.unwrap();
    assert_eq!(attempt_id, cmd.attempt_id);

    // The attempt is on record before the worker has run at all.
    let record = svc
        .execute(AttemptStatus::by(attempt_id))
        .await
        .unwrap()
        .expect("attempt must be queryable right after submission");
    assert!(matches!(record.status, attempt::Status::Submitted));

    let wait = async {
        loop {
            let record = svc
                .execute(AttemptStatus::by(attempt_id))
                .await
                .unwrap()
                .unwrap();
            if let attempt::Status::Committed(receipt) = record.status {
                break receipt;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    };
    let receipt = tokio::select! {
        receipt = tokio::time::timeout(Duration::from_secs(5), wait) => {
            receipt.expect("purchase was not processed in time")
        }
        res = bg.into_future() => {
            panic!("background tasks exited unexpectedly: {res:?}")
        }
    };

    assert_eq!(receipt.attempt_id, attempt_id);
    assert_eq!(receipt.unit_price, usd("80"));
}
