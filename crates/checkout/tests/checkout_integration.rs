//! Integration tests for order placement against the in-memory store.

use std::sync::Arc;
use std::time::Duration;

use checkout::{
    AccountService, CheckoutError, CheckoutRequest, CheckoutService, Identity, Session,
    StockPolicy,
};
use domain::{
    Cart, CartItem, Category, Money, PaymentMethod, Product, ProductId, ShippingDetails, UserId,
    ValidationError, seed_catalogue,
};
use store::{DocumentStore, InMemoryDocumentStore};

fn shipping() -> ShippingDetails {
    ShippingDetails {
        first_name: "Priya".to_string(),
        last_name: "Sharma".to_string(),
        email: "priya@example.in".to_string(),
        address: "18 Hauz Khas Village".to_string(),
        city: "New Delhi".to_string(),
        state: "DL".to_string(),
        zip: "110016".to_string(),
        phone: "9811122233".to_string(),
        payment_method: PaymentMethod::CashOnDelivery,
    }
}

fn signed_in(uid: &str) -> Session {
    Session::Authenticated(Identity::new(uid, format!("{uid}@example.in"), true))
}

async fn setup(policy: StockPolicy) -> (CheckoutService, Arc<InMemoryDocumentStore>) {
    let store = Arc::new(InMemoryDocumentStore::with_products(seed_catalogue()).await);
    let service = CheckoutService::new(store.clone()).with_stock_policy(policy);
    (service, store)
}

async fn cart_with(store: &InMemoryDocumentStore, lines: &[(&str, u32)]) -> Cart {
    let mut cart = Cart::new();
    for (id, quantity) in lines {
        let product = store.get_product(&ProductId::new(*id)).await.unwrap().unwrap();
        for _ in 0..*quantity {
            cart.add(&product).unwrap();
        }
    }
    cart
}

fn p(id: &str) -> ProductId {
    ProductId::new(id)
}

#[tokio::test]
async fn test_successful_checkout_writes_snapshot_and_debits_stock() {
    let (service, store) = setup(StockPolicy::Conditional).await;
    let cart = cart_with(&store, &[("p1", 1)]).await;
    let request = CheckoutRequest::from_cart(&cart, shipping());
    assert_eq!(request.total, Money::from_rupees(472_500));

    let order_id = service
        .place_order(&signed_in("uid-priya"), request.clone())
        .await
        .unwrap();

    let order = store.get_order(&order_id).await.unwrap().unwrap();
    assert_eq!(order.total, request.total);
    assert_eq!(order.items.len(), 1);
    assert_eq!(order.items[0].product_id, p("p1"));
    assert_eq!(order.items[0].price, request.items[0].price);
    assert_eq!(order.items[0].quantity, 1);
    assert_eq!(order.user_id, UserId::new("uid-priya"));
    assert_eq!(store.stock_of(&p("p1")).await, Some(4));
    assert_eq!(store.order_count().await, 1);
}

#[tokio::test]
async fn test_submitted_total_is_stored_even_when_it_differs() {
    let (service, store) = setup(StockPolicy::Conditional).await;
    let cart = cart_with(&store, &[("p2", 2)]).await;
    let mut request = CheckoutRequest::from_cart(&cart, shipping());
    request.total = Money::from_rupees(1);

    let order_id = service
        .place_order(&signed_in("uid-priya"), request)
        .await
        .unwrap();

    let order = store.get_order(&order_id).await.unwrap().unwrap();
    assert_eq!(order.total, Money::from_rupees(1));
    assert_eq!(store.stock_of(&p("p2")).await, Some(10));
}

#[tokio::test]
async fn test_guest_checkout_requires_sign_in() {
    let (service, store) = setup(StockPolicy::Conditional).await;
    let cart = cart_with(&store, &[("p1", 2)]).await;

    for session in [
        Session::Guest,
        Session::Authenticated(Identity::new(UserId::GUEST, "", false)),
    ] {
        let result = service
            .place_order(&session, CheckoutRequest::from_cart(&cart, shipping()))
            .await;
        assert_eq!(result, Err(CheckoutError::AuthRequired));
    }

    assert_eq!(cart.unit_count(), 2);
    assert_eq!(store.order_count().await, 0);
    assert_eq!(store.commit_count().await, 0);
    assert_eq!(store.stock_of(&p("p1")).await, Some(5));
    assert!(store.list_orders().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_invalid_submissions_write_nothing() {
    let (service, store) = setup(StockPolicy::Conditional).await;
    let session = signed_in("uid-priya");

    let empty = service
        .place_order(&session, CheckoutRequest::from_cart(&Cart::new(), shipping()))
        .await;
    assert_eq!(empty, Err(CheckoutError::Validation(ValidationError::EmptyCart)));

    let cart = cart_with(&store, &[("p1", 1)]).await;
    let mut details = shipping();
    details.city = "   ".to_string();
    let blank_city = service
        .place_order(&session, CheckoutRequest::from_cart(&cart, details))
        .await;
    assert_eq!(
        blank_city,
        Err(CheckoutError::Validation(ValidationError::MissingField { field: "city" }))
    );

    let mut request = CheckoutRequest::from_cart(&cart, shipping());
    request.items[0].quantity = 0;
    let zero = service.place_order(&session, request).await;
    assert!(matches!(
        zero,
        Err(CheckoutError::Validation(ValidationError::InvalidQuantity { .. }))
    ));

    assert_eq!(store.commit_count().await, 0);
    assert_eq!(store.stock_of(&p("p1")).await, Some(5));
}

#[tokio::test]
async fn test_overflowing_amounts_are_rejected_before_commit() {
    let (service, store) = setup(StockPolicy::Conditional).await;
    let forged = Product::new("p1", "Forged", Money::from_minor(i64::MAX / 2), Category::Rings, 5);
    let request = CheckoutRequest {
        items: vec![CartItem::from_product(&forged, 3)],
        total: Money::from_rupees(1),
        shipping: shipping(),
    };

    let result = service.place_order(&signed_in("uid-priya"), request).await;

    assert!(matches!(
        result,
        Err(CheckoutError::Validation(ValidationError::InvalidField { field: "price", .. }))
    ));
    assert_eq!(store.order_count().await, 0);
    assert_eq!(store.stock_of(&p("p1")).await, Some(5));
}

#[tokio::test]
async fn test_failed_batch_leaves_no_order_and_no_stock_change() {
    let (service, store) = setup(StockPolicy::Conditional).await;
    let session = signed_in("uid-priya");
    let cart = cart_with(&store, &[("p1", 1), ("p2", 3)]).await;

    store.fail_next_commit().await;
    let failed = service
        .place_order(&session, CheckoutRequest::from_cart(&cart, shipping()))
        .await;
    assert!(matches!(failed, Err(CheckoutError::Transient(_))));

    store.deny_next_commit("Missing or insufficient permissions.").await;
    let denied = service
        .place_order(&session, CheckoutRequest::from_cart(&cart, shipping()))
        .await;
    assert_eq!(
        denied,
        Err(CheckoutError::PermissionDenied(
            "Missing or insufficient permissions.".to_string()
        ))
    );

    assert_eq!(store.order_count().await, 0);
    assert_eq!(store.stock_of(&p("p1")).await, Some(5));
    assert_eq!(store.stock_of(&p("p2")).await, Some(12));
}

#[tokio::test]
async fn test_oversell_is_rejected_atomically() {
    let (service, store) = setup(StockPolicy::Conditional).await;
    let p2 = store.get_product(&p("p2")).await.unwrap().unwrap();
    let p3 = store.get_product(&p("p3")).await.unwrap().unwrap();
    let request = CheckoutRequest {
        items: vec![CartItem::from_product(&p2, 1), CartItem::from_product(&p3, 3)],
        total: Money::from_rupees(700_000),
        shipping: shipping(),
    };

    let result = service.place_order(&signed_in("uid-priya"), request).await;

    assert_eq!(
        result,
        Err(CheckoutError::StockUnavailable {
            product_id: p("p3"),
            requested: 3,
            available: 2,
        })
    );
    assert_eq!(store.stock_of(&p("p2")).await, Some(12));
    assert_eq!(store.stock_of(&p("p3")).await, Some(2));
    assert_eq!(store.order_count().await, 0);
}

#[tokio::test]
async fn test_removed_product_is_reported() {
    let (service, store) = setup(StockPolicy::Conditional).await;
    let cart = cart_with(&store, &[("p2", 1)]).await;
    store.remove_product(&p("p2")).await.unwrap();

    let result = service
        .place_order(&signed_in("uid-priya"), CheckoutRequest::from_cart(&cart, shipping()))
        .await;

    assert_eq!(result, Err(CheckoutError::ProductNotFound(p("p2"))));
}

#[tokio::test]
async fn test_identical_sequential_submissions_create_two_orders() {
    let (service, store) = setup(StockPolicy::Conditional).await;
    let session = signed_in("uid-priya");
    let cart = cart_with(&store, &[("p2", 2)]).await;
    let request = CheckoutRequest::from_cart(&cart, shipping());

    let first = service.place_order(&session, request.clone()).await.unwrap();
    let second = service.place_order(&session, request).await.unwrap();

    assert_ne!(first, second);
    assert_eq!(store.order_count().await, 2);
    assert_eq!(store.stock_of(&p("p2")).await, Some(8));
}

#[tokio::test]
async fn test_second_submission_while_in_flight_is_rejected() {
    let (service, store) = setup(StockPolicy::Conditional).await;
    store.set_commit_delay(Some(Duration::from_millis(50))).await;
    let session = signed_in("uid-priya");
    let cart = cart_with(&store, &[("p2", 1)]).await;
    let request = CheckoutRequest::from_cart(&cart, shipping());

    let (first, second) = tokio::join!(
        service.place_order(&session, request.clone()),
        service.place_order(&session, request.clone()),
    );

    assert!(first.is_ok());
    assert_eq!(second, Err(CheckoutError::CheckoutInProgress));
    assert_eq!(store.order_count().await, 1);

    // The guard is released once the first checkout settles.
    store.set_commit_delay(None).await;
    assert!(service.place_order(&session, request).await.is_ok());
}

#[tokio::test]
async fn test_guard_is_released_after_failure() {
    let (service, store) = setup(StockPolicy::Conditional).await;
    let session = signed_in("uid-priya");
    let cart = cart_with(&store, &[("p2", 1)]).await;
    let request = CheckoutRequest::from_cart(&cart, shipping());

    store.fail_next_commit().await;
    assert!(service.place_order(&session, request.clone()).await.is_err());
    assert!(service.place_order(&session, request).await.is_ok());
}

#[tokio::test]
async fn test_unchecked_policy_lets_concurrent_checkouts_oversell() {
    let (service, store) = setup(StockPolicy::Unchecked).await;
    let mut last = store.get_product(&p("p1")).await.unwrap().unwrap();
    last.stock = 1;
    store.upsert_product(last.clone()).await.unwrap();
    let request = CheckoutRequest {
        items: vec![CartItem::from_product(&last, 1)],
        total: Money::from_rupees(472_500),
        shipping: shipping(),
    };

    let (shopper_a, shopper_b) = (signed_in("uid-a"), signed_in("uid-b"));
    let (a, b) = tokio::join!(
        service.place_order(&shopper_a, request.clone()),
        service.place_order(&shopper_b, request.clone()),
    );

    assert!(a.is_ok());
    assert!(b.is_ok());
    assert_eq!(store.stock_of(&p("p1")).await, Some(-1));
    assert_eq!(store.order_count().await, 2);
}

#[tokio::test]
async fn test_conditional_policy_sells_last_unit_once() {
    let (service, store) = setup(StockPolicy::Conditional).await;
    let mut last = store.get_product(&p("p1")).await.unwrap().unwrap();
    last.stock = 1;
    store.upsert_product(last.clone()).await.unwrap();
    let request = CheckoutRequest {
        items: vec![CartItem::from_product(&last, 1)],
        total: Money::from_rupees(472_500),
        shipping: shipping(),
    };

    let (shopper_a, shopper_b) = (signed_in("uid-a"), signed_in("uid-b"));
    let (a, b) = tokio::join!(
        service.place_order(&shopper_a, request.clone()),
        service.place_order(&shopper_b, request.clone()),
    );

    let results = [a, b];
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results.iter().any(|r| *r
        == Err(CheckoutError::StockUnavailable {
            product_id: p("p1"),
            requested: 1,
            available: 0,
        })));
    assert_eq!(store.stock_of(&p("p1")).await, Some(0));
    assert_eq!(store.order_count().await, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_many_concurrent_shoppers_never_oversell() {
    let (service, store) = setup(StockPolicy::Conditional).await;
    let p3 = store.get_product(&p("p3")).await.unwrap().unwrap();
    let request = CheckoutRequest {
        items: vec![CartItem::from_product(&p3, 1)],
        total: Money::from_rupees(131_250),
        shipping: shipping(),
    };

    let handles: Vec<_> = (0..10)
        .map(|i| {
            let service = service.clone();
            let request = request.clone();
            tokio::spawn(async move {
                service
                    .place_order(&signed_in(&format!("uid-{i}")), request)
                    .await
            })
        })
        .collect();

    let results = futures_util::future::join_all(handles).await;
    let placed = results
        .into_iter()
        .map(|r| r.unwrap())
        .filter(|r| r.is_ok())
        .count();

    assert_eq!(placed, 2);
    assert_eq!(store.stock_of(&p("p3")).await, Some(0));
    assert_eq!(store.order_count().await, 2);
}

#[tokio::test]
async fn test_checkout_saves_address_and_phone() {
    let (service, store) = setup(StockPolicy::Conditional).await;
    let accounts = AccountService::new(store.clone());
    let identity = Identity::new("uid-priya", "priya@example.in", true);
    accounts.ensure_profile(&identity).await.unwrap();
    let session = Session::Authenticated(identity);
    let cart = cart_with(&store, &[("p2", 1)]).await;

    service
        .place_order(&session, CheckoutRequest::from_cart(&cart, shipping()))
        .await
        .unwrap();
    service
        .place_order(&session, CheckoutRequest::from_cart(&cart, shipping()))
        .await
        .unwrap();

    let profile = store.get_profile(&UserId::new("uid-priya")).await.unwrap().unwrap();
    assert_eq!(profile.addresses.len(), 1);
    assert!(profile.addresses[0].is_default);
    assert_eq!(profile.addresses[0].street, "18 Hauz Khas Village");
    assert_eq!(profile.phone, "9811122233");
}

#[tokio::test]
async fn test_enrichment_failure_keeps_the_order() {
    let (service, store) = setup(StockPolicy::Conditional).await;
    let accounts = AccountService::new(store.clone());
    let identity = Identity::new("uid-priya", "priya@example.in", true);
    accounts.ensure_profile(&identity).await.unwrap();
    store.set_fail_profile_writes(true).await;
    let cart = cart_with(&store, &[("p2", 1)]).await;

    let order_id = service
        .place_order(
            &Session::Authenticated(identity),
            CheckoutRequest::from_cart(&cart, shipping()),
        )
        .await
        .unwrap();

    assert!(store.get_order(&order_id).await.unwrap().is_some());
    let profile = store.get_profile(&UserId::new("uid-priya")).await.unwrap().unwrap();
    assert!(profile.addresses.is_empty());
    assert_eq!(store.stock_of(&p("p2")).await, Some(11));
}
