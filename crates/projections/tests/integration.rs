//! Projections following the in-memory store's change feeds.

use std::sync::Arc;
use std::time::Duration;

use checkout::{
    AccountService, CheckoutRequest, CheckoutService, Identity, OrderStatusService, Session,
};
use domain::{
    CartItem, Money, Order, OrderStatus, PaymentMethod, ProductId, ShippingDetails, Totals,
    UserProfile, seed_catalogue,
};
use projections::{
    CustomerDirectory, DashboardStats, LiveOrderBoard, Projection, ProjectionProcessor, ReadModel,
};
use store::{DocumentStore, InMemoryDocumentStore};

fn shipping(email: &str) -> ShippingDetails {
    ShippingDetails {
        first_name: "Ira".to_string(),
        last_name: "Menon".to_string(),
        email: email.to_string(),
        address: "12 Marine Drive".to_string(),
        city: "Kochi".to_string(),
        state: "KL".to_string(),
        zip: "682031".to_string(),
        phone: "9847012345".to_string(),
        payment_method: PaymentMethod::CashOnDelivery,
    }
}

async fn place(store: &Arc<InMemoryDocumentStore>, uid: &str, product: &str) -> domain::OrderId {
    let product = store
        .get_product(&ProductId::new(product))
        .await
        .unwrap()
        .unwrap();
    let email = format!("{uid}@mail.in");
    let line = CartItem::from_product(&product, 1);
    let request = CheckoutRequest {
        total: Totals::from_subtotal(product.price).total,
        items: vec![line],
        shipping: shipping(&email),
    };
    let session = Session::Authenticated(Identity::new(uid, &email, true));
    CheckoutService::new(store.clone())
        .place_order(&session, request)
        .await
        .unwrap()
}

/// Polls `check` until it holds or a second passes.
async fn eventually<F, Fut>(mut check: F)
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let waited = tokio::time::timeout(Duration::from_secs(1), async {
        while !check().await {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
    assert!(waited.is_ok(), "projection did not catch up");
}

#[tokio::test]
async fn test_order_board_follows_placements_and_status_changes() {
    let store = Arc::new(InMemoryDocumentStore::with_products(seed_catalogue()).await);
    let board = LiveOrderBoard::new();

    let mut processor = ProjectionProcessor::new();
    processor.register(Box::new(board.clone()) as Box<dyn Projection<Order>>);
    let _follower = processor.spawn(store.subscribe_orders());

    let first = place(&store, "uid-ira", "p2").await;
    tokio::time::sleep(Duration::from_millis(2)).await;
    let second = place(&store, "uid-dev", "p3").await;

    eventually(|| {
        let board = board.clone();
        async move { board.orders().await.len() == 2 }
    })
    .await;
    assert_eq!(board.orders().await[0].id, second);

    OrderStatusService::new(store.clone())
        .set_status(first, OrderStatus::Cancelled)
        .await
        .unwrap();

    eventually(|| {
        let board = board.clone();
        async move {
            board
                .get_order(first)
                .await
                .is_some_and(|o| o.status == OrderStatus::Cancelled)
        }
    })
    .await;

    let stats = DashboardStats::compute(&board.orders().await, 2);
    let p3_total = store.get_order(&second).await.unwrap().unwrap().total;
    assert_eq!(stats.total_revenue, p3_total);
    assert_eq!(stats.total_orders, 2);
    assert_eq!(ReadModel::count(&board), 2);
}

#[tokio::test]
async fn test_directory_follows_sign_ups() {
    let store = Arc::new(InMemoryDocumentStore::new());
    let directory = CustomerDirectory::new();

    let mut processor = ProjectionProcessor::new();
    processor.register(Box::new(directory.clone()) as Box<dyn Projection<UserProfile>>);
    let _follower = processor.spawn(store.subscribe_users());

    let accounts = AccountService::new(store.clone());
    accounts
        .ensure_profile(&Identity::new("uid-1", "ira@mail.in", true))
        .await
        .unwrap();
    accounts
        .ensure_profile(&Identity::new("uid-2", "dev@mail.in", false))
        .await
        .unwrap();

    eventually(|| {
        let directory = directory.clone();
        async move { directory.customers().await.len() == 2 }
    })
    .await;
    assert_eq!(directory.search("ira").await.len(), 1);
}

#[tokio::test]
async fn test_rebuild_from_store_listing() {
    let store = Arc::new(InMemoryDocumentStore::with_products(seed_catalogue()).await);
    place(&store, "uid-ira", "p1").await;

    let board = LiveOrderBoard::new();
    let mut processor = ProjectionProcessor::new();
    processor.register(Box::new(board.clone()) as Box<dyn Projection<Order>>);

    processor
        .rebuild_all(&store.list_orders().await.unwrap())
        .await
        .unwrap();

    let orders = board.orders().await;
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].total, Money::from_rupees(472_500));
}
