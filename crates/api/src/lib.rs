//! HTTP API server for the storefront.
//!
//! Provides REST endpoints for the catalogue, checkout, customer accounts
//! and the admin panel, with structured logging (tracing) and Prometheus
//! metrics.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post, put};
use checkout::{
    AccountService, CatalogueService, CheckoutService, CustomerService, IdentityProvider,
    OrderStatusService,
};
use domain::{Order, UserProfile};
use metrics_exporter_prometheus::PrometheusHandle;
use projections::{CustomerDirectory, LiveOrderBoard, Projection, ProjectionProcessor};
use store::DocumentStore;
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use config::Config;
pub use state::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/products", get(routes::catalogue::list))
        .route("/products/{id}", get(routes::catalogue::get))
        .route("/checkout", post(routes::checkout::place))
        .route("/account/orders", get(routes::account::orders))
        .route(
            "/account/profile",
            get(routes::account::profile).put(routes::account::update_profile),
        )
        .route("/account/addresses", post(routes::account::add_address))
        .route("/account/addresses/{id}", delete(routes::account::remove_address))
        .route(
            "/account/wishlist/{product_id}",
            post(routes::account::toggle_wishlist),
        )
        .route("/admin/orders", get(routes::admin::orders))
        .route("/admin/dashboard", get(routes::admin::dashboard))
        .route("/admin/orders/{id}/status", put(routes::admin::set_status))
        .route("/admin/orders/{id}/tracking", put(routes::admin::set_tracking))
        .route(
            "/admin/products/{id}",
            put(routes::admin::save_product).delete(routes::admin::remove_product),
        )
        .route("/admin/customers", get(routes::admin::customers))
        .route(
            "/admin/customers/{uid}/status",
            put(routes::admin::set_customer_status),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Builds the services over `store` and starts the live projections.
///
/// Must be called inside a Tokio runtime. The returned handles finish
/// when the store's change feeds close.
pub fn create_state(
    store: Arc<dyn DocumentStore>,
    identity: Arc<dyn IdentityProvider>,
    config: &Config,
) -> (Arc<AppState>, Vec<JoinHandle<projections::Result<()>>>) {
    let order_board = LiveOrderBoard::new();
    let directory = CustomerDirectory::new();

    let mut order_processor = ProjectionProcessor::new();
    order_processor.register(Box::new(order_board.clone()) as Box<dyn Projection<Order>>);
    let mut profile_processor = ProjectionProcessor::new();
    profile_processor.register(Box::new(directory.clone()) as Box<dyn Projection<UserProfile>>);

    let followers = vec![
        order_processor.spawn(store.subscribe_orders()),
        profile_processor.spawn(store.subscribe_users()),
    ];

    let state = Arc::new(AppState {
        checkout: CheckoutService::new(store.clone()).with_stock_policy(config.stock_policy),
        statuses: OrderStatusService::new(store.clone())
            .with_transition_policy(config.transition_policy)
            .with_restock_policy(config.restock_policy),
        accounts: AccountService::new(store.clone()).with_admin_emails(&config.admin_emails),
        catalogue: CatalogueService::new(store.clone()),
        customers: CustomerService::new(store.clone()),
        order_board,
        directory,
        identity,
        store,
    });

    (state, followers)
}
