//! Shared application state.

use std::sync::Arc;

use checkout::{
    AccountService, CatalogueService, CheckoutService, CustomerService, IdentityProvider,
    OrderStatusService,
};
use projections::{CustomerDirectory, LiveOrderBoard};
use store::DocumentStore;

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub identity: Arc<dyn IdentityProvider>,
    pub checkout: CheckoutService,
    pub statuses: OrderStatusService,
    pub accounts: AccountService,
    pub catalogue: CatalogueService,
    pub customers: CustomerService,
    pub order_board: LiveOrderBoard,
    pub directory: CustomerDirectory,
}
