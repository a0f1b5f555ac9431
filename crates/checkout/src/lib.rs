//! Storefront services.
//!
//! This crate places orders and manages them afterwards:
//! - Order placement with an atomic order-plus-stock batch
//! - The order status lifecycle with configurable policies
//! - Identity verification and profile provisioning
//! - Customer accounts, catalogue edits and customer standing
//!
//! Every service takes its store as an injected `Arc<dyn DocumentStore>`.

pub mod account;
pub mod admin;
pub mod error;
pub mod identity;
pub mod lifecycle;
pub mod placement;
pub mod policy;

pub use account::{AccountService, AddressForm};
pub use admin::{CatalogueService, CustomerService};
pub use error::{CheckoutError, RESERVATION_RETRY_MESSAGE, ServiceError, StatusError};
pub use identity::{Claims, Identity, IdentityError, IdentityProvider, JwtIdentityProvider, Session};
pub use lifecycle::OrderStatusService;
pub use placement::{CheckoutRequest, CheckoutService};
pub use policy::{RestockPolicy, StockPolicy, TransitionPolicy};
