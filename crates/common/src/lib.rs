//! Shared identifier types for the storefront workspace.

mod types;

pub use types::{OrderId, ProductId, UserId};
