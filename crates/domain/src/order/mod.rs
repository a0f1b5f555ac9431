//! Order records and their fulfilment status.

mod record;
mod status;

pub use record::{NewOrder, Order, OrderLine};
pub use status::OrderStatus;
