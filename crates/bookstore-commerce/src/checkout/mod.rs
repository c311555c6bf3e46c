//! Checkout module.
//!
//! Contains order types and the service that settles a cart into an order.

mod order;
mod settlement;

pub use order::{NewOrder, NewOrderLine, Order, OrderLine, OrderStatus};
pub use settlement::CartSettlementService;
