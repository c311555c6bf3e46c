//! Shopping cart module.
//!
//! Contains the cart aggregate and the cart service.

mod cart;
mod service;

pub use cart::{validate_quantity, Cart, CartLine, MAX_QUANTITY_PER_ITEM};
pub use service::CartService;
