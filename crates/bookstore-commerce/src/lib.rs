//! Bookstore domain types and services.
//!
//! - **Catalog**: Books and categories
//! - **Cart**: The per-user shopping cart
//! - **Checkout**: Orders and cart settlement
//! - **Search**: Criteria, composable predicates, the provider registry
//! - **Store**: Transactional storage ports with in-memory and SQLite backends
//!
//! # Example
//!
//! ```rust,ignore
//! use bookstore_commerce::prelude::*;
//! use std::sync::Arc;
//!
//! let store = MemoryStore::new();
//! let registry = Arc::new(PredicateRegistry::for_books()?);
//! let catalog = CatalogService::new(store.clone(), registry);
//! let carts = CartService::new(store.clone());
//! let settlement = CartSettlementService::new(store);
//!
//! let dune = catalog
//!     .create_book(NewBook::new("Dune", "Frank Herbert", "978-0441013593", Money::parse("10.00", Currency::USD)?))
//!     .await?;
//! carts.add_book(UserId::new(1), dune.id, 3).await?;
//!
//! let order = settlement.place_order(UserId::new(1), "1 Main St").await?;
//! println!("Total: {}", order.total);
//! ```

pub mod error;
pub mod ids;
pub mod money;

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod search;
pub mod store;
pub mod views;

pub use error::{CommerceError, ErrorKind};
pub use ids::*;
pub use money::{Currency, Money};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::{CommerceError, ErrorKind};
    pub use crate::ids::*;
    pub use crate::money::{Currency, Money};

    // Catalog
    pub use crate::catalog::{Book, BookUpdate, CatalogService, Category, NewBook, NewCategory};

    // Cart
    pub use crate::cart::{Cart, CartLine, CartService};

    // Checkout
    pub use crate::checkout::{CartSettlementService, Order, OrderLine, OrderStatus};

    // Search
    pub use crate::search::{Page, Predicate, PredicateRegistry, SearchCriteria, SpecificationBuilder};

    // Storage
    pub use crate::store::{MemoryStore, Store, Transaction};
    #[cfg(feature = "storage")]
    pub use crate::store::SqliteStore;

    // Views
    pub use crate::views::{BookView, CartView, CategoryView, OrderLineView, OrderView};
}
