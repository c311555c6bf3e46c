//! Storage ports.
//!
//! Services talk to storage only through a [`Transaction`] opened from a
//! [`Store`]. Everything done through one transaction becomes visible on
//! [`Transaction::commit`]; dropping an uncommitted transaction rolls it back.

mod memory;
#[cfg(feature = "storage")]
mod sqlite;

pub use memory::{FailPoint, MemoryStore, MemoryTx};
#[cfg(feature = "storage")]
pub use sqlite::{SqliteStore, SqliteTx};

use crate::cart::{Cart, CartLine};
use crate::catalog::{Book, Category, NewBook, NewCategory};
use crate::checkout::{NewOrder, Order, OrderStatus};
use crate::error::Result;
use crate::ids::{BookId, CartId, CartLineId, CategoryId, OrderId, UserId};
use crate::money::Money;
use crate::search::{Page, Predicate};
use async_trait::async_trait;

/// Books and categories.
#[async_trait]
pub trait CatalogRepository: Send {
    async fn insert_book(&mut self, book: NewBook) -> Result<Book>;
    /// Live (not deleted) book by id.
    async fn find_book(&mut self, id: BookId) -> Result<Option<Book>>;
    /// Live books matching the predicate, ordered by id.
    async fn search_books(&mut self, predicate: &Predicate, page: Page) -> Result<Vec<Book>>;
    async fn books_in_category(&mut self, category_id: CategoryId) -> Result<Vec<Book>>;
    /// Replace a book's stored fields. `false` if it does not exist.
    async fn update_book(&mut self, book: &Book) -> Result<bool>;
    /// Remove a book from the catalog. `false` if it does not exist.
    async fn delete_book(&mut self, id: BookId) -> Result<bool>;
    /// The price a book sells for right now.
    async fn current_unit_price(&mut self, id: BookId) -> Result<Option<Money>>;

    async fn insert_category(&mut self, category: NewCategory) -> Result<Category>;
    async fn find_category(&mut self, id: CategoryId) -> Result<Option<Category>>;
    async fn list_categories(&mut self, page: Page) -> Result<Vec<Category>>;
    async fn update_category(&mut self, category: &Category) -> Result<bool>;
    async fn delete_category(&mut self, id: CategoryId) -> Result<bool>;
}

/// Carts and their lines. Every mutation bumps the cart version.
#[async_trait]
pub trait CartRepository: Send {
    /// The owner's cart with all of its lines.
    async fn find_cart_by_owner(&mut self, owner_id: UserId) -> Result<Option<Cart>>;
    async fn create_cart(&mut self, owner_id: UserId) -> Result<Cart>;
    async fn add_cart_line(
        &mut self,
        cart_id: CartId,
        book_id: BookId,
        quantity: i64,
    ) -> Result<CartLine>;
    async fn update_cart_line(
        &mut self,
        cart_id: CartId,
        line_id: CartLineId,
        quantity: i64,
    ) -> Result<bool>;
    async fn remove_cart_line(&mut self, cart_id: CartId, line_id: CartLineId) -> Result<bool>;
    /// Remove every line of the cart as read.
    ///
    /// Fails with `Conflict` if the stored cart version no longer equals
    /// `cart.version`.
    async fn clear_cart_lines(&mut self, cart: &Cart) -> Result<()>;
}

/// Orders and their lines.
#[async_trait]
pub trait OrderRepository: Send {
    /// Persist an order and its lines, assigning identifiers.
    async fn insert_order(&mut self, order: NewOrder) -> Result<Order>;
    async fn find_order(&mut self, id: OrderId) -> Result<Option<Order>>;
    /// The owner's orders, newest first.
    async fn orders_by_owner(&mut self, owner_id: UserId, page: Page) -> Result<Vec<Order>>;
    async fn set_order_status(&mut self, id: OrderId, status: OrderStatus) -> Result<bool>;
}

/// A unit of work over all repositories.
#[async_trait]
pub trait Transaction: CatalogRepository + CartRepository + OrderRepository + Send + Sized {
    /// Make every write of this transaction visible.
    async fn commit(self) -> Result<()>;
}

/// Opens transactions.
#[async_trait]
pub trait Store: Send + Sync {
    type Tx: Transaction;

    async fn begin(&self) -> Result<Self::Tx>;
}
