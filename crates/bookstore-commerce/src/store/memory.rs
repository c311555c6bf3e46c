//! In-memory store.
//!
//! A transaction holds the store lock for its whole lifetime and works on a
//! private copy of the state; commit swaps the copy in. Transactions are
//! therefore fully serialized.

use super::{CartRepository, CatalogRepository, OrderRepository, Store, Transaction};
use crate::cart::{Cart, CartLine};
use crate::catalog::{Book, Category, NewBook, NewCategory};
use crate::checkout::{NewOrder, Order, OrderStatus};
use crate::error::{CommerceError, Result};
use crate::ids::{BookId, CartId, CartLineId, CategoryId, OrderId, OrderLineId, UserId};
use crate::money::Money;
use crate::search::{Page, Predicate};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Points at which a test can make the next transaction fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailPoint {
    InsertOrder,
    ClearCartLines,
}

#[derive(Debug, Default)]
struct FailPoints {
    insert_order: AtomicBool,
    clear_cart_lines: AtomicBool,
}

impl FailPoints {
    fn flag(&self, point: FailPoint) -> &AtomicBool {
        match point {
            FailPoint::InsertOrder => &self.insert_order,
            FailPoint::ClearCartLines => &self.clear_cart_lines,
        }
    }

    fn trip(&self, point: FailPoint) -> Result<()> {
        if self.flag(point).swap(false, Ordering::SeqCst) {
            return Err(CommerceError::Storage(format!("injected failure at {point:?}")));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
struct State {
    books: BTreeMap<BookId, Book>,
    categories: BTreeMap<CategoryId, Category>,
    carts: BTreeMap<CartId, Cart>,
    orders: BTreeMap<OrderId, Order>,
    last_id: i64,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn cart_mut(&mut self, cart_id: CartId) -> Result<&mut Cart> {
        self.carts
            .get_mut(&cart_id)
            .ok_or_else(|| CommerceError::not_found("Cart", cart_id))
    }
}

/// Store keeping everything in process memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
    faults: Arc<FailPoints>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next operation reaching `point` fail with a storage error.
    pub fn fail_next(&self, point: FailPoint) {
        self.faults.flag(point).store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl Store for MemoryStore {
    type Tx = MemoryTx;

    async fn begin(&self) -> Result<MemoryTx> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let working = guard.clone();
        Ok(MemoryTx {
            guard,
            working,
            faults: Arc::clone(&self.faults),
        })
    }
}

/// Transaction over a [`MemoryStore`].
#[derive(Debug)]
pub struct MemoryTx {
    guard: OwnedMutexGuard<State>,
    working: State,
    faults: Arc<FailPoints>,
}

#[async_trait]
impl Transaction for MemoryTx {
    async fn commit(mut self) -> Result<()> {
        *self.guard = self.working;
        tracing::trace!("memory transaction committed");
        Ok(())
    }
}

#[async_trait]
impl CatalogRepository for MemoryTx {
    async fn insert_book(&mut self, book: NewBook) -> Result<Book> {
        let id = BookId::new(self.working.next_id());
        let book = Book::from_new(id, book);
        self.working.books.insert(id, book.clone());
        Ok(book)
    }

    async fn find_book(&mut self, id: BookId) -> Result<Option<Book>> {
        Ok(self.working.books.get(&id).cloned())
    }

    async fn search_books(&mut self, predicate: &Predicate, page: Page) -> Result<Vec<Book>> {
        Ok(page.apply(
            self.working
                .books
                .values()
                .filter(|book| predicate.matches(*book))
                .cloned(),
        ))
    }

    async fn books_in_category(&mut self, category_id: CategoryId) -> Result<Vec<Book>> {
        Ok(self
            .working
            .books
            .values()
            .filter(|book| book.in_category(category_id))
            .cloned()
            .collect())
    }

    async fn update_book(&mut self, book: &Book) -> Result<bool> {
        match self.working.books.get_mut(&book.id) {
            Some(stored) => {
                *stored = book.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_book(&mut self, id: BookId) -> Result<bool> {
        Ok(self.working.books.remove(&id).is_some())
    }

    async fn current_unit_price(&mut self, id: BookId) -> Result<Option<Money>> {
        Ok(self.working.books.get(&id).map(|book| book.price))
    }

    async fn insert_category(&mut self, category: NewCategory) -> Result<Category> {
        let id = CategoryId::new(self.working.next_id());
        let category = Category::from_new(id, category);
        self.working.categories.insert(id, category.clone());
        Ok(category)
    }

    async fn find_category(&mut self, id: CategoryId) -> Result<Option<Category>> {
        Ok(self.working.categories.get(&id).cloned())
    }

    async fn list_categories(&mut self, page: Page) -> Result<Vec<Category>> {
        Ok(page.apply(self.working.categories.values().cloned()))
    }

    async fn update_category(&mut self, category: &Category) -> Result<bool> {
        match self.working.categories.get_mut(&category.id) {
            Some(stored) => {
                *stored = category.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_category(&mut self, id: CategoryId) -> Result<bool> {
        if self.working.categories.remove(&id).is_none() {
            return Ok(false);
        }
        for book in self.working.books.values_mut() {
            book.category_ids.retain(|c| *c != id);
        }
        Ok(true)
    }
}

#[async_trait]
impl CartRepository for MemoryTx {
    async fn find_cart_by_owner(&mut self, owner_id: UserId) -> Result<Option<Cart>> {
        Ok(self
            .working
            .carts
            .values()
            .find(|cart| cart.owner_id == owner_id)
            .cloned())
    }

    async fn create_cart(&mut self, owner_id: UserId) -> Result<Cart> {
        if self.working.carts.values().any(|c| c.owner_id == owner_id) {
            return Err(CommerceError::Conflict(format!(
                "user {owner_id} already has a cart"
            )));
        }
        let cart = Cart::new(CartId::new(self.working.next_id()), owner_id);
        self.working.carts.insert(cart.id, cart.clone());
        Ok(cart)
    }

    async fn add_cart_line(
        &mut self,
        cart_id: CartId,
        book_id: BookId,
        quantity: i64,
    ) -> Result<CartLine> {
        let line_id = CartLineId::new(self.working.next_id());
        let cart = self.working.cart_mut(cart_id)?;
        cart.add_book(line_id, book_id, quantity).copied()
    }

    async fn update_cart_line(
        &mut self,
        cart_id: CartId,
        line_id: CartLineId,
        quantity: i64,
    ) -> Result<bool> {
        let cart = self.working.cart_mut(cart_id)?;
        if cart.line(line_id).is_none() {
            return Ok(false);
        }
        cart.update_quantity(line_id, quantity)?;
        Ok(true)
    }

    async fn remove_cart_line(&mut self, cart_id: CartId, line_id: CartLineId) -> Result<bool> {
        let cart = self.working.cart_mut(cart_id)?;
        if cart.line(line_id).is_none() {
            return Ok(false);
        }
        cart.remove_line(line_id)?;
        Ok(true)
    }

    async fn clear_cart_lines(&mut self, cart: &Cart) -> Result<()> {
        self.faults.trip(FailPoint::ClearCartLines)?;
        let stored = self.working.cart_mut(cart.id)?;
        if stored.version != cart.version {
            return Err(CommerceError::Conflict(format!(
                "cart {} changed since it was read",
                cart.id
            )));
        }
        stored.clear();
        Ok(())
    }
}

#[async_trait]
impl OrderRepository for MemoryTx {
    async fn insert_order(&mut self, order: NewOrder) -> Result<Order> {
        self.faults.trip(FailPoint::InsertOrder)?;
        let id = OrderId::new(self.working.next_id());
        let line_ids: Vec<OrderLineId> = order
            .lines
            .iter()
            .map(|_| OrderLineId::new(self.working.next_id()))
            .collect();
        let order = order.into_order(id, line_ids);
        self.working.orders.insert(id, order.clone());
        Ok(order)
    }

    async fn find_order(&mut self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.working.orders.get(&id).cloned())
    }

    async fn orders_by_owner(&mut self, owner_id: UserId, page: Page) -> Result<Vec<Order>> {
        Ok(page.apply(
            self.working
                .orders
                .values()
                .rev()
                .filter(|order| order.owner_id == owner_id)
                .cloned(),
        ))
    }

    async fn set_order_status(&mut self, id: OrderId, status: OrderStatus) -> Result<bool> {
        match self.working.orders.get_mut(&id) {
            Some(order) => {
                order.status = status;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Currency;

    fn new_book(title: &str) -> NewBook {
        NewBook::new(title, "Author", format!("isbn-{title}"), Money::new(1000, Currency::USD))
    }

    #[tokio::test]
    async fn test_commit_makes_writes_visible() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let book = tx.insert_book(new_book("Dune")).await.unwrap();
        tx.commit().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        assert!(tx.find_book(book.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_drop_rolls_back() {
        let store = MemoryStore::new();
        let book_id = {
            let mut tx = store.begin().await.unwrap();
            tx.insert_book(new_book("Dune")).await.unwrap().id
        };

        let mut tx = store.begin().await.unwrap();
        assert!(tx.find_book(book_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_fail_point_fires_once() {
        let store = MemoryStore::new();
        store.fail_next(FailPoint::ClearCartLines);

        let mut tx = store.begin().await.unwrap();
        let cart = tx.create_cart(UserId::new(1)).await.unwrap();
        assert!(tx.clear_cart_lines(&cart).await.is_err());
        assert!(tx.clear_cart_lines(&cart).await.is_ok());
    }

    #[tokio::test]
    async fn test_clear_with_stale_version_conflicts() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let book = tx.insert_book(new_book("Dune")).await.unwrap();
        let stale = tx.create_cart(UserId::new(1)).await.unwrap();
        tx.add_cart_line(stale.id, book.id, 1).await.unwrap();

        let err = tx.clear_cart_lines(&stale).await.unwrap_err();
        assert!(matches!(err, CommerceError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_search_applies_predicate_and_page() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        for title in ["A", "B", "C"] {
            tx.insert_book(new_book(title)).await.unwrap();
        }

        let all = tx.search_books(&Predicate::MatchAll, Page::new(1, 2)).await.unwrap();
        assert_eq!(all.len(), 2);

        let only_b = Predicate::any_of("title", &["B".to_string()].into_iter().collect());
        let found = tx.search_books(&only_b, Page::default()).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "B");
    }
}
