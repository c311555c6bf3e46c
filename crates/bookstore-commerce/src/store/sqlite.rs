//! SQLite-backed store.
//!
//! Money is stored as integer minor units next to a currency code. Books and
//! categories are soft-deleted. Search predicates are pushed down into the
//! `WHERE` clause.

use super::{CartRepository, CatalogRepository, OrderRepository, Store, Transaction};
use crate::cart::{Cart, CartLine};
use crate::catalog::{Book, Category, NewBook, NewCategory};
use crate::checkout::{NewOrder, Order, OrderLine, OrderStatus};
use crate::error::{CommerceError, Result};
use crate::ids::{BookId, CartId, CartLineId, CategoryId, OrderId, OrderLineId, UserId};
use crate::money::{Currency, Money};
use crate::search::{Page, Predicate};
use async_trait::async_trait;
use bookstore_db::{params, Db, Tx, Value};
use chrono::{DateTime, Utc};
use serde::Deserialize;

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS categories (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        description TEXT,
        is_deleted INTEGER NOT NULL DEFAULT 0
    )",
    "CREATE TABLE IF NOT EXISTS books (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        author TEXT NOT NULL,
        isbn TEXT NOT NULL,
        price_cents INTEGER NOT NULL CHECK (price_cents > 0),
        currency TEXT NOT NULL,
        description TEXT,
        cover_image TEXT,
        is_deleted INTEGER NOT NULL DEFAULT 0
    )",
    "CREATE TABLE IF NOT EXISTS book_categories (
        book_id INTEGER NOT NULL REFERENCES books(id),
        category_id INTEGER NOT NULL REFERENCES categories(id),
        PRIMARY KEY (book_id, category_id)
    )",
    "CREATE TABLE IF NOT EXISTS carts (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        owner_id INTEGER NOT NULL UNIQUE,
        version INTEGER NOT NULL DEFAULT 0
    )",
    "CREATE TABLE IF NOT EXISTS cart_lines (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        cart_id INTEGER NOT NULL REFERENCES carts(id),
        book_id INTEGER NOT NULL REFERENCES books(id),
        quantity INTEGER NOT NULL CHECK (quantity > 0),
        UNIQUE (cart_id, book_id)
    )",
    "CREATE TABLE IF NOT EXISTS orders (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        owner_id INTEGER NOT NULL,
        status TEXT NOT NULL,
        total_cents INTEGER NOT NULL,
        currency TEXT NOT NULL,
        created_at TEXT NOT NULL,
        shipping_address TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS order_lines (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        order_id INTEGER NOT NULL REFERENCES orders(id),
        book_id INTEGER NOT NULL,
        quantity INTEGER NOT NULL CHECK (quantity > 0),
        unit_price_cents INTEGER NOT NULL,
        currency TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_orders_owner ON orders (owner_id)",
    "CREATE INDEX IF NOT EXISTS idx_order_lines_order ON order_lines (order_id)",
];

const BOOK_COLUMNS: &str = "b.id, b.title, b.author, b.isbn, b.price_cents, b.currency, \
     b.description, b.cover_image, \
     (SELECT GROUP_CONCAT(category_id) FROM book_categories WHERE book_id = b.id) AS category_ids";

const ORDER_COLUMNS: &str =
    "id, owner_id, status, total_cents, currency, created_at, shipping_address";

/// Store over a SQLite database.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    db: Db,
}

impl SqliteStore {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Open the database at `url` and bring its schema up to date.
    pub async fn connect(url: &str) -> Result<Self> {
        let store = Self::new(Db::open(url).await?);
        store.migrate().await?;
        Ok(store)
    }

    /// Create any missing tables and indexes.
    pub async fn migrate(&self) -> Result<()> {
        let mut tx = self.db.begin().await?;
        for statement in SCHEMA {
            tx.execute(statement, params![]).await?;
        }
        tx.commit().await?;
        tracing::info!(tables = SCHEMA.len(), "schema migrated");
        Ok(())
    }

    /// The underlying database handle.
    pub fn db(&self) -> &Db {
        &self.db
    }
}

#[async_trait]
impl Store for SqliteStore {
    type Tx = SqliteTx;

    async fn begin(&self) -> Result<SqliteTx> {
        Ok(SqliteTx {
            tx: self.db.begin().await?,
        })
    }
}

/// Transaction over a [`SqliteStore`].
pub struct SqliteTx {
    tx: Tx,
}

#[async_trait]
impl Transaction for SqliteTx {
    async fn commit(self) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct BookRow {
    id: i64,
    title: String,
    author: String,
    isbn: String,
    price_cents: i64,
    currency: String,
    description: Option<String>,
    cover_image: Option<String>,
    category_ids: Option<String>,
}

impl BookRow {
    fn into_book(self) -> Result<Book> {
        let category_ids = self
            .category_ids
            .as_deref()
            .unwrap_or("")
            .split(',')
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<CategoryId>()
                    .map_err(|e| CommerceError::Storage(format!("bad category id {s:?}: {e}")))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Book {
            id: BookId::new(self.id),
            title: self.title,
            author: self.author,
            isbn: self.isbn,
            price: money(self.price_cents, &self.currency)?,
            description: self.description,
            cover_image: self.cover_image,
            category_ids,
        })
    }
}

#[derive(Debug, Deserialize)]
struct CategoryRow {
    id: i64,
    name: String,
    description: Option<String>,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Category {
            id: CategoryId::new(row.id),
            name: row.name,
            description: row.description,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CartRow {
    id: i64,
    owner_id: i64,
    version: i64,
}

#[derive(Debug, Deserialize)]
struct CartLineRow {
    id: i64,
    book_id: i64,
    quantity: i64,
}

#[derive(Debug, Deserialize)]
struct PriceRow {
    price_cents: i64,
    currency: String,
}

#[derive(Debug, Deserialize)]
struct OrderRow {
    id: i64,
    owner_id: i64,
    status: String,
    total_cents: i64,
    currency: String,
    created_at: String,
    shipping_address: String,
}

#[derive(Debug, Deserialize)]
struct OrderLineRow {
    id: i64,
    book_id: i64,
    quantity: i64,
    unit_price_cents: i64,
    currency: String,
}

fn money(cents: i64, code: &str) -> Result<Money> {
    let currency = Currency::from_code(code)
        .ok_or_else(|| CommerceError::Storage(format!("unknown currency {code:?}")))?;
    Ok(Money::new(cents, currency))
}

fn books(rows: Vec<BookRow>) -> Result<Vec<Book>> {
    rows.into_iter().map(BookRow::into_book).collect()
}

impl SqliteTx {
    async fn link_categories(&mut self, book_id: BookId, categories: &[CategoryId]) -> Result<()> {
        self.tx
            .execute(
                "DELETE FROM book_categories WHERE book_id = ?",
                params![book_id.get()],
            )
            .await?;
        for category_id in categories {
            self.tx
                .execute(
                    "INSERT OR IGNORE INTO book_categories (book_id, category_id) VALUES (?, ?)",
                    params![book_id.get(), category_id.get()],
                )
                .await?;
        }
        Ok(())
    }

    async fn bump_cart_version(&mut self, cart_id: CartId) -> Result<()> {
        self.tx
            .execute(
                "UPDATE carts SET version = version + 1 WHERE id = ?",
                params![cart_id.get()],
            )
            .await?;
        Ok(())
    }

    async fn load_order(&mut self, row: OrderRow) -> Result<Order> {
        let lines: Vec<OrderLineRow> = self
            .tx
            .query_as(
                "SELECT id, book_id, quantity, unit_price_cents, currency
                 FROM order_lines WHERE order_id = ? ORDER BY id",
                params![row.id],
            )
            .await?;
        let lines = lines
            .into_iter()
            .map(|line| {
                Ok(OrderLine {
                    id: OrderLineId::new(line.id),
                    book_id: BookId::new(line.book_id),
                    quantity: line.quantity,
                    unit_price: money(line.unit_price_cents, &line.currency)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let created_at = DateTime::parse_from_rfc3339(&row.created_at)
            .map_err(|e| CommerceError::Storage(format!("bad order timestamp: {e}")))?
            .with_timezone(&Utc);

        Ok(Order {
            id: OrderId::new(row.id),
            owner_id: UserId::new(row.owner_id),
            status: row.status.parse()?,
            total: money(row.total_cents, &row.currency)?,
            created_at,
            shipping_address: row.shipping_address,
            lines,
        })
    }
}

#[async_trait]
impl CatalogRepository for SqliteTx {
    async fn insert_book(&mut self, book: NewBook) -> Result<Book> {
        self.tx
            .execute(
                "INSERT INTO books (title, author, isbn, price_cents, currency, description, cover_image)
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
                params![
                    &book.title,
                    &book.author,
                    &book.isbn,
                    book.price.amount_cents,
                    book.price.currency.code(),
                    book.description.clone(),
                    book.cover_image.clone(),
                ],
            )
            .await?;
        let id = BookId::new(self.tx.last_insert_id().await?);
        self.link_categories(id, &book.category_ids).await?;
        Ok(Book::from_new(id, book))
    }

    async fn find_book(&mut self, id: BookId) -> Result<Option<Book>> {
        let sql = format!("SELECT {BOOK_COLUMNS} FROM books b WHERE b.id = ? AND b.is_deleted = 0");
        let row: Option<BookRow> = self.tx.query_optional(&sql, params![id.get()]).await?;
        row.map(BookRow::into_book).transpose()
    }

    async fn search_books(&mut self, predicate: &Predicate, page: Page) -> Result<Vec<Book>> {
        let (clause, values) = predicate.to_sql();
        let sql = format!(
            "SELECT {BOOK_COLUMNS} FROM books b WHERE b.is_deleted = 0 AND ({clause})
             ORDER BY b.id LIMIT ? OFFSET ?"
        );
        let mut params: Vec<Value> = values.into_iter().map(Value::from).collect();
        params.push(page.limit().into());
        params.push(page.offset().into());

        tracing::debug!(%clause, "search pushdown");
        books(self.tx.query_as(&sql, &params).await?)
    }

    async fn books_in_category(&mut self, category_id: CategoryId) -> Result<Vec<Book>> {
        let sql = format!(
            "SELECT {BOOK_COLUMNS} FROM books b
             JOIN book_categories bc ON bc.book_id = b.id
             WHERE bc.category_id = ? AND b.is_deleted = 0
             ORDER BY b.id"
        );
        books(self.tx.query_as(&sql, params![category_id.get()]).await?)
    }

    async fn update_book(&mut self, book: &Book) -> Result<bool> {
        let updated = self
            .tx
            .execute(
                "UPDATE books SET title = ?, author = ?, isbn = ?, price_cents = ?, currency = ?,
                 description = ?, cover_image = ?
                 WHERE id = ? AND is_deleted = 0",
                params![
                    &book.title,
                    &book.author,
                    &book.isbn,
                    book.price.amount_cents,
                    book.price.currency.code(),
                    book.description.clone(),
                    book.cover_image.clone(),
                    book.id.get(),
                ],
            )
            .await?;
        if updated == 0 {
            return Ok(false);
        }
        self.link_categories(book.id, &book.category_ids).await?;
        Ok(true)
    }

    async fn delete_book(&mut self, id: BookId) -> Result<bool> {
        let deleted = self
            .tx
            .execute(
                "UPDATE books SET is_deleted = 1 WHERE id = ? AND is_deleted = 0",
                params![id.get()],
            )
            .await?;
        Ok(deleted > 0)
    }

    async fn current_unit_price(&mut self, id: BookId) -> Result<Option<Money>> {
        let row: Option<PriceRow> = self
            .tx
            .query_optional(
                "SELECT price_cents, currency FROM books WHERE id = ? AND is_deleted = 0",
                params![id.get()],
            )
            .await?;
        row.map(|r| money(r.price_cents, &r.currency)).transpose()
    }

    async fn insert_category(&mut self, category: NewCategory) -> Result<Category> {
        self.tx
            .execute(
                "INSERT INTO categories (name, description) VALUES (?, ?)",
                params![&category.name, category.description.clone()],
            )
            .await?;
        let id = CategoryId::new(self.tx.last_insert_id().await?);
        Ok(Category::from_new(id, category))
    }

    async fn find_category(&mut self, id: CategoryId) -> Result<Option<Category>> {
        let row: Option<CategoryRow> = self
            .tx
            .query_optional(
                "SELECT id, name, description FROM categories WHERE id = ? AND is_deleted = 0",
                params![id.get()],
            )
            .await?;
        Ok(row.map(Category::from))
    }

    async fn list_categories(&mut self, page: Page) -> Result<Vec<Category>> {
        let rows: Vec<CategoryRow> = self
            .tx
            .query_as(
                "SELECT id, name, description FROM categories WHERE is_deleted = 0
                 ORDER BY id LIMIT ? OFFSET ?",
                params![page.limit(), page.offset()],
            )
            .await?;
        Ok(rows.into_iter().map(Category::from).collect())
    }

    async fn update_category(&mut self, category: &Category) -> Result<bool> {
        let updated = self
            .tx
            .execute(
                "UPDATE categories SET name = ?, description = ? WHERE id = ? AND is_deleted = 0",
                params![
                    &category.name,
                    category.description.clone(),
                    category.id.get(),
                ],
            )
            .await?;
        Ok(updated > 0)
    }

    async fn delete_category(&mut self, id: CategoryId) -> Result<bool> {
        let deleted = self
            .tx
            .execute(
                "UPDATE categories SET is_deleted = 1 WHERE id = ? AND is_deleted = 0",
                params![id.get()],
            )
            .await?;
        if deleted == 0 {
            return Ok(false);
        }
        self.tx
            .execute(
                "DELETE FROM book_categories WHERE category_id = ?",
                params![id.get()],
            )
            .await?;
        Ok(true)
    }
}

#[async_trait]
impl CartRepository for SqliteTx {
    async fn find_cart_by_owner(&mut self, owner_id: UserId) -> Result<Option<Cart>> {
        let row: Option<CartRow> = self
            .tx
            .query_optional(
                "SELECT id, owner_id, version FROM carts WHERE owner_id = ?",
                params![owner_id.get()],
            )
            .await?;
        let Some(row) = row else {
            return Ok(None);
        };

        let lines: Vec<CartLineRow> = self
            .tx
            .query_as(
                "SELECT id, book_id, quantity FROM cart_lines WHERE cart_id = ? ORDER BY id",
                params![row.id],
            )
            .await?;

        Ok(Some(Cart {
            id: CartId::new(row.id),
            owner_id: UserId::new(row.owner_id),
            version: row.version,
            lines: lines
                .into_iter()
                .map(|line| CartLine {
                    id: CartLineId::new(line.id),
                    book_id: BookId::new(line.book_id),
                    quantity: line.quantity,
                })
                .collect(),
        }))
    }

    async fn create_cart(&mut self, owner_id: UserId) -> Result<Cart> {
        self.tx
            .execute(
                "INSERT INTO carts (owner_id, version) VALUES (?, 0)",
                params![owner_id.get()],
            )
            .await?;
        let id = CartId::new(self.tx.last_insert_id().await?);
        Ok(Cart::new(id, owner_id))
    }

    async fn add_cart_line(
        &mut self,
        cart_id: CartId,
        book_id: BookId,
        quantity: i64,
    ) -> Result<CartLine> {
        self.tx
            .execute(
                "INSERT INTO cart_lines (cart_id, book_id, quantity) VALUES (?, ?, ?)",
                params![cart_id.get(), book_id.get(), quantity],
            )
            .await?;
        let id = CartLineId::new(self.tx.last_insert_id().await?);
        self.bump_cart_version(cart_id).await?;
        Ok(CartLine {
            id,
            book_id,
            quantity,
        })
    }

    async fn update_cart_line(
        &mut self,
        cart_id: CartId,
        line_id: CartLineId,
        quantity: i64,
    ) -> Result<bool> {
        let updated = self
            .tx
            .execute(
                "UPDATE cart_lines SET quantity = ? WHERE id = ? AND cart_id = ?",
                params![quantity, line_id.get(), cart_id.get()],
            )
            .await?;
        if updated == 0 {
            return Ok(false);
        }
        self.bump_cart_version(cart_id).await?;
        Ok(true)
    }

    async fn remove_cart_line(&mut self, cart_id: CartId, line_id: CartLineId) -> Result<bool> {
        let removed = self
            .tx
            .execute(
                "DELETE FROM cart_lines WHERE id = ? AND cart_id = ?",
                params![line_id.get(), cart_id.get()],
            )
            .await?;
        if removed == 0 {
            return Ok(false);
        }
        self.bump_cart_version(cart_id).await?;
        Ok(true)
    }

    async fn clear_cart_lines(&mut self, cart: &Cart) -> Result<()> {
        let claimed = self
            .tx
            .execute(
                "UPDATE carts SET version = version + 1 WHERE id = ? AND version = ?",
                params![cart.id.get(), cart.version],
            )
            .await?;
        if claimed == 0 {
            return Err(CommerceError::Conflict(format!(
                "cart {} changed since it was read",
                cart.id
            )));
        }
        self.tx
            .execute(
                "DELETE FROM cart_lines WHERE cart_id = ?",
                params![cart.id.get()],
            )
            .await?;
        Ok(())
    }
}

#[async_trait]
impl OrderRepository for SqliteTx {
    async fn insert_order(&mut self, order: NewOrder) -> Result<Order> {
        self.tx
            .execute(
                "INSERT INTO orders (owner_id, status, total_cents, currency, created_at, shipping_address)
                 VALUES (?, ?, ?, ?, ?, ?)",
                params![
                    order.owner_id.get(),
                    order.status.as_str(),
                    order.total.amount_cents,
                    order.total.currency.code(),
                    order.created_at.to_rfc3339(),
                    &order.shipping_address,
                ],
            )
            .await?;
        let id = OrderId::new(self.tx.last_insert_id().await?);

        let mut line_ids = Vec::with_capacity(order.lines.len());
        for line in &order.lines {
            self.tx
                .execute(
                    "INSERT INTO order_lines (order_id, book_id, quantity, unit_price_cents, currency)
                     VALUES (?, ?, ?, ?, ?)",
                    params![
                        id.get(),
                        line.book_id.get(),
                        line.quantity,
                        line.unit_price.amount_cents,
                        line.unit_price.currency.code(),
                    ],
                )
                .await?;
            line_ids.push(OrderLineId::new(self.tx.last_insert_id().await?));
        }

        Ok(order.into_order(id, line_ids))
    }

    async fn find_order(&mut self, id: OrderId) -> Result<Option<Order>> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?");
        let row: Option<OrderRow> = self.tx.query_optional(&sql, params![id.get()]).await?;
        match row {
            Some(row) => Ok(Some(self.load_order(row).await?)),
            None => Ok(None),
        }
    }

    async fn orders_by_owner(&mut self, owner_id: UserId, page: Page) -> Result<Vec<Order>> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE owner_id = ?
             ORDER BY id DESC LIMIT ? OFFSET ?"
        );
        let rows: Vec<OrderRow> = self
            .tx
            .query_as(&sql, params![owner_id.get(), page.limit(), page.offset()])
            .await?;

        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            orders.push(self.load_order(row).await?);
        }
        Ok(orders)
    }

    async fn set_order_status(&mut self, id: OrderId, status: OrderStatus) -> Result<bool> {
        let updated = self
            .tx
            .execute(
                "UPDATE orders SET status = ? WHERE id = ?",
                params![status.as_str(), id.get()],
            )
            .await?;
        Ok(updated > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> SqliteStore {
        let store = SqliteStore::new(Db::open_in_memory().await.unwrap());
        store.migrate().await.unwrap();
        store
    }

    fn new_book(title: &str, author: &str, cents: i64) -> NewBook {
        NewBook::new(title, author, format!("isbn-{title}"), Money::new(cents, Currency::USD))
    }

    #[tokio::test]
    async fn test_migrate_is_idempotent() {
        let store = store().await;
        store.migrate().await.unwrap();
    }

    #[tokio::test]
    async fn test_book_roundtrip_with_categories() {
        let store = store().await;
        let mut tx = store.begin().await.unwrap();
        let fiction = tx.insert_category(NewCategory::new("Fiction")).await.unwrap();
        let classics = tx.insert_category(NewCategory::new("Classics")).await.unwrap();
        let book = tx
            .insert_book(
                new_book("Emma", "Austen", 899)
                    .in_category(fiction.id)
                    .in_category(classics.id),
            )
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        let found = tx.find_book(book.id).await.unwrap().unwrap();
        assert_eq!(found.price, Money::new(899, Currency::USD));
        assert_eq!(found.category_ids, vec![fiction.id, classics.id]);
        assert_eq!(tx.books_in_category(classics.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_soft_delete_hides_book() {
        let store = store().await;
        let mut tx = store.begin().await.unwrap();
        let book = tx.insert_book(new_book("Emma", "Austen", 899)).await.unwrap();

        assert!(tx.delete_book(book.id).await.unwrap());
        assert!(!tx.delete_book(book.id).await.unwrap());
        assert!(tx.find_book(book.id).await.unwrap().is_none());
        assert!(tx.current_unit_price(book.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_search_pushdown() {
        let store = store().await;
        let mut tx = store.begin().await.unwrap();
        tx.insert_book(new_book("Dune", "Herbert", 1000)).await.unwrap();
        tx.insert_book(new_book("Emma", "Austen", 899)).await.unwrap();
        tx.insert_book(new_book("Persuasion", "Austen", 799)).await.unwrap();

        let austen = Predicate::any_of("author", &["Austen".to_string()].into_iter().collect());
        let found = tx.search_books(&austen, Page::default()).await.unwrap();
        assert_eq!(found.len(), 2);

        let second_page = tx.search_books(&austen, Page::new(2, 1)).await.unwrap();
        assert_eq!(second_page[0].title, "Persuasion");
    }

    #[tokio::test]
    async fn test_clear_cart_lines_checks_version() {
        let store = store().await;
        let mut tx = store.begin().await.unwrap();
        let book = tx.insert_book(new_book("Dune", "Herbert", 1000)).await.unwrap();
        let cart = tx.create_cart(UserId::new(1)).await.unwrap();
        tx.add_cart_line(cart.id, book.id, 2).await.unwrap();

        let stale = tx.clear_cart_lines(&cart).await.unwrap_err();
        assert!(matches!(stale, CommerceError::Conflict(_)));

        let fresh = tx.find_cart_by_owner(UserId::new(1)).await.unwrap().unwrap();
        assert_eq!(fresh.lines.len(), 1);
        tx.clear_cart_lines(&fresh).await.unwrap();
        let cleared = tx.find_cart_by_owner(UserId::new(1)).await.unwrap().unwrap();
        assert!(cleared.is_empty());
        assert_eq!(cleared.version, fresh.version + 1);
    }
}
