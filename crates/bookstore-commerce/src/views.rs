//! Serializable views handed to callers of the services.

use crate::cart::{Cart, CartLine};
use crate::catalog::{Book, Category};
use crate::checkout::{Order, OrderLine, OrderStatus};
use crate::ids::{BookId, CartId, CartLineId, CategoryId, OrderId, OrderLineId, UserId};
use crate::money::Money;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookView {
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub price: Money,
    pub description: Option<String>,
    pub cover_image: Option<String>,
    pub category_ids: Vec<CategoryId>,
}

impl From<Book> for BookView {
    fn from(book: Book) -> Self {
        Self {
            id: book.id,
            title: book.title,
            author: book.author,
            isbn: book.isbn,
            price: book.price,
            description: book.description,
            cover_image: book.cover_image,
            category_ids: book.category_ids,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryView {
    pub id: CategoryId,
    pub name: String,
    pub description: Option<String>,
}

impl From<Category> for CategoryView {
    fn from(category: Category) -> Self {
        Self {
            id: category.id,
            name: category.name,
            description: category.description,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CartView {
    pub id: CartId,
    pub user_id: UserId,
    pub lines: Vec<CartLineView>,
    /// Sum of line quantities.
    pub item_count: i64,
}

impl From<Cart> for CartView {
    fn from(cart: Cart) -> Self {
        Self {
            id: cart.id,
            user_id: cart.owner_id,
            item_count: cart.item_count(),
            lines: cart.lines.into_iter().map(CartLineView::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CartLineView {
    pub id: CartLineId,
    pub book_id: BookId,
    pub quantity: i64,
}

impl From<CartLine> for CartLineView {
    fn from(line: CartLine) -> Self {
        Self {
            id: line.id,
            book_id: line.book_id,
            quantity: line.quantity,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderView {
    pub id: OrderId,
    pub user_id: UserId,
    pub status: OrderStatus,
    pub total: Money,
    pub order_date: DateTime<Utc>,
    pub shipping_address: String,
    pub lines: Vec<OrderLineView>,
}

impl From<Order> for OrderView {
    fn from(order: Order) -> Self {
        Self {
            id: order.id,
            user_id: order.owner_id,
            status: order.status,
            total: order.total,
            order_date: order.created_at,
            shipping_address: order.shipping_address,
            lines: order.lines.into_iter().map(OrderLineView::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderLineView {
    pub id: OrderLineId,
    pub book_id: BookId,
    pub quantity: i64,
    pub unit_price: Money,
}

impl From<OrderLine> for OrderLineView {
    fn from(line: OrderLine) -> Self {
        Self {
            id: line.id,
            book_id: line.book_id,
            quantity: line.quantity,
            unit_price: line.unit_price,
        }
    }
}
