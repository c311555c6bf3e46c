//! Cart settlement: turning a user's cart into an order.
//!
//! Placing an order reads the cart, snapshots each book's current price onto
//! the order lines, persists the order and empties the cart, all inside one
//! storage transaction. Any failure leaves both the cart and the order table
//! exactly as they were.

use crate::checkout::{NewOrder, NewOrderLine, Order, OrderStatus};
use crate::error::{CommerceError, Result};
use crate::ids::{OrderId, OrderLineId, UserId};
use crate::search::Page;
use crate::store::{CartRepository, CatalogRepository, OrderRepository, Store, Transaction};
use crate::views::{OrderLineView, OrderView};
use chrono::Utc;

/// Order placement and order queries over a [`Store`].
#[derive(Debug, Clone)]
pub struct CartSettlementService<S> {
    store: S,
}

impl<S: Store> CartSettlementService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Settle the user's cart into a new accepted order.
    ///
    /// Fails with `Validation` on a blank address, `NotFound` when the user has
    /// no cart or a line's book is gone, `EmptyCart` when there is nothing to
    /// order, and `Conflict` when a concurrent settlement won the cart.
    #[tracing::instrument(skip(self, shipping_address))]
    pub async fn place_order(&self, owner_id: UserId, shipping_address: &str) -> Result<OrderView> {
        let shipping_address = shipping_address.trim();
        if shipping_address.is_empty() {
            return Err(CommerceError::Validation(
                "shipping address must not be blank".to_string(),
            ));
        }

        let mut tx = self.store.begin().await?;
        let cart = tx
            .find_cart_by_owner(owner_id)
            .await?
            .ok_or_else(|| CommerceError::not_found("Cart for user", owner_id))?;
        if cart.is_empty() {
            return Err(CommerceError::EmptyCart(cart.id.to_string()));
        }

        let mut lines = Vec::with_capacity(cart.lines.len());
        for line in &cart.lines {
            let unit_price = tx
                .current_unit_price(line.book_id)
                .await?
                .ok_or_else(|| CommerceError::not_found("Book", line.book_id))?;
            lines.push(NewOrderLine {
                book_id: line.book_id,
                quantity: line.quantity,
                unit_price,
            });
        }

        let order = NewOrder::from_lines(owner_id, shipping_address, lines, Utc::now())?;
        let order = tx.insert_order(order).await?;
        tx.clear_cart_lines(&cart).await?;
        tx.commit().await?;

        tracing::info!(
            order_id = %order.id,
            cart_id = %cart.id,
            lines = order.lines.len(),
            total = %order.total,
            "order placed"
        );
        Ok(order.into())
    }

    /// Assign a new status. The status text is matched case-insensitively.
    #[tracing::instrument(skip(self))]
    pub async fn update_order_status(&self, order_id: OrderId, status: &str) -> Result<OrderView> {
        let status: OrderStatus = status.parse()?;
        let mut tx = self.store.begin().await?;
        if !tx.set_order_status(order_id, status).await? {
            return Err(CommerceError::not_found("Order", order_id));
        }
        let order = find_order(&mut tx, order_id).await?;
        tx.commit().await?;

        tracing::info!(order_id = %order_id, status = %status, "order status updated");
        Ok(order.into())
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_order(&self, order_id: OrderId) -> Result<OrderView> {
        let mut tx = self.store.begin().await?;
        Ok(find_order(&mut tx, order_id).await?.into())
    }

    /// The user's orders, newest first.
    #[tracing::instrument(skip(self))]
    pub async fn order_history(&self, owner_id: UserId, page: Page) -> Result<Vec<OrderView>> {
        let mut tx = self.store.begin().await?;
        let orders = tx.orders_by_owner(owner_id, page).await?;
        Ok(orders.into_iter().map(OrderView::from).collect())
    }

    /// Lines of an order, in placement order.
    #[tracing::instrument(skip(self))]
    pub async fn order_lines(&self, order_id: OrderId, page: Page) -> Result<Vec<OrderLineView>> {
        let mut tx = self.store.begin().await?;
        let order = find_order(&mut tx, order_id).await?;
        Ok(page.apply(order.lines.into_iter().map(OrderLineView::from)))
    }

    #[tracing::instrument(skip(self))]
    pub async fn order_line(&self, order_id: OrderId, line_id: OrderLineId) -> Result<OrderLineView> {
        let mut tx = self.store.begin().await?;
        let order = find_order(&mut tx, order_id).await?;
        order
            .line(line_id)
            .copied()
            .map(OrderLineView::from)
            .ok_or_else(|| {
                CommerceError::not_found("Order line", format!("{line_id} in order {order_id}"))
            })
    }
}

async fn find_order<R: OrderRepository>(repo: &mut R, id: OrderId) -> Result<Order> {
    repo.find_order(id)
        .await?
        .ok_or_else(|| CommerceError::not_found("Order", id))
}
