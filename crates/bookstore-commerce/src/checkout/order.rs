//! Order types.

use crate::error::{CommerceError, Result};
use crate::ids::{BookId, OrderId, OrderLineId, UserId};
use crate::money::{Currency, Money};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Order status.
///
/// Any status may be assigned at any time; there is no transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Order placed and accepted (initial status).
    #[default]
    Accepted,
    /// Order rejected.
    Rejected,
    /// Order awaiting processing.
    Pending,
    /// Order delivered.
    Delivered,
    /// Order completed.
    Completed,
}

impl OrderStatus {
    /// Every status, in declaration order.
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Accepted,
        OrderStatus::Rejected,
        OrderStatus::Pending,
        OrderStatus::Delivered,
        OrderStatus::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Accepted => "ACCEPTED",
            OrderStatus::Rejected => "REJECTED",
            OrderStatus::Pending => "PENDING",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Completed => "COMPLETED",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            OrderStatus::Accepted => "Accepted",
            OrderStatus::Rejected => "Rejected",
            OrderStatus::Pending => "Pending",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Completed => "Completed",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = CommerceError;

    /// Case-insensitive; surrounding whitespace is ignored.
    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| CommerceError::Validation(format!("unrecognized order status: {s:?}")))
    }
}

/// A placed order. Lines are owned by the order and never change.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    /// Unique order identifier.
    pub id: OrderId,
    /// The user who placed the order.
    pub owner_id: UserId,
    pub status: OrderStatus,
    /// Sum of line unit price times quantity.
    pub total: Money,
    /// When the order was placed.
    pub created_at: DateTime<Utc>,
    pub shipping_address: String,
    pub lines: Vec<OrderLine>,
}

impl Order {
    /// Whether `total` equals the exact sum over the lines.
    pub fn is_consistent(&self) -> bool {
        order_total(self.lines.iter().map(|l| (l.unit_price, l.quantity)), self.total.currency)
            .is_ok_and(|total| total == self.total)
    }

    /// Get a line by ID.
    pub fn line(&self, line_id: OrderLineId) -> Option<&OrderLine> {
        self.lines.iter().find(|l| l.id == line_id)
    }
}

/// A line in a placed order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderLine {
    pub id: OrderLineId,
    pub book_id: BookId,
    pub quantity: i64,
    /// Book price at the moment the order was placed.
    pub unit_price: Money,
}

/// An order about to be persisted; storage assigns the identifiers.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub owner_id: UserId,
    pub status: OrderStatus,
    pub total: Money,
    pub created_at: DateTime<Utc>,
    pub shipping_address: String,
    pub lines: Vec<NewOrderLine>,
}

/// A line of a [`NewOrder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewOrderLine {
    pub book_id: BookId,
    pub quantity: i64,
    pub unit_price: Money,
}

impl NewOrder {
    /// Build an accepted order from price-snapshotted lines, computing the total.
    ///
    /// Fails on an empty line list, mixed currencies, or overflow.
    pub fn from_lines(
        owner_id: UserId,
        shipping_address: impl Into<String>,
        lines: Vec<NewOrderLine>,
        created_at: DateTime<Utc>,
    ) -> Result<Self> {
        let currency = lines
            .first()
            .map(|l| l.unit_price.currency)
            .ok_or_else(|| CommerceError::Validation("order has no lines".to_string()))?;
        let total = order_total(lines.iter().map(|l| (l.unit_price, l.quantity)), currency)?;

        Ok(Self {
            owner_id,
            status: OrderStatus::Accepted,
            total,
            created_at,
            shipping_address: shipping_address.into(),
            lines,
        })
    }

    /// Attach storage-assigned identifiers.
    pub fn into_order(
        self,
        id: OrderId,
        line_ids: impl IntoIterator<Item = OrderLineId>,
    ) -> Order {
        let lines = self
            .lines
            .into_iter()
            .zip(line_ids)
            .map(|(line, id)| OrderLine {
                id,
                book_id: line.book_id,
                quantity: line.quantity,
                unit_price: line.unit_price,
            })
            .collect();

        Order {
            id,
            owner_id: self.owner_id,
            status: self.status,
            total: self.total,
            created_at: self.created_at,
            shipping_address: self.shipping_address,
            lines,
        }
    }
}

fn order_total(
    lines: impl Iterator<Item = (Money, i64)>,
    currency: Currency,
) -> Result<Money> {
    let mut total = Money::zero(currency);
    for (unit_price, quantity) in lines {
        if unit_price.currency != currency {
            return Err(CommerceError::CurrencyMismatch {
                expected: currency.code().to_string(),
                got: unit_price.currency.code().to_string(),
            });
        }
        let subtotal = unit_price
            .try_multiply(quantity)
            .ok_or(CommerceError::Overflow)?;
        total = total.try_add(&subtotal).ok_or(CommerceError::Overflow)?;
    }
    Ok(total)
}
