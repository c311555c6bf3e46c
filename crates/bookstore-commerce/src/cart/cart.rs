//! Cart and cart line types.

use crate::error::{CommerceError, Result};
use crate::ids::{BookId, CartId, CartLineId, UserId};
use serde::{Deserialize, Serialize};

/// Maximum quantity allowed per cart line.
pub const MAX_QUANTITY_PER_ITEM: i64 = 9999;

/// A user's shopping cart.
///
/// Each book appears on at most one line. `version` increases on every
/// mutation and guards concurrent settlement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Cart {
    /// Unique cart identifier.
    pub id: CartId,
    /// The user owning this cart.
    pub owner_id: UserId,
    /// Lines in the cart.
    pub lines: Vec<CartLine>,
    /// Optimistic concurrency version.
    pub version: i64,
}

impl Cart {
    /// Create an empty cart.
    pub fn new(id: CartId, owner_id: UserId) -> Self {
        Self {
            id,
            owner_id,
            lines: Vec::new(),
            version: 0,
        }
    }

    /// Check that a book could be added with the given quantity.
    pub fn ensure_can_add(&self, book_id: BookId, quantity: i64) -> Result<()> {
        validate_quantity(quantity)?;
        if self.line_for_book(book_id).is_some() {
            return Err(CommerceError::ItemAlreadyInCart(book_id.to_string()));
        }
        Ok(())
    }

    /// Add a book on a new line.
    ///
    /// Returns an error if:
    /// - Quantity is not positive or exceeds MAX_QUANTITY_PER_ITEM
    /// - The book is already in the cart
    pub fn add_book(
        &mut self,
        line_id: CartLineId,
        book_id: BookId,
        quantity: i64,
    ) -> Result<&CartLine> {
        self.ensure_can_add(book_id, quantity)?;
        self.lines.push(CartLine {
            id: line_id,
            book_id,
            quantity,
        });
        self.version += 1;
        let index = self.lines.len() - 1;
        Ok(&self.lines[index])
    }

    /// Set the quantity of a line.
    pub fn update_quantity(&mut self, line_id: CartLineId, quantity: i64) -> Result<()> {
        validate_quantity(quantity)?;
        let line = self
            .lines
            .iter_mut()
            .find(|l| l.id == line_id)
            .ok_or_else(|| CommerceError::not_found("Cart line", line_id))?;
        line.quantity = quantity;
        self.version += 1;
        Ok(())
    }

    /// Remove a line from the cart.
    pub fn remove_line(&mut self, line_id: CartLineId) -> Result<CartLine> {
        let index = self
            .lines
            .iter()
            .position(|l| l.id == line_id)
            .ok_or_else(|| CommerceError::not_found("Cart line", line_id))?;
        self.version += 1;
        Ok(self.lines.remove(index))
    }

    /// Remove every line. The cart itself remains.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.version += 1;
    }

    /// Get total item count (sum of quantities).
    pub fn item_count(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Check if cart is empty.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Get a line by ID.
    pub fn line(&self, line_id: CartLineId) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.id == line_id)
    }

    /// Get the line holding a book.
    pub fn line_for_book(&self, book_id: BookId) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.book_id == book_id)
    }
}

/// A line in the cart.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CartLine {
    /// Unique line identifier.
    pub id: CartLineId,
    /// Book being purchased.
    pub book_id: BookId,
    /// Quantity, always positive.
    pub quantity: i64,
}

/// Quantities must be in `1..=MAX_QUANTITY_PER_ITEM`.
pub fn validate_quantity(quantity: i64) -> Result<()> {
    if quantity <= 0 {
        return Err(CommerceError::InvalidQuantity(quantity));
    }
    if quantity > MAX_QUANTITY_PER_ITEM {
        return Err(CommerceError::QuantityExceedsLimit(
            quantity,
            MAX_QUANTITY_PER_ITEM,
        ));
    }
    Ok(())
}
