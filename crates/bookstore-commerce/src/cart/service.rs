//! Cart service: the per-user shopping cart.

use crate::cart::{validate_quantity, Cart};
use crate::error::{CommerceError, Result};
use crate::ids::{BookId, CartLineId, UserId};
use crate::store::{CartRepository, CatalogRepository, Store, Transaction};
use crate::views::CartView;

/// Cart operations over a [`Store`].
#[derive(Debug, Clone)]
pub struct CartService<S> {
    store: S,
}

impl<S: Store> CartService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The user's cart.
    #[tracing::instrument(skip(self))]
    pub async fn get_cart(&self, owner_id: UserId) -> Result<CartView> {
        let mut tx = self.store.begin().await?;
        Ok(find_cart(&mut tx, owner_id).await?.into())
    }

    /// Put a book in the user's cart, creating the cart on first use.
    #[tracing::instrument(skip(self))]
    pub async fn add_book(
        &self,
        owner_id: UserId,
        book_id: BookId,
        quantity: i64,
    ) -> Result<CartView> {
        validate_quantity(quantity)?;
        let mut tx = self.store.begin().await?;
        if tx.find_book(book_id).await?.is_none() {
            return Err(CommerceError::not_found("Book", book_id));
        }

        let cart = match tx.find_cart_by_owner(owner_id).await? {
            Some(cart) => cart,
            None => {
                let cart = tx.create_cart(owner_id).await?;
                tracing::debug!(cart_id = %cart.id, "cart created");
                cart
            }
        };
        cart.ensure_can_add(book_id, quantity)?;
        let line = tx.add_cart_line(cart.id, book_id, quantity).await?;

        let cart = find_cart(&mut tx, owner_id).await?;
        tx.commit().await?;
        tracing::info!(cart_id = %cart.id, line_id = %line.id, "book added to cart");
        Ok(cart.into())
    }

    #[tracing::instrument(skip(self))]
    pub async fn update_line_quantity(
        &self,
        owner_id: UserId,
        line_id: CartLineId,
        quantity: i64,
    ) -> Result<CartView> {
        validate_quantity(quantity)?;
        let mut tx = self.store.begin().await?;
        let cart = find_cart(&mut tx, owner_id).await?;
        if !tx.update_cart_line(cart.id, line_id, quantity).await? {
            return Err(CommerceError::not_found("Cart line", line_id));
        }

        let cart = find_cart(&mut tx, owner_id).await?;
        tx.commit().await?;
        Ok(cart.into())
    }

    #[tracing::instrument(skip(self))]
    pub async fn remove_line(&self, owner_id: UserId, line_id: CartLineId) -> Result<CartView> {
        let mut tx = self.store.begin().await?;
        let cart = find_cart(&mut tx, owner_id).await?;
        if !tx.remove_cart_line(cart.id, line_id).await? {
            return Err(CommerceError::not_found("Cart line", line_id));
        }

        let cart = find_cart(&mut tx, owner_id).await?;
        tx.commit().await?;
        Ok(cart.into())
    }
}

async fn find_cart<R: CartRepository>(repo: &mut R, owner_id: UserId) -> Result<Cart> {
    repo.find_cart_by_owner(owner_id)
        .await?
        .ok_or_else(|| CommerceError::not_found("Cart for user", owner_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::NewBook;
    use crate::error::ErrorKind;
    use crate::money::{Currency, Money};
    use crate::store::MemoryStore;

    async fn seeded() -> (CartService<MemoryStore>, BookId, BookId) {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let a = tx
            .insert_book(NewBook::new("Dune", "Herbert", "1", Money::new(1000, Currency::USD)))
            .await
            .unwrap();
        let b = tx
            .insert_book(NewBook::new("Emma", "Austen", "2", Money::new(500, Currency::USD)))
            .await
            .unwrap();
        tx.commit().await.unwrap();
        (CartService::new(store), a.id, b.id)
    }

    #[tokio::test]
    async fn test_missing_cart_is_not_found() {
        let (carts, _, _) = seeded().await;
        let err = carts.get_cart(UserId::new(1)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_add_book_creates_cart() {
        let (carts, a, b) = seeded().await;
        carts.add_book(UserId::new(1), a, 3).await.unwrap();
        let cart = carts.add_book(UserId::new(1), b, 1).await.unwrap();

        assert_eq!(cart.lines.len(), 2);
        assert_eq!(cart.item_count, 4);
        assert_eq!(carts.get_cart(UserId::new(1)).await.unwrap(), cart);
    }

    #[tokio::test]
    async fn test_add_duplicate_book_rejected() {
        let (carts, a, _) = seeded().await;
        carts.add_book(UserId::new(1), a, 1).await.unwrap();
        let err = carts.add_book(UserId::new(1), a, 2).await.unwrap_err();

        assert!(matches!(err, CommerceError::ItemAlreadyInCart(_)));
        assert_eq!(carts.get_cart(UserId::new(1)).await.unwrap().item_count, 1);
    }

    #[tokio::test]
    async fn test_add_unknown_book_or_bad_quantity() {
        let (carts, a, _) = seeded().await;
        let err = carts.add_book(UserId::new(1), BookId::new(404), 1).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = carts.add_book(UserId::new(1), a, 0).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        // nothing was written
        assert!(carts.get_cart(UserId::new(1)).await.is_err());
    }

    #[tokio::test]
    async fn test_update_and_remove_line() {
        let (carts, a, _) = seeded().await;
        let cart = carts.add_book(UserId::new(1), a, 1).await.unwrap();
        let line_id = cart.lines[0].id;

        let cart = carts.update_line_quantity(UserId::new(1), line_id, 7).await.unwrap();
        assert_eq!(cart.item_count, 7);

        let cart = carts.remove_line(UserId::new(1), line_id).await.unwrap();
        assert!(cart.lines.is_empty());

        let err = carts.remove_line(UserId::new(1), line_id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
