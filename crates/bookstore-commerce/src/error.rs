//! Commerce error types.

use thiserror::Error;

/// Errors that can occur in bookstore operations.
#[derive(Error, Debug)]
pub enum CommerceError {
    /// Input failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Search criteria named an attribute with no registered provider.
    #[error("Unknown filter field: {0}")]
    UnknownFilterField(String),

    /// Two providers were registered under the same attribute name.
    #[error("Duplicate filter field: {0}")]
    DuplicateFilterField(String),

    /// An entity could not be found.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Checkout was attempted on a cart without lines.
    #[error("Cart {0} is empty")]
    EmptyCart(String),

    /// A concurrent writer changed the same data first.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The book is already in the cart.
    #[error("Book {0} is already in the cart")]
    ItemAlreadyInCart(String),

    /// Invalid quantity.
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(i64),

    /// Quantity exceeds maximum allowed.
    #[error("Quantity {0} exceeds maximum allowed ({1})")]
    QuantityExceedsLimit(i64, i64),

    /// Arithmetic overflow.
    #[error("Arithmetic overflow in money calculation")]
    Overflow,

    /// Currency mismatch.
    #[error("Currency mismatch: expected {expected}, got {got}")]
    CurrencyMismatch { expected: String, got: String },

    /// Storage or I/O failure.
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Coarse classification of a [`CommerceError`] for callers mapping errors
/// to responses or exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    NotFound,
    EmptyCart,
    Conflict,
    Infrastructure,
}

impl CommerceError {
    /// Shorthand for a [`CommerceError::NotFound`].
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        CommerceError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CommerceError::Validation(_)
            | CommerceError::UnknownFilterField(_)
            | CommerceError::DuplicateFilterField(_)
            | CommerceError::ItemAlreadyInCart(_)
            | CommerceError::InvalidQuantity(_)
            | CommerceError::QuantityExceedsLimit(..)
            | CommerceError::Overflow
            | CommerceError::CurrencyMismatch { .. } => ErrorKind::Validation,
            CommerceError::NotFound { .. } => ErrorKind::NotFound,
            CommerceError::EmptyCart(_) => ErrorKind::EmptyCart,
            CommerceError::Conflict(_) => ErrorKind::Conflict,
            CommerceError::Storage(_) => ErrorKind::Infrastructure,
        }
    }
}

#[cfg(feature = "storage")]
impl From<bookstore_db::DbError> for CommerceError {
    fn from(e: bookstore_db::DbError) -> Self {
        if e.is_busy() {
            CommerceError::Conflict(e.to_string())
        } else {
            CommerceError::Storage(e.to_string())
        }
    }
}

impl From<serde_json::Error> for CommerceError {
    fn from(e: serde_json::Error) -> Self {
        CommerceError::Storage(format!("serialization: {e}"))
    }
}

/// Result alias for commerce operations.
pub type Result<T, E = CommerceError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        assert_eq!(
            CommerceError::UnknownFilterField("genre".into()).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            CommerceError::ItemAlreadyInCart("1".into()).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            CommerceError::not_found("Order", 7).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(CommerceError::EmptyCart("3".into()).kind(), ErrorKind::EmptyCart);
        assert_eq!(
            CommerceError::Storage("disk".into()).kind(),
            ErrorKind::Infrastructure
        );
    }

    #[test]
    fn test_not_found_message() {
        let err = CommerceError::not_found("Book", 42);
        assert_eq!(err.to_string(), "Book not found: 42");
    }

    #[cfg(feature = "storage")]
    #[test]
    fn test_busy_db_error_maps_to_conflict() {
        let err: CommerceError = bookstore_db::DbError::Busy("locked".into()).into();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        let err: CommerceError = bookstore_db::DbError::QueryError("syntax".into()).into();
        assert_eq!(err.kind(), ErrorKind::Infrastructure);
    }
}
