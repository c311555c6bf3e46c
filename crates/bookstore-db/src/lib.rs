//! Type-safe SQLite database layer for the bookstore backend.
//!
//! Wraps an `sqlx` SQLite pool behind a small, ergonomic API with
//! serde-deserialized query results and explicit transactions.
//!
//! # Example
//!
//! ```rust,ignore
//! use bookstore_db::{Db, params};
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct BookRow {
//!     id: i64,
//!     title: String,
//!     price_cents: i64,
//! }
//!
//! let db = Db::open("sqlite:bookstore.db").await?;
//!
//! let mut tx = db.begin().await?;
//! tx.execute(
//!     "UPDATE books SET price_cents = ? WHERE id = ?",
//!     params![1299, 42]
//! ).await?;
//! tx.commit().await?;
//!
//! let books: Vec<BookRow> = db.query_as(
//!     "SELECT id, title, price_cents FROM books WHERE price_cents < ?",
//!     params![2000]
//! ).await?;
//! ```

mod db;
mod error;
mod types;

pub use db::{Db, Tx};
pub use error::DbError;
pub use types::{QueryResult, Row, Value};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{params, Db, DbError, QueryResult, Row, Tx, Value};
}

/// Create a parameter list for SQL queries.
///
/// # Example
///
/// ```rust,ignore
/// use bookstore_db::params;
///
/// let params = params!["Dune", 42, 9.99];
/// ```
#[macro_export]
macro_rules! params {
    () => {
        &[]
    };
    ($($param:expr),+ $(,)?) => {
        &[$($crate::Value::from($param)),+]
    };
}
