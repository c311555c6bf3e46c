//! Book catalog module.
//!
//! Contains types for books and categories, and the catalog service.

mod book;
mod category;
mod service;

pub use book::{Book, BookUpdate, NewBook};
pub use category::{Category, NewCategory};
pub use service::CatalogService;
