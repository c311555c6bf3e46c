//! Book types.

use crate::error::{CommerceError, Result};
use crate::ids::{BookId, CategoryId};
use crate::money::Money;
use crate::search::Filterable;
use serde::{Deserialize, Serialize};

/// A book in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Book {
    /// Unique book identifier.
    pub id: BookId,
    pub title: String,
    pub author: String,
    /// ISBN (unique across the catalog).
    pub isbn: String,
    /// Current catalog price.
    pub price: Money,
    pub description: Option<String>,
    /// Cover image URL.
    pub cover_image: Option<String>,
    /// Categories this book is listed under.
    pub category_ids: Vec<CategoryId>,
}

impl Book {
    /// Materialize a book from its input once storage has assigned an id.
    pub fn from_new(id: BookId, new: NewBook) -> Self {
        Self {
            id,
            title: new.title,
            author: new.author,
            isbn: new.isbn,
            price: new.price,
            description: new.description,
            cover_image: new.cover_image,
            category_ids: new.category_ids,
        }
    }

    /// Whether the book is listed under a category.
    pub fn in_category(&self, category_id: CategoryId) -> bool {
        self.category_ids.contains(&category_id)
    }
}

impl Filterable for Book {
    fn field(&self, name: &str) -> Option<&str> {
        match name {
            "title" => Some(&self.title),
            "author" => Some(&self.author),
            "isbn" => Some(&self.isbn),
            _ => None,
        }
    }
}

/// Input for creating a book.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub price: Money,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub category_ids: Vec<CategoryId>,
}

impl NewBook {
    /// Create the input with the required fields.
    pub fn new(
        title: impl Into<String>,
        author: impl Into<String>,
        isbn: impl Into<String>,
        price: Money,
    ) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            isbn: isbn.into(),
            price,
            description: None,
            cover_image: None,
            category_ids: Vec::new(),
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// List the book under a category.
    pub fn in_category(mut self, category_id: CategoryId) -> Self {
        if !self.category_ids.contains(&category_id) {
            self.category_ids.push(category_id);
        }
        self
    }

    /// Check required fields and price.
    pub fn validate(&self) -> Result<()> {
        require_text("title", &self.title)?;
        require_text("author", &self.author)?;
        require_text("isbn", &self.isbn)?;
        require_price(&self.price)
    }
}

/// Partial update of a book. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BookUpdate {
    pub title: Option<String>,
    pub author: Option<String>,
    pub isbn: Option<String>,
    pub price: Option<Money>,
    pub description: Option<String>,
    pub cover_image: Option<String>,
    pub category_ids: Option<Vec<CategoryId>>,
}

impl BookUpdate {
    /// Whether the update changes nothing.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply onto a book, validating the changed fields first.
    ///
    /// The book is left untouched if validation fails.
    pub fn apply(self, book: &mut Book) -> Result<()> {
        if let Some(title) = &self.title {
            require_text("title", title)?;
        }
        if let Some(author) = &self.author {
            require_text("author", author)?;
        }
        if let Some(isbn) = &self.isbn {
            require_text("isbn", isbn)?;
        }
        if let Some(price) = &self.price {
            require_price(price)?;
        }

        if let Some(title) = self.title {
            book.title = title;
        }
        if let Some(author) = self.author {
            book.author = author;
        }
        if let Some(isbn) = self.isbn {
            book.isbn = isbn;
        }
        if let Some(price) = self.price {
            book.price = price;
        }
        if let Some(description) = self.description {
            book.description = Some(description);
        }
        if let Some(cover_image) = self.cover_image {
            book.cover_image = Some(cover_image);
        }
        if let Some(category_ids) = self.category_ids {
            book.category_ids = category_ids;
        }
        Ok(())
    }
}

fn require_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(CommerceError::Validation(format!("{field} must not be blank")));
    }
    Ok(())
}

fn require_price(price: &Money) -> Result<()> {
    if !price.is_positive() {
        return Err(CommerceError::Validation(format!(
            "price must be positive, got {price}"
        )));
    }
    Ok(())
}
