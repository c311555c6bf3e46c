//! Category types for organizing books.

use crate::error::{CommerceError, Result};
use crate::ids::CategoryId;
use serde::{Deserialize, Serialize};

/// A book category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    /// Unique category identifier.
    pub id: CategoryId,
    /// Category name.
    pub name: String,
    /// Category description.
    pub description: Option<String>,
}

impl Category {
    /// Materialize a category once storage has assigned an id.
    pub fn from_new(id: CategoryId, new: NewCategory) -> Self {
        Self {
            id,
            name: new.name,
            description: new.description,
        }
    }
}

/// Input for creating or replacing a category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewCategory {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl NewCategory {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Names must not be blank.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(CommerceError::Validation(
                "category name must not be blank".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_from_new() {
        let category = Category::from_new(
            CategoryId::new(4),
            NewCategory::new("Science Fiction").with_description("Spaceships"),
        );
        assert_eq!(category.id, CategoryId::new(4));
        assert_eq!(category.name, "Science Fiction");
        assert_eq!(category.description.as_deref(), Some("Spaceships"));
    }

    #[test]
    fn test_blank_name_rejected() {
        assert!(NewCategory::new("  ").validate().is_err());
        assert!(NewCategory::new("Poetry").validate().is_ok());
    }
}
