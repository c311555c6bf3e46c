//! Catalog service: book and category CRUD, and book search.

use crate::catalog::{Book, BookUpdate, Category, NewBook, NewCategory};
use crate::error::{CommerceError, Result};
use crate::ids::{BookId, CategoryId};
use crate::search::{Page, PredicateRegistry, SearchCriteria, SpecificationBuilder};
use crate::store::{CatalogRepository, Store, Transaction};
use crate::views::{BookView, CategoryView};
use std::sync::Arc;

/// Book and category operations over a [`Store`].
#[derive(Debug, Clone)]
pub struct CatalogService<S> {
    store: S,
    registry: Arc<PredicateRegistry>,
}

impl<S: Store> CatalogService<S> {
    pub fn new(store: S, registry: Arc<PredicateRegistry>) -> Self {
        Self { store, registry }
    }

    #[tracing::instrument(skip(self, book), fields(title = %book.title))]
    pub async fn create_book(&self, book: NewBook) -> Result<BookView> {
        book.validate()?;
        let mut tx = self.store.begin().await?;
        ensure_categories(&mut tx, &book.category_ids).await?;
        let book = tx.insert_book(book).await?;
        tx.commit().await?;

        tracing::info!(book_id = %book.id, "book created");
        Ok(book.into())
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_book(&self, id: BookId) -> Result<BookView> {
        let mut tx = self.store.begin().await?;
        let book = find_book(&mut tx, id).await?;
        Ok(book.into())
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_books(&self, page: Page) -> Result<Vec<BookView>> {
        self.search_books(&SearchCriteria::new(), page).await
    }

    #[tracing::instrument(skip(self, update))]
    pub async fn update_book(&self, id: BookId, update: BookUpdate) -> Result<BookView> {
        let mut tx = self.store.begin().await?;
        let mut book = find_book(&mut tx, id).await?;
        if let Some(category_ids) = &update.category_ids {
            ensure_categories(&mut tx, category_ids).await?;
        }
        update.apply(&mut book)?;
        if !tx.update_book(&book).await? {
            return Err(CommerceError::not_found("Book", id));
        }
        tx.commit().await?;

        tracing::info!(book_id = %id, "book updated");
        Ok(book.into())
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_book(&self, id: BookId) -> Result<()> {
        let mut tx = self.store.begin().await?;
        if !tx.delete_book(id).await? {
            return Err(CommerceError::not_found("Book", id));
        }
        tx.commit().await?;
        tracing::info!(book_id = %id, "book deleted");
        Ok(())
    }

    /// Books matching every constrained attribute of the criteria.
    #[tracing::instrument(skip(self))]
    pub async fn search_books(
        &self,
        criteria: &SearchCriteria,
        page: Page,
    ) -> Result<Vec<BookView>> {
        let predicate = SpecificationBuilder::new(&self.registry).build(criteria)?;
        let mut tx = self.store.begin().await?;
        let books = tx.search_books(&predicate, page).await?;
        tracing::debug!(found = books.len(), "search complete");
        Ok(books.into_iter().map(BookView::from).collect())
    }

    #[tracing::instrument(skip(self))]
    pub async fn books_in_category(&self, category_id: CategoryId) -> Result<Vec<BookView>> {
        let mut tx = self.store.begin().await?;
        find_category(&mut tx, category_id).await?;
        let books = tx.books_in_category(category_id).await?;
        Ok(books.into_iter().map(BookView::from).collect())
    }

    #[tracing::instrument(skip(self, category), fields(name = %category.name))]
    pub async fn create_category(&self, category: NewCategory) -> Result<CategoryView> {
        category.validate()?;
        let mut tx = self.store.begin().await?;
        let category = tx.insert_category(category).await?;
        tx.commit().await?;

        tracing::info!(category_id = %category.id, "category created");
        Ok(category.into())
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_category(&self, id: CategoryId) -> Result<CategoryView> {
        let mut tx = self.store.begin().await?;
        Ok(find_category(&mut tx, id).await?.into())
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_categories(&self, page: Page) -> Result<Vec<CategoryView>> {
        let mut tx = self.store.begin().await?;
        let categories = tx.list_categories(page).await?;
        Ok(categories.into_iter().map(CategoryView::from).collect())
    }

    /// Replace a category's name and description.
    #[tracing::instrument(skip(self, category))]
    pub async fn update_category(
        &self,
        id: CategoryId,
        category: NewCategory,
    ) -> Result<CategoryView> {
        category.validate()?;
        let mut tx = self.store.begin().await?;
        let category = Category::from_new(id, category);
        if !tx.update_category(&category).await? {
            return Err(CommerceError::not_found("Category", id));
        }
        tx.commit().await?;
        Ok(category.into())
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_category(&self, id: CategoryId) -> Result<()> {
        let mut tx = self.store.begin().await?;
        if !tx.delete_category(id).await? {
            return Err(CommerceError::not_found("Category", id));
        }
        tx.commit().await?;
        tracing::info!(category_id = %id, "category deleted");
        Ok(())
    }
}

async fn find_book<R: CatalogRepository>(repo: &mut R, id: BookId) -> Result<Book> {
    repo.find_book(id)
        .await?
        .ok_or_else(|| CommerceError::not_found("Book", id))
}

async fn find_category<R: CatalogRepository>(repo: &mut R, id: CategoryId) -> Result<Category> {
    repo.find_category(id)
        .await?
        .ok_or_else(|| CommerceError::not_found("Category", id))
}

async fn ensure_categories<R: CatalogRepository>(repo: &mut R, ids: &[CategoryId]) -> Result<()> {
    for id in ids {
        find_category(repo, *id).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::money::{Currency, Money};
    use crate::store::MemoryStore;

    fn service() -> CatalogService<MemoryStore> {
        CatalogService::new(
            MemoryStore::new(),
            Arc::new(PredicateRegistry::for_books().unwrap()),
        )
    }

    fn usd(cents: i64) -> Money {
        Money::new(cents, Currency::USD)
    }

    #[tokio::test]
    async fn test_create_and_get_book() {
        let catalog = service();
        let created = catalog
            .create_book(NewBook::new("Dune", "Herbert", "978-0441013593", usd(1000)))
            .await
            .unwrap();

        let fetched = catalog.get_book(created.id).await.unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_create_book_with_unknown_category() {
        let catalog = service();
        let err = catalog
            .create_book(NewBook::new("Dune", "Herbert", "1", usd(1000)).in_category(CategoryId::new(99)))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_update_and_delete_book() {
        let catalog = service();
        let book = catalog
            .create_book(NewBook::new("Dune", "Herbert", "1", usd(1000)))
            .await
            .unwrap();

        let updated = catalog
            .update_book(
                book.id,
                BookUpdate {
                    price: Some(usd(1200)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.price, usd(1200));

        catalog.delete_book(book.id).await.unwrap();
        assert_eq!(
            catalog.get_book(book.id).await.unwrap_err().kind(),
            ErrorKind::NotFound
        );
        assert!(catalog.delete_book(book.id).await.is_err());
    }

    #[tokio::test]
    async fn test_search_books() {
        let catalog = service();
        for (title, author) in [("Dune", "Herbert"), ("Emma", "Austen"), ("Persuasion", "Austen")] {
            catalog
                .create_book(NewBook::new(title, author, title, usd(500)))
                .await
                .unwrap();
        }

        let criteria = SearchCriteria::new().with("author", ["Austen"]);
        let found = catalog.search_books(&criteria, Page::default()).await.unwrap();
        assert_eq!(found.len(), 2);

        let everything = catalog.list_books(Page::default()).await.unwrap();
        assert_eq!(everything.len(), 3);

        let unknown = SearchCriteria::new().with("publisher", ["Ace"]);
        let err = catalog.search_books(&unknown, Page::default()).await.unwrap_err();
        assert!(matches!(err, CommerceError::UnknownFilterField(_)));
    }

    #[tokio::test]
    async fn test_category_crud_and_listing() {
        let catalog = service();
        let scifi = catalog
            .create_category(NewCategory::new("Science Fiction"))
            .await
            .unwrap();
        catalog
            .create_book(NewBook::new("Dune", "Herbert", "1", usd(1000)).in_category(scifi.id))
            .await
            .unwrap();

        assert_eq!(catalog.books_in_category(scifi.id).await.unwrap().len(), 1);

        let renamed = catalog
            .update_category(scifi.id, NewCategory::new("SF"))
            .await
            .unwrap();
        assert_eq!(renamed.name, "SF");
        assert_eq!(catalog.list_categories(Page::default()).await.unwrap().len(), 1);

        catalog.delete_category(scifi.id).await.unwrap();
        assert!(catalog.get_category(scifi.id).await.is_err());
        assert!(catalog.books_in_category(scifi.id).await.is_err());
    }

    #[tokio::test]
    async fn test_blank_category_rejected() {
        let catalog = service();
        let err = catalog.create_category(NewCategory::new("")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
}
