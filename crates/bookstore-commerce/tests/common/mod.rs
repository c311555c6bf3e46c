//! Scenarios run against every store backend.

#![allow(dead_code)]

use bookstore_commerce::prelude::*;
use bookstore_commerce::store::{CartRepository, CatalogRepository, OrderRepository};
use std::sync::Arc;

pub const OWNER: UserId = UserId::new(1);

pub fn usd(text: &str) -> Money {
    Money::parse(text, Currency::USD).unwrap()
}

pub struct Services<S> {
    pub store: S,
    pub catalog: CatalogService<S>,
    pub carts: CartService<S>,
    pub settlement: CartSettlementService<S>,
}

impl<S: Store + Clone> Services<S> {
    pub fn new(store: S) -> Self {
        let registry = Arc::new(PredicateRegistry::for_books().unwrap());
        Self {
            catalog: CatalogService::new(store.clone(), registry),
            carts: CartService::new(store.clone()),
            settlement: CartSettlementService::new(store.clone()),
            store,
        }
    }

    /// Books A @ 10.00 and B @ 5.00; the owner's cart holds 3 x A and 1 x B.
    pub async fn seed_cart(&self) -> (BookId, BookId) {
        let a = self
            .catalog
            .create_book(NewBook::new("A", "Author A", "isbn-a", usd("10.00")))
            .await
            .unwrap();
        let b = self
            .catalog
            .create_book(NewBook::new("B", "Author B", "isbn-b", usd("5.00")))
            .await
            .unwrap();
        self.carts.add_book(OWNER, a.id, 3).await.unwrap();
        self.carts.add_book(OWNER, b.id, 1).await.unwrap();
        (a.id, b.id)
    }

    /// The owner's cart as stored, version included.
    pub async fn stored_cart(&self) -> Option<Cart> {
        let mut tx = self.store.begin().await.unwrap();
        tx.find_cart_by_owner(OWNER).await.unwrap()
    }

    pub async fn stored_order(&self, id: OrderId) -> Order {
        let mut tx = self.store.begin().await.unwrap();
        tx.find_order(id).await.unwrap().unwrap()
    }

    pub async fn cart_lines(&self) -> usize {
        let mut tx = self.store.begin().await.unwrap();
        tx.find_cart_by_owner(OWNER)
            .await
            .unwrap()
            .map(|cart| cart.lines.len())
            .unwrap_or(0)
    }
}

pub async fn settlement_scenario<S: Store + Clone>(services: &Services<S>) {
    let (a, b) = services.seed_cart().await;

    let order = services
        .settlement
        .place_order(OWNER, "221B Baker Street")
        .await
        .unwrap();

    assert_eq!(order.total, usd("35.00"));
    assert_eq!(order.status, OrderStatus::Accepted);
    assert_eq!(order.lines.len(), 2);
    let line_a = order.lines.iter().find(|l| l.book_id == a).unwrap();
    let line_b = order.lines.iter().find(|l| l.book_id == b).unwrap();
    assert_eq!((line_a.quantity, line_a.unit_price), (3, usd("10.00")));
    assert_eq!((line_b.quantity, line_b.unit_price), (1, usd("5.00")));
    assert_eq!(services.cart_lines().await, 0);
    assert!(services.stored_order(order.id).await.is_consistent());

    // later price changes do not touch the order
    services
        .catalog
        .update_book(
            a,
            BookUpdate {
                price: Some(usd("12.50")),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let stored = services.settlement.get_order(order.id).await.unwrap();
    assert_eq!(stored.total, usd("35.00"));
    let line_a = stored.lines.iter().find(|l| l.book_id == a).unwrap();
    assert_eq!(line_a.unit_price, usd("10.00"));
    assert!(services.stored_order(order.id).await.is_consistent());

    let history = services
        .settlement
        .order_history(OWNER, Page::default())
        .await
        .unwrap();
    assert_eq!(history, vec![stored]);
}

pub async fn empty_cart_scenario<S: Store + Clone>(services: &Services<S>) {
    let (a, _) = services.seed_cart().await;
    let cart = services.carts.get_cart(OWNER).await.unwrap();
    for line in &cart.lines {
        services.carts.remove_line(OWNER, line.id).await.unwrap();
    }
    let before = services.stored_cart().await.unwrap();

    let err = services
        .settlement
        .place_order(OWNER, "addr")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::EmptyCart);
    assert_eq!(services.stored_cart().await.unwrap(), before);
    assert!(services
        .settlement
        .order_history(OWNER, Page::default())
        .await
        .unwrap()
        .is_empty());

    // the cart is still usable
    services.carts.add_book(OWNER, a, 1).await.unwrap();
    assert_eq!(services.cart_lines().await, 1);
}

pub async fn status_scenario<S: Store + Clone>(services: &Services<S>) {
    services.seed_cart().await;
    let order = services.settlement.place_order(OWNER, "addr").await.unwrap();

    for status in OrderStatus::ALL {
        let updated = services
            .settlement
            .update_order_status(order.id, &status.as_str().to_lowercase())
            .await
            .unwrap();
        assert_eq!(updated.status, status);
    }

    let err = services
        .settlement
        .update_order_status(order.id, "shipped")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    let unchanged = services.settlement.get_order(order.id).await.unwrap();
    assert_eq!(unchanged.status, OrderStatus::Completed);
}

pub async fn search_scenario<S: Store + Clone>(services: &Services<S>) {
    let books = [
        ("Dune", "Frank Herbert", "978-0441013593"),
        ("Children of Dune", "Frank Herbert", "978-0593098240"),
        ("Emma", "Jane Austen", "978-0141439587"),
        ("Persuasion", "Jane Austen", "978-0141439686"),
    ];
    for (title, author, isbn) in books {
        services
            .catalog
            .create_book(NewBook::new(title, author, isbn, usd("9.99")))
            .await
            .unwrap();
    }

    let titles = |found: Vec<BookView>| found.into_iter().map(|b| b.title).collect::<Vec<_>>();

    let all = services
        .catalog
        .search_books(&SearchCriteria::new(), Page::default())
        .await
        .unwrap();
    assert_eq!(all.len(), 4);

    let herbert = SearchCriteria::new().with("author", ["Frank Herbert"]);
    let found = services.catalog.search_books(&herbert, Page::default()).await.unwrap();
    assert_eq!(titles(found), vec!["Dune", "Children of Dune"]);

    let either = SearchCriteria::new().with("title", ["Dune", "Emma"]);
    let found = services.catalog.search_books(&either, Page::default()).await.unwrap();
    assert_eq!(titles(found), vec!["Dune", "Emma"]);

    let both = SearchCriteria::new()
        .with("title", ["Dune", "Emma"])
        .with("author", ["Jane Austen"]);
    let found = services.catalog.search_books(&both, Page::default()).await.unwrap();
    assert_eq!(titles(found), vec!["Emma"]);

    let none = SearchCriteria::new().with("isbn", ["000"]);
    assert!(services
        .catalog
        .search_books(&none, Page::default())
        .await
        .unwrap()
        .is_empty());

    // deserialized criteria behave like built ones
    let parsed: SearchCriteria =
        serde_json::from_str(r#"{"title": [" Dune ", ""], "isbn": [""]}"#).unwrap();
    assert_eq!(parsed, SearchCriteria::new().with("title", [" Dune ", ""]).with("isbn", [""]));
    let found = services.catalog.search_books(&parsed, Page::default()).await.unwrap();
    assert_eq!(titles(found), vec!["Dune"]);

    let blank: SearchCriteria = serde_json::from_str(r#"{"title": [""]}"#).unwrap();
    assert!(blank.is_unconstrained());
    let found = services.catalog.search_books(&blank, Page::default()).await.unwrap();
    assert_eq!(found.len(), 4);

    let err = services
        .catalog
        .search_books(&SearchCriteria::new().with("genre", ["sf"]), Page::default())
        .await
        .unwrap_err();
    assert!(matches!(err, CommerceError::UnknownFilterField(_)));
}

pub async fn concurrent_settlement_scenario<S: Store + Clone>(services: &Services<S>) {
    services.seed_cart().await;

    let (first, second) = tokio::join!(
        services.settlement.place_order(OWNER, "addr"),
        services.settlement.place_order(OWNER, "addr"),
    );

    let outcomes = [first, second];
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    let loser = outcomes.into_iter().find_map(Result::err).unwrap();
    assert!(
        matches!(loser.kind(), ErrorKind::EmptyCart | ErrorKind::Conflict),
        "unexpected error: {loser}"
    );

    let history = services
        .settlement
        .order_history(OWNER, Page::default())
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(services.cart_lines().await, 0);
}

/// Out-of-range paging from a caller is clamped identically on every backend.
pub async fn paging_scenario<S: Store + Clone>(services: &Services<S>) {
    insert_books(&services.store, &["a", "b", "c"]).await;

    let page: Page = serde_json::from_str(r#"{"page": 0, "per_page": -1}"#).unwrap();
    let found = services.catalog.list_books(page).await.unwrap();
    let titles: Vec<_> = found.into_iter().map(|b| b.title).collect();
    assert_eq!(titles, vec!["a"]);

    let page: Page = serde_json::from_str(&format!(r#"{{"page": {}}}"#, i64::MIN)).unwrap();
    assert_eq!(services.catalog.list_books(page).await.unwrap().len(), 3);
}

/// Seed books directly through a transaction, bypassing services.
pub async fn insert_books<S: Store>(store: &S, titles: &[&str]) -> Vec<Book> {
    let mut tx = store.begin().await.unwrap();
    let mut books = Vec::new();
    for title in titles {
        books.push(
            tx.insert_book(NewBook::new(*title, "Anon", *title, usd("1.00")))
                .await
                .unwrap(),
        );
    }
    tx.commit().await.unwrap();
    books
}
