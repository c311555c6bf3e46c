mod common;

use bookstore_commerce::prelude::*;
use bookstore_db::Db;
use common::Services;
use std::path::PathBuf;

async fn services() -> Services<SqliteStore> {
    let store = SqliteStore::new(Db::open_in_memory().await.unwrap());
    store.migrate().await.unwrap();
    Services::new(store)
}

/// A database file that is removed again when dropped.
struct TempDb(PathBuf);

impl TempDb {
    fn new(name: &str) -> Self {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        Self(std::env::temp_dir().join(format!(
            "bookstore-{name}-{}-{nanos}.db",
            std::process::id()
        )))
    }

    fn url(&self) -> String {
        format!("sqlite://{}", self.0.display())
    }
}

impl Drop for TempDb {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm"] {
            let mut path = self.0.clone().into_os_string();
            path.push(suffix);
            let _ = std::fs::remove_file(path);
        }
    }
}

#[tokio::test]
async fn test_settlement() {
    common::settlement_scenario(&services().await).await;
}

#[tokio::test]
async fn test_empty_cart() {
    common::empty_cart_scenario(&services().await).await;
}

#[tokio::test]
async fn test_order_status() {
    common::status_scenario(&services().await).await;
}

#[tokio::test]
async fn test_paging_is_clamped() {
    common::paging_scenario(&services().await).await;
}

#[tokio::test]
async fn test_search() {
    common::search_scenario(&services().await).await;
}

#[tokio::test]
async fn test_concurrent_settlement_single_connection() {
    common::concurrent_settlement_scenario(&services().await).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_settlement_on_file() {
    let file = TempDb::new("concurrent");
    let store = SqliteStore::connect(&file.url()).await.unwrap();
    common::concurrent_settlement_scenario(&Services::new(store.clone())).await;
    store.db().close().await;
}

#[tokio::test]
async fn test_data_survives_reopen() {
    let file = TempDb::new("reopen");
    let order_id = {
        let store = SqliteStore::connect(&file.url()).await.unwrap();
        let services = Services::new(store.clone());
        services.seed_cart().await;
        let order = services
            .settlement
            .place_order(common::OWNER, "addr")
            .await
            .unwrap();
        store.db().close().await;
        order.id
    };

    let store = SqliteStore::connect(&file.url()).await.unwrap();
    let services = Services::new(store.clone());
    let order = services.settlement.get_order(order_id).await.unwrap();
    assert_eq!(order.total, common::usd("35.00"));
    store.db().close().await;
}
