//! Storefront lifecycle integration tests.
//!
//! These tests run the core components over a SQLite-backed durable store:
//! - Response cache, cart and session survive a restart
//! - Live source failures are answered from the mock catalog
//! - Homepage snapshot reuse across restarts

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use bytebooks_core::{
    cache::DEFAULT_CACHE_TTL,
    catalog::SourceError,
    testing::{fixtures, MockBookSource},
    AuthStore, CartItem, CartStore, CatalogClient, DemoVerifier, HomeFeed, KeyValueStore,
    Provenance, RateLimiter, ResponseCache, SqliteStore,
};

/// One "process": every component opened over the same database file.
struct Storefront {
    store: Arc<SqliteStore>,
    catalog: Arc<CatalogClient>,
    cart: CartStore,
    auth: AuthStore,
}

impl Storefront {
    fn open(db_path: &Path, source: Arc<MockBookSource>) -> Self {
        let store = Arc::new(SqliteStore::new(db_path).expect("Failed to open store"));
        let cache = Arc::new(ResponseCache::new(
            Arc::clone(&store) as Arc<dyn KeyValueStore>,
            DEFAULT_CACHE_TTL,
        ));
        let catalog = Arc::new(CatalogClient::new(
            source,
            cache,
            RateLimiter::new(Duration::from_millis(5)),
        ));
        let cart = CartStore::new(Arc::clone(&store) as Arc<dyn KeyValueStore>);
        let auth = AuthStore::new(
            Box::new(DemoVerifier::new(&Default::default())),
            Arc::clone(&store) as Arc<dyn KeyValueStore>,
        );

        Self {
            store,
            catalog,
            cart,
            auth,
        }
    }
}

async fn stocked_source() -> Arc<MockBookSource> {
    let source = Arc::new(MockBookSource::new());
    source
        .set_docs(vec![
            fixtures::open_library_doc("Dune", "Frank Herbert", 101),
            fixtures::open_library_doc("Emma", "Jane Austen", 102),
        ])
        .await;
    source
}

#[tokio::test]
async fn test_state_survives_restart() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("bytebooks.db");
    let source = stocked_source().await;

    {
        let shop = Storefront::open(&db_path, source.clone());
        let page = shop.catalog.search("dune", 0, 10).await;
        assert_eq!(page.provenance, Provenance::Live);

        let book = &page.data.books[0];
        shop.cart.add_item(CartItem::from(book), Some(2));
        shop.auth.login("demo@example.com", "password").unwrap();
    }

    let shop = Storefront::open(&db_path, source.clone());

    // Served from the restored response cache, no new source query
    let page = shop.catalog.search("dune", 0, 10).await;
    assert!(page.from_cache);
    assert_eq!(source.query_count().await, 1);

    assert_eq!(shop.cart.total_items(), 2);
    assert_eq!(shop.cart.items()[0].title, "Dune");
    assert_eq!(
        shop.auth.current_user().map(|u| u.email),
        Some("demo@example.com".to_string())
    );
}

#[tokio::test]
async fn test_source_outage_uses_mock_catalog() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let source = stocked_source().await;
    source.set_failing(true).await;
    let shop = Storefront::open(&temp_dir.path().join("bytebooks.db"), source.clone());

    let listing = shop.catalog.list_all(0, 8).await;
    assert!(listing.is_fallback());
    assert_eq!(listing.data.books.len(), 8);

    let sections = shop.catalog.by_categories(&["kids", "art"]).await;
    assert!(sections.values().all(|s| s.is_fallback()));
    assert_eq!(sections["art"].data.len(), 4);

    source.set_failing(false).await;
    source
        .set_next_error(SourceError::NotFound("gone".to_string()))
        .await;
    let detail = shop.catalog.by_key("/works/OL101W").await;
    assert!(detail.is_fallback());
    assert_eq!(detail.data.title, "Book Details");
}

#[tokio::test]
async fn test_home_snapshot_reused_after_restart() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("bytebooks.db");
    let source = Arc::new(MockBookSource::new());

    let first = {
        let shop = Storefront::open(&db_path, source.clone());
        HomeFeed::new(shop.catalog.clone(), shop.store.clone()).load().await
    };
    let queries = source.query_count().await;

    let shop = Storefront::open(&db_path, source.clone());
    let second = HomeFeed::new(shop.catalog.clone(), shop.store.clone())
        .load()
        .await;

    assert_eq!(second, first);
    assert_eq!(source.query_count().await, queries);
}
