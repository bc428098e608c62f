//! Catalog client: cache, rate limiter, live source and mock fallback.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use super::mock::MockCatalog;
use super::normalize::Normalizer;
use super::records::{RawPage, SourceRecord};
use super::{BookSource, CatalogError, SourceError};
use crate::book::{Book, BookPage, Sourced};
use crate::cache::{cache_key, ResponseCache};
use crate::config::CatalogConfig;
use crate::metrics::{CATALOG_FALLBACKS, SOURCE_REQUESTS, SOURCE_REQUEST_DURATION};
use crate::rate_limiter::RateLimiter;
use crate::store::KeyValueStore;

/// Books fetched per category for homepage sections.
pub const CATEGORY_BATCH_SIZE: u32 = 4;

/// Why the live path did not produce a result.
enum Miss {
    Disabled,
    Empty,
    Failed(SourceError),
}

impl Miss {
    fn reason(&self) -> &'static str {
        match self {
            Miss::Disabled => "disabled",
            Miss::Empty => "empty",
            Miss::Failed(_) => "error",
        }
    }
}

/// Catalog client.
///
/// Every operation returns a [`Sourced`] value: `Live` when the answer came
/// from the live source (directly or via the response cache), `Fallback` when
/// the mock catalog answered instead. Pages are 0-based.
pub struct CatalogClient {
    source: Arc<dyn BookSource>,
    mock: Arc<MockCatalog>,
    cache: Arc<ResponseCache>,
    limiter: RateLimiter,
    normalizer: Normalizer,
    use_mock_data: bool,
}

impl CatalogClient {
    /// Create a client over a live source.
    pub fn new(source: Arc<dyn BookSource>, cache: Arc<ResponseCache>, limiter: RateLimiter) -> Self {
        Self {
            source,
            mock: Arc::new(MockCatalog::new()),
            cache,
            limiter,
            normalizer: Normalizer::default(),
            use_mock_data: false,
        }
    }

    /// Build the cache and rate limiter from configuration.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn from_config(
        config: &CatalogConfig,
        source: Arc<dyn BookSource>,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        let cache = Arc::new(ResponseCache::new(
            store,
            Duration::from_secs(config.cache_ttl_secs),
        ));
        let limiter = RateLimiter::new(Duration::from_millis(config.rate_limit_ms));

        Self::new(source, cache, limiter)
            .with_normalizer(Normalizer::new(&config.covers_url))
            .with_mock_data_only(config.use_mock_data)
    }

    pub fn with_normalizer(mut self, normalizer: Normalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    /// Answer every operation from the mock catalog without touching the source.
    pub fn with_mock_data_only(mut self, enabled: bool) -> Self {
        self.use_mock_data = enabled;
        self
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    pub fn uses_mock_data(&self) -> bool {
        self.use_mock_data
    }

    pub fn mock(&self) -> &MockCatalog {
        &self.mock
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    /// Featured listing.
    ///
    /// The live trending feed only has a first page, so any requested page is
    /// answered (and labelled) as page 0. The mock catalog paginates.
    pub async fn list_all(&self, page: u32, size: u32) -> Sourced<BookPage> {
        const OP: &str = "list_all";
        if self.use_mock_data {
            return self.fall_back(OP, Miss::Disabled, self.mock.list(page, size));
        }

        let key = cache_key(OP, &[&size]);
        let live = self
            .fetch_live(
                OP,
                &key,
                move |source| async move { source.trending(size).await },
                |raw: RawPage| self.to_page(raw, 0, size),
            )
            .await;

        match live {
            Ok(result) => result,
            Err(miss) => self.fall_back(OP, miss, self.mock.list(page, size)),
        }
    }

    /// Free-text search.
    pub async fn search(&self, query: &str, page: u32, size: u32) -> Sourced<BookPage> {
        const OP: &str = "search";
        if self.use_mock_data {
            return self.fall_back(OP, Miss::Disabled, self.mock.search(query, page, size));
        }

        let query = query.trim();
        let key = cache_key(OP, &[&query, &page, &size]);
        let owned = query.to_string();
        let live = self
            .fetch_live(
                OP,
                &key,
                // Source search pages are 1-based
                move |source| async move { source.search(&owned, page + 1, size).await },
                |raw: RawPage| self.to_page(raw, page, size),
            )
            .await;

        match live {
            Ok(result) => result,
            Err(miss) => self.fall_back(OP, miss, self.mock.search(query, page, size)),
        }
    }

    /// One page of a category.
    pub async fn by_category(&self, category: &str, page: u32, size: u32) -> Sourced<Vec<Book>> {
        const OP: &str = "by_category";
        if self.use_mock_data {
            return self.fall_back(
                OP,
                Miss::Disabled,
                self.mock.by_category(category, page, size),
            );
        }

        let key = cache_key(OP, &[&category.to_lowercase(), &page, &size]);
        let owned = category.to_string();
        let offset = page.saturating_mul(size);
        let live = self
            .fetch_live(
                OP,
                &key,
                move |source| async move { source.subject(&owned, offset, size).await },
                |raw: RawPage| {
                    if raw.is_empty() {
                        None
                    } else {
                        Some(self.normalize_all(&raw.records))
                    }
                },
            )
            .await;

        match live {
            Ok(result) => result,
            Err(miss) => self.fall_back(OP, miss, self.mock.by_category(category, page, size)),
        }
    }

    /// Detail lookup by numeric id.
    ///
    /// Falls back to the mock catalog; fails only if neither path knows the id.
    pub async fn by_id(&self, id: u64) -> Result<Sourced<Book>, CatalogError> {
        const OP: &str = "by_id";
        let miss = if self.use_mock_data {
            Miss::Disabled
        } else {
            let key = cache_key("book", &[&id]);
            let live = self
                .fetch_live(
                    OP,
                    &key,
                    move |source| async move { source.lookup_id(id).await },
                    |record: SourceRecord| self.to_book(record),
                )
                .await;
            match live {
                Ok(result) => return Ok(result),
                Err(miss) => miss,
            }
        };

        match self.mock.by_id(id) {
            Some(book) => Ok(self.fall_back(OP, miss, book)),
            None => {
                debug!("Book {} not found in live or mock catalog", id);
                Err(CatalogError::NotFound(id.to_string()))
            }
        }
    }

    /// Detail lookup by source key. Falls back to a placeholder book.
    pub async fn by_key(&self, key: &str) -> Sourced<Book> {
        const OP: &str = "by_key";
        if self.use_mock_data {
            return self.fall_back(OP, Miss::Disabled, Book::placeholder_details());
        }

        let entry_key = cache_key("book_key", &[&key]);
        let owned = key.to_string();
        let live = self
            .fetch_live(
                OP,
                &entry_key,
                move |source| async move { source.lookup_key(&owned).await },
                |record: SourceRecord| self.to_book(record),
            )
            .await;

        match live {
            Ok(result) => result,
            Err(miss) => self.fall_back(OP, miss, Book::placeholder_details()),
        }
    }

    /// A small batch for each category, fetched concurrently.
    pub async fn by_categories(&self, categories: &[&str]) -> HashMap<String, Sourced<Vec<Book>>> {
        let fetches = categories.iter().map(|category| async move {
            let books = self.by_category(category, 0, CATEGORY_BATCH_SIZE).await;
            (category.to_string(), books)
        });
        futures::future::join_all(fetches).await.into_iter().collect()
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Cache lookup, then a rate-limited source call converted into `T`.
    ///
    /// `convert` returns `None` for a structurally empty result, which is
    /// reported as [`Miss::Empty`] and not cached.
    async fn fetch_live<R, T, F, Fut>(
        &self,
        operation: &'static str,
        key: &str,
        call: F,
        convert: impl FnOnce(R) -> Option<T>,
    ) -> Result<Sourced<T>, Miss>
    where
        R: Send + 'static,
        T: Serialize + DeserializeOwned,
        F: FnOnce(Arc<dyn BookSource>) -> Fut,
        Fut: Future<Output = Result<R, SourceError>> + Send + 'static,
    {
        if let Some(hit) = self.cache.get_as::<T>(key) {
            debug!("Using cached data for: {}", key);
            return Ok(Sourced::cached(hit));
        }

        let raw = self.call_source(operation, call).await.map_err(Miss::Failed)?;
        let data = convert(raw).ok_or(Miss::Empty)?;

        self.cache.set_as(key, &data);
        Ok(Sourced::live(data))
    }

    /// Run one source call through the rate limiter, recording metrics.
    async fn call_source<R, F, Fut>(&self, operation: &'static str, call: F) -> Result<R, SourceError>
    where
        R: Send + 'static,
        F: FnOnce(Arc<dyn BookSource>) -> Fut,
        Fut: Future<Output = Result<R, SourceError>> + Send + 'static,
    {
        let source_name = self.source.name().to_string();
        let request = call(self.source.clone());

        let timed = {
            let source_name = source_name.clone();
            async move {
                let _timer = SOURCE_REQUEST_DURATION
                    .with_label_values(&[source_name.as_str(), operation])
                    .start_timer();
                request.await
            }
        };

        let result = self
            .limiter
            .add(timed)
            .await
            .map_err(SourceError::from)
            .and_then(|result| result);

        let status = if result.is_ok() { "success" } else { "error" };
        SOURCE_REQUESTS
            .with_label_values(&[source_name.as_str(), operation, status])
            .inc();

        result
    }

    fn fall_back<T>(&self, operation: &'static str, miss: Miss, data: T) -> Sourced<T> {
        match &miss {
            Miss::Disabled => debug!("{}: serving mock data", operation),
            Miss::Empty => warn!("{}: live source returned nothing, using mock data", operation),
            Miss::Failed(e) => warn!("{}: live source failed, using mock data: {}", operation, e),
        }
        CATALOG_FALLBACKS
            .with_label_values(&[operation, miss.reason()])
            .inc();
        Sourced::fallback(data)
    }

    fn to_page(&self, raw: RawPage, page: u32, size: u32) -> Option<BookPage> {
        if raw.is_empty() {
            return None;
        }
        let books = self.normalize_all(&raw.records);
        let total = raw.total.max(books.len() as u64);
        Some(BookPage::new(books, page, total, size))
    }

    fn to_book(&self, record: SourceRecord) -> Option<Book> {
        match record {
            SourceRecord::Malformed(reason) => {
                warn!("Discarding malformed detail record: {}", reason);
                None
            }
            record => Some(self.normalizer.normalize(&record)),
        }
    }

    fn normalize_all(&self, records: &[SourceRecord]) -> Vec<Book> {
        records
            .iter()
            .map(|record| self.normalizer.normalize(record))
            .collect()
    }
}
