//! Search orchestration: turn a storefront search request into a catalog
//! call, then filter and order the returned page.

mod filters;
mod session;

pub use filters::{filter_and_sort, PriceRange, SortBy};
pub use session::{SearchSession, SearchToken};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::book::{Book, Provenance};
use crate::catalog::CatalogClient;

/// Results per search page.
pub const SEARCH_PAGE_SIZE: u32 = 10;

pub const PROMPT_MESSAGE: &str = "Please enter a search term or select a category";
pub const NO_CATEGORY_RESULTS: &str = "No books found in this category.";
pub const NO_SEARCH_RESULTS: &str = "No books found matching your search.";

/// A storefront search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub query: String,
    /// Category name, or `"all"` for free-text search.
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub price_range: PriceRange,
    #[serde(default)]
    pub sort_by: SortBy,
    /// 1-based.
    #[serde(default = "default_page")]
    pub page: u32,
}

impl Default for SearchRequest {
    fn default() -> Self {
        Self {
            query: String::new(),
            category: default_category(),
            price_range: PriceRange::All,
            sort_by: SortBy::Relevance,
            page: default_page(),
        }
    }
}

fn default_category() -> String {
    "all".to_string()
}

fn default_page() -> u32 {
    1
}

impl SearchRequest {
    pub fn query(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    pub fn category(category: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            ..Default::default()
        }
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    pub fn with_price_range(mut self, range: PriceRange) -> Self {
        self.price_range = range;
        self
    }

    pub fn with_sort(mut self, sort_by: SortBy) -> Self {
        self.sort_by = sort_by;
        self
    }

    fn browses_category(&self) -> bool {
        let category = self.category.trim();
        !category.is_empty() && !category.eq_ignore_ascii_case("all")
    }

    fn zero_based_page(&self) -> u32 {
        self.page.saturating_sub(1)
    }
}

/// One page of filtered, ordered search results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
    pub books: Vec<Book>,
    /// 1-based.
    pub current_page: u32,
    /// Hits reported by the catalog, before price filtering.
    pub total_results: u64,
    pub total_pages: u32,
    pub provenance: Provenance,
    pub from_cache: bool,
}

/// What a search produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SearchOutcome {
    /// Nothing to search for; no catalog call was made.
    Prompt { message: String },
    /// The catalog returned nothing.
    NoResults { message: String },
    Results(SearchResults),
}

/// Run a search against the catalog.
///
/// A category other than `"all"` browses that category and ignores the
/// query text. Price filtering and ordering apply to the returned page only.
pub async fn run_search(catalog: &CatalogClient, request: &SearchRequest) -> SearchOutcome {
    let query = request.query.trim();
    let page = request.zero_based_page();

    let (books, total, provenance, from_cache) = if request.browses_category() {
        let result = catalog
            .by_category(request.category.trim(), page, SEARCH_PAGE_SIZE)
            .await;
        if result.data.is_empty() {
            return no_results(NO_CATEGORY_RESULTS);
        }
        let total = result.data.len() as u64;
        (result.data, total, result.provenance, result.from_cache)
    } else if query.is_empty() {
        return SearchOutcome::Prompt {
            message: PROMPT_MESSAGE.to_string(),
        };
    } else {
        let result = catalog.search(query, page, SEARCH_PAGE_SIZE).await;
        if result.data.is_empty() {
            return no_results(NO_SEARCH_RESULTS);
        }
        let total = result.data.total_items;
        (result.data.books, total, result.provenance, result.from_cache)
    };

    debug!(
        "Search '{}' in '{}' returned {} books ({:?})",
        query,
        request.category,
        books.len(),
        provenance
    );

    SearchOutcome::Results(SearchResults {
        books: filter_and_sort(books, request.price_range, request.sort_by),
        current_page: page + 1,
        total_results: total,
        total_pages: total.div_ceil(u64::from(SEARCH_PAGE_SIZE)) as u32,
        provenance,
        from_cache,
    })
}

/// Run a search under a session token; returns `None` if a newer search
/// superseded this one before it finished.
pub async fn run_guarded(
    session: &SearchSession,
    catalog: &CatalogClient,
    request: &SearchRequest,
) -> Option<SearchOutcome> {
    let token = session.begin();
    let outcome = run_search(catalog, request).await;
    if session.complete(token, outcome.clone()) {
        Some(outcome)
    } else {
        None
    }
}

fn no_results(message: &str) -> SearchOutcome {
    SearchOutcome::NoResults {
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{ResponseCache, DEFAULT_CACHE_TTL};
    use crate::rate_limiter::RateLimiter;
    use crate::store::MemoryStore;
    use crate::testing::{fixtures, MockBookSource, RecordedSourceQuery};
    use std::sync::Arc;
    use std::time::Duration;

    fn client_with(source: Arc<MockBookSource>) -> CatalogClient {
        let cache = Arc::new(ResponseCache::new(
            Arc::new(MemoryStore::new()),
            DEFAULT_CACHE_TTL,
        ));
        CatalogClient::new(source, cache, RateLimiter::new(Duration::from_millis(10)))
    }

    #[tokio::test(start_paused = true)]
    async fn test_blank_query_prompts_without_calling_catalog() {
        let source = Arc::new(MockBookSource::new());
        let client = client_with(source.clone());

        let outcome = run_search(&client, &SearchRequest::query("   ")).await;
        assert_eq!(
            outcome,
            SearchOutcome::Prompt {
                message: PROMPT_MESSAGE.to_string()
            }
        );
        assert_eq!(source.query_count().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_category_search_uses_zero_based_page() {
        let source = Arc::new(MockBookSource::new());
        let works = (1..=12)
            .map(|i| fixtures::open_library_doc(&format!("Atlas {}", i), "Cartographer", i))
            .collect();
        source.set_subject("history", works).await;
        let client = client_with(source.clone());

        let request = SearchRequest::category("history").with_page(2);
        let SearchOutcome::Results(results) = run_search(&client, &request).await else {
            panic!("expected results");
        };

        assert_eq!(results.current_page, 2);
        assert_eq!(results.books.len(), 2);
        assert_eq!(results.total_results, 2);
        assert_eq!(results.total_pages, 1);
        assert_eq!(
            source.recorded_queries().await,
            vec![RecordedSourceQuery::Subject {
                category: "history".to_string(),
                offset: 10,
                limit: 10,
            }]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_text_search_filters_and_sorts() {
        let source = Arc::new(MockBookSource::new());
        source
            .set_docs(vec![
                fixtures::open_library_doc("Saga B", "X", 1),
                fixtures::open_library_doc("Saga A", "X", 2),
            ])
            .await;
        let client = client_with(source);

        let request = SearchRequest::query("saga").with_sort(SortBy::TitleAsc);
        let SearchOutcome::Results(results) = run_search(&client, &request).await else {
            panic!("expected results");
        };
        let titles: Vec<&str> = results.books.iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, vec!["Saga A", "Saga B"]);
        assert_eq!(results.total_results, 2);
        assert_eq!(results.provenance, Provenance::Live);

        // Fixture docs are priced from a 2015 publication year, above 5
        let request = SearchRequest::query("saga").with_price_range(PriceRange::Under5);
        let SearchOutcome::Results(results) = run_search(&client, &request).await else {
            panic!("expected results");
        };
        assert!(results.books.is_empty());
        assert_eq!(results.total_results, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_results_messages() {
        let client = client_with(Arc::new(MockBookSource::new())).with_mock_data_only(true);

        let outcome = run_search(&client, &SearchRequest::query("qqqqqq")).await;
        assert_eq!(
            outcome,
            SearchOutcome::NoResults {
                message: NO_SEARCH_RESULTS.to_string()
            }
        );

        // Past the end of a known category
        let request = SearchRequest::category("art").with_page(5);
        assert_eq!(
            run_search(&client, &request).await,
            SearchOutcome::NoResults {
                message: NO_CATEGORY_RESULTS.to_string()
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_guarded_run_publishes_latest() {
        let client = client_with(Arc::new(MockBookSource::new())).with_mock_data_only(true);
        let session = SearchSession::new();

        let outcome = run_guarded(&session, &client, &SearchRequest::query("cooking")).await;
        assert!(matches!(outcome, Some(SearchOutcome::Results(_))));
        assert_eq!(session.current(), outcome);
    }

    #[test]
    fn test_outcome_wire_shape() {
        let outcome = SearchOutcome::NoResults {
            message: NO_SEARCH_RESULTS.to_string(),
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "no_results");
        assert_eq!(json["message"], NO_SEARCH_RESULTS);
    }
}
