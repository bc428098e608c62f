//! Book browsing, search and homepage handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use bytebooks_core::home::ALL_AGES;
use bytebooks_core::{
    run_guarded, Book, BookPage, CatalogError, PriceRange, SearchOutcome, SearchRequest, SortBy,
    Sourced,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::handlers::{api_error, ApiError};
use crate::state::AppState;

/// Largest page a client may ask for.
const MAX_PAGE_SIZE: u32 = 100;

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct PageParams {
    /// 0-based.
    #[serde(default)]
    pub page: u32,
    #[serde(default = "default_size")]
    pub size: u32,
}

fn default_size() -> u32 {
    10
}

impl PageParams {
    fn validate(&self) -> Result<(), ApiError> {
        if self.size == 0 || self.size > MAX_PAGE_SIZE {
            return Err(api_error(
                StatusCode::BAD_REQUEST,
                format!("size must be between 1 and {}", MAX_PAGE_SIZE),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub sort: Option<String>,
    /// 1-based.
    #[serde(default)]
    pub page: Option<u32>,
}

impl From<SearchParams> for SearchRequest {
    fn from(params: SearchParams) -> Self {
        let mut request = SearchRequest::query(params.q)
            .with_price_range(PriceRange::parse(params.price.as_deref().unwrap_or_default()))
            .with_sort(SortBy::parse(params.sort.as_deref().unwrap_or_default()))
            .with_page(params.page.unwrap_or(1).max(1));
        if let Some(category) = params.category {
            request.category = category;
        }
        request
    }
}

#[derive(Debug, Deserialize)]
pub struct HomeParams {
    #[serde(default)]
    pub age: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HomeResponse {
    pub featured: Vec<Book>,
    pub fiction: Vec<Book>,
    pub science: Vec<Book>,
    /// Filtered to the requested age group.
    pub kids: Vec<Book>,
    pub fetched_at: DateTime<Utc>,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/v1/books
///
/// Featured listing.
pub async fn list_books(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PageParams>,
) -> Result<Json<Sourced<BookPage>>, ApiError> {
    params.validate()?;
    Ok(Json(
        state.catalog().list_all(params.page, params.size).await,
    ))
}

/// GET /api/v1/books/search
pub async fn search_books(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchOutcome>, ApiError> {
    let request = SearchRequest::from(params);
    match run_guarded(state.search_session(), state.catalog(), &request).await {
        Some(outcome) => Ok(Json(outcome)),
        None => {
            debug!("Discarding superseded search for '{}'", request.query);
            Err(api_error(
                StatusCode::CONFLICT,
                "Search superseded by a newer request",
            ))
        }
    }
}

/// GET /api/v1/books/category/{category}
pub async fn books_by_category(
    State(state): State<Arc<AppState>>,
    Path(category): Path<String>,
    Query(params): Query<PageParams>,
) -> Result<Json<Sourced<Vec<Book>>>, ApiError> {
    params.validate()?;
    Ok(Json(
        state
            .catalog()
            .by_category(&category, params.page, params.size)
            .await,
    ))
}

/// GET /api/v1/books/{id}
///
/// A numeric id looks up by id; anything else is treated as a source key
/// (percent-encoded in the path, e.g. `%2Fworks%2FOL45883W`).
pub async fn get_book(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Sourced<Book>>, ApiError> {
    match id.parse::<u64>() {
        Ok(numeric) => match state.catalog().by_id(numeric).await {
            Ok(book) => Ok(Json(book)),
            Err(e @ CatalogError::NotFound(_)) => {
                Err(api_error(StatusCode::NOT_FOUND, e.to_string()))
            }
        },
        Err(_) => Ok(Json(state.catalog().by_key(&id).await)),
    }
}

/// GET /api/v1/home
pub async fn home(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HomeParams>,
) -> Json<HomeResponse> {
    let snapshot = state.home().load().await;
    let age = params.age.as_deref().unwrap_or(ALL_AGES);

    Json(HomeResponse {
        kids: snapshot.kids_for_age(age),
        featured: snapshot.featured,
        fiction: snapshot.fiction,
        science: snapshot.science,
        fetched_at: snapshot.fetched_at,
    })
}
