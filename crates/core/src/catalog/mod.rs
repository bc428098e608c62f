//! Book catalog: live sources, normalization, mock fallback and the client
//! that ties them together.

mod client;
mod google_books;
mod mock;
mod normalize;
mod open_library;
mod records;

pub use client::CatalogClient;
pub use google_books::{GoogleBooksSource, DEFAULT_GOOGLE_BOOKS_URL};
pub use mock::{generate_books, MockCatalog, AGE_GROUPS, MOCK_CATEGORIES, UNKNOWN_CATEGORY_SIZE};
pub use normalize::{normalize, price_for_year, Normalizer, DEFAULT_COVERS_URL};
pub use open_library::{OpenLibrarySource, DEFAULT_OPEN_LIBRARY_URL};
pub use records::{
    GoogleVolume, ImageLinks, IndustryIdentifier, Money, OpenLibraryDoc, RawPage, SaleInfo,
    SourceRecord, VolumeInfo,
};

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::{CatalogConfig, CatalogSourceKind};
use crate::rate_limiter::RateLimiterError;

/// Errors from a live catalog source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned a non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Resource not found (404 or empty lookup).
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// The request never ran.
    #[error("Rate limiter: {0}")]
    RateLimiter(#[from] RateLimiterError),
}

/// Errors surfaced by [`CatalogClient`].
///
/// Source failures never reach callers; they are answered from the mock
/// catalog instead. Only a lookup that no path can satisfy is an error.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Book not found: {0}")]
    NotFound(String),
}

/// Trait for external book metadata sources.
///
/// Paging is in the source's own terms: `search` takes a 1-based page,
/// `subject` takes an item offset.
#[async_trait]
pub trait BookSource: Send + Sync {
    /// Short name used in logs and metrics.
    fn name(&self) -> &str;

    /// Recently added or popular books.
    async fn trending(&self, limit: u32) -> Result<RawPage, SourceError>;

    /// Free-text search.
    async fn search(&self, query: &str, page: u32, limit: u32) -> Result<RawPage, SourceError>;

    /// Books filed under a subject/category.
    async fn subject(&self, category: &str, offset: u32, limit: u32)
        -> Result<RawPage, SourceError>;

    /// Look up one book by numeric id.
    async fn lookup_id(&self, id: u64) -> Result<SourceRecord, SourceError>;

    /// Look up one book by source key.
    async fn lookup_key(&self, key: &str) -> Result<SourceRecord, SourceError>;
}

/// Create the live source selected in the configuration.
pub fn create_source(config: &CatalogConfig) -> Result<Arc<dyn BookSource>, SourceError> {
    let timeout = Duration::from_secs(u64::from(config.timeout_secs));
    match config.source {
        CatalogSourceKind::OpenLibrary => Ok(Arc::new(OpenLibrarySource::new(
            &config.open_library_url,
            timeout,
        )?)),
        CatalogSourceKind::GoogleBooks => Ok(Arc::new(GoogleBooksSource::new(
            &config.google_books_url,
            timeout,
        )?)),
    }
}
