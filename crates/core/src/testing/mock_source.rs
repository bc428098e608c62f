//! Mock book source for testing.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::catalog::{BookSource, RawPage, SourceError, SourceRecord};

/// A recorded source query for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedSourceQuery {
    Trending { limit: u32 },
    Search { query: String, page: u32, limit: u32 },
    Subject { category: String, offset: u32, limit: u32 },
    LookupId { id: u64 },
    LookupKey { key: String },
}

/// Mock implementation of the [`BookSource`] trait over Open Library docs.
///
/// Provides controllable behavior for testing:
/// - Serve configurable search docs and per-subject works
/// - Track queries for assertions
/// - Simulate one-off or persistent failures
///
/// # Example
///
/// ```rust,ignore
/// use bytebooks_core::testing::{MockBookSource, fixtures};
///
/// let source = MockBookSource::new();
/// source.set_docs(vec![fixtures::open_library_doc("Dune", "Frank Herbert", 101)]).await;
///
/// let page = source.search("dune", 1, 10).await?;
/// assert_eq!(page.records.len(), 1);
/// ```
#[derive(Debug)]
pub struct MockBookSource {
    /// Docs served by trending, search and lookups.
    docs: Arc<RwLock<Vec<Value>>>,
    /// Works per lowercased subject.
    subjects: Arc<RwLock<HashMap<String, Vec<Value>>>>,
    /// Recorded queries.
    queries: Arc<RwLock<Vec<RecordedSourceQuery>>>,
    /// If set, the next operation will fail with this error.
    next_error: Arc<RwLock<Option<SourceError>>>,
    /// If true, every operation fails.
    failing: Arc<RwLock<bool>>,
}

impl Default for MockBookSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBookSource {
    /// Create a new empty mock source.
    pub fn new() -> Self {
        Self {
            docs: Arc::new(RwLock::new(Vec::new())),
            subjects: Arc::new(RwLock::new(HashMap::new())),
            queries: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            failing: Arc::new(RwLock::new(false)),
        }
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    /// Replace the docs served by trending, search and lookups.
    pub async fn set_docs(&self, docs: Vec<Value>) {
        *self.docs.write().await = docs;
    }

    /// Set the works listed under a subject.
    pub async fn set_subject(&self, category: &str, works: Vec<Value>) {
        self.subjects
            .write()
            .await
            .insert(category.to_lowercase(), works);
    }

    /// Make every subsequent operation fail (or stop failing).
    pub async fn set_failing(&self, failing: bool) {
        *self.failing.write().await = failing;
    }

    // =========================================================================
    // Query Recording
    // =========================================================================

    /// Get all recorded queries.
    pub async fn recorded_queries(&self) -> Vec<RecordedSourceQuery> {
        self.queries.read().await.clone()
    }

    /// Clear recorded queries.
    pub async fn clear_recorded(&self) {
        self.queries.write().await.clear();
    }

    /// Get the number of queries performed.
    pub async fn query_count(&self) -> usize {
        self.queries.read().await.len()
    }

    // =========================================================================
    // Error Injection
    // =========================================================================

    /// Configure the next operation to fail with the given error.
    pub async fn set_next_error(&self, error: SourceError) {
        *self.next_error.write().await = Some(error);
    }

    /// Record the query, then report any injected failure.
    async fn begin(&self, query: RecordedSourceQuery) -> Result<(), SourceError> {
        self.queries.write().await.push(query);

        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }
        if *self.failing.read().await {
            return Err(SourceError::Api {
                status: 503,
                message: "mock source unavailable".to_string(),
            });
        }
        Ok(())
    }

    async fn find_doc(&self, matches: impl Fn(&Value) -> bool) -> Option<Value> {
        self.docs.read().await.iter().find(|doc| matches(doc)).cloned()
    }
}

fn page_of(docs: Vec<Value>, total: u64) -> RawPage {
    RawPage {
        records: docs.into_iter().map(SourceRecord::open_library).collect(),
        total,
    }
}

#[async_trait]
impl BookSource for MockBookSource {
    fn name(&self) -> &str {
        "mock"
    }

    async fn trending(&self, limit: u32) -> Result<RawPage, SourceError> {
        self.begin(RecordedSourceQuery::Trending { limit }).await?;

        let docs = self.docs.read().await;
        let page = docs.iter().take(limit as usize).cloned().collect();
        Ok(page_of(page, docs.len() as u64))
    }

    async fn search(&self, query: &str, page: u32, limit: u32) -> Result<RawPage, SourceError> {
        self.begin(RecordedSourceQuery::Search {
            query: query.to_string(),
            page,
            limit,
        })
        .await?;

        let query_lower = query.to_lowercase();
        let matches: Vec<Value> = self
            .docs
            .read()
            .await
            .iter()
            .filter(|doc| {
                doc["title"]
                    .as_str()
                    .map(|t| t.to_lowercase().contains(&query_lower))
                    .unwrap_or(false)
            })
            .cloned()
            .collect();

        let total = matches.len() as u64;
        let skip = (page.saturating_sub(1) as usize) * limit as usize;
        let docs = matches.into_iter().skip(skip).take(limit as usize).collect();
        Ok(page_of(docs, total))
    }

    async fn subject(
        &self,
        category: &str,
        offset: u32,
        limit: u32,
    ) -> Result<RawPage, SourceError> {
        self.begin(RecordedSourceQuery::Subject {
            category: category.to_string(),
            offset,
            limit,
        })
        .await?;

        let subjects = self.subjects.read().await;
        let works = subjects
            .get(&category.to_lowercase())
            .cloned()
            .unwrap_or_default();
        let total = works.len() as u64;
        let docs = works
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect();
        Ok(page_of(docs, total))
    }

    async fn lookup_id(&self, id: u64) -> Result<SourceRecord, SourceError> {
        self.begin(RecordedSourceQuery::LookupId { id }).await?;

        self.find_doc(|doc| doc["cover_i"].as_u64() == Some(id))
            .await
            .map(SourceRecord::open_library)
            .ok_or_else(|| SourceError::NotFound(format!("id:{}", id)))
    }

    async fn lookup_key(&self, key: &str) -> Result<SourceRecord, SourceError> {
        self.begin(RecordedSourceQuery::LookupKey {
            key: key.to_string(),
        })
        .await?;

        self.find_doc(|doc| doc["key"].as_str() == Some(key))
            .await
            .map(SourceRecord::open_library)
            .ok_or_else(|| SourceError::NotFound(key.to_string()))
    }
}
