//! Open Library API client.
//!
//! Open Library search is 1-indexed (`page`), subject listings are
//! offset-based. Callers pass values already translated to those schemes.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::records::{RawPage, SourceRecord};
use super::{BookSource, SourceError};

/// Default Open Library API base URL.
pub const DEFAULT_OPEN_LIBRARY_URL: &str = "https://openlibrary.org";

/// Open Library API client.
pub struct OpenLibrarySource {
    client: Client,
    base_url: String,
}

impl OpenLibrarySource {
    /// Create a new client.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, SourceError> {
        let client = Client::builder()
            .user_agent(user_agent())
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, SourceError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Open Library GET {} {:?}", url, query);

        let response = self.client.get(&url).query(query).send().await?;

        let status = response.status();
        if status == 404 {
            return Err(SourceError::NotFound(path.to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| SourceError::Parse(format!("Failed to parse {}: {}", path, e)))
    }

    async fn search_docs(&self, query: &[(&str, String)]) -> Result<RawPage, SourceError> {
        let response: OlSearchResponse = self.get_json("/search.json", query).await?;
        Ok(response.into())
    }
}

#[async_trait]
impl BookSource for OpenLibrarySource {
    fn name(&self) -> &str {
        "open_library"
    }

    async fn trending(&self, limit: u32) -> Result<RawPage, SourceError> {
        self.search_docs(&[("sort", "new".to_string()), ("limit", limit.to_string())])
            .await
    }

    async fn search(&self, query: &str, page: u32, limit: u32) -> Result<RawPage, SourceError> {
        self.search_docs(&[
            ("q", query.trim().to_string()),
            ("page", page.to_string()),
            ("limit", limit.to_string()),
        ])
        .await
    }

    async fn subject(
        &self,
        category: &str,
        offset: u32,
        limit: u32,
    ) -> Result<RawPage, SourceError> {
        let path = format!(
            "/subjects/{}.json",
            urlencoding::encode(&category.to_lowercase())
        );
        let listing: Result<OlSubjectResponse, _> = self
            .get_json(
                &path,
                &[("limit", limit.to_string()), ("offset", offset.to_string())],
            )
            .await;

        match listing {
            Ok(listing) => Ok(listing.into()),
            Err(e) => {
                warn!(
                    "Subject listing failed for '{}', retrying as text search: {}",
                    category, e
                );
                let page = if limit == 0 { 1 } else { offset / limit + 1 };
                self.search(category, page, limit).await
            }
        }
    }

    async fn lookup_id(&self, id: u64) -> Result<SourceRecord, SourceError> {
        let page = self.search_docs(&[("q", format!("id:{}", id))]).await?;
        page.records
            .into_iter()
            .next()
            .ok_or_else(|| SourceError::NotFound(format!("id:{}", id)))
    }

    async fn lookup_key(&self, key: &str) -> Result<SourceRecord, SourceError> {
        let key = if key.starts_with('/') {
            key.to_string()
        } else {
            format!("/{}", key)
        };

        let mut record: Value = self.get_json(&format!("{}.json", key), &[]).await?;
        // Work records do not always echo their own key.
        if let Value::Object(map) = &mut record {
            map.entry("key").or_insert_with(|| Value::String(key.clone()));
        }
        Ok(SourceRecord::open_library(record))
    }
}

pub(crate) fn user_agent() -> String {
    format!("ByteBooks/{}", env!("CARGO_PKG_VERSION"))
}

// ============================================================================
// Open Library API Response Types (private)
// ============================================================================

#[derive(Debug, Deserialize)]
struct OlSearchResponse {
    #[serde(default, alias = "numFound")]
    num_found: u64,
    #[serde(default)]
    docs: Vec<Value>,
}

impl From<OlSearchResponse> for RawPage {
    fn from(response: OlSearchResponse) -> Self {
        RawPage {
            total: response.num_found,
            records: response
                .docs
                .into_iter()
                .map(SourceRecord::open_library)
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct OlSubjectResponse {
    #[serde(default)]
    work_count: u64,
    #[serde(default)]
    works: Vec<Value>,
}

impl From<OlSubjectResponse> for RawPage {
    fn from(response: OlSubjectResponse) -> Self {
        RawPage {
            total: response.work_count,
            records: response
                .works
                .into_iter()
                .map(SourceRecord::open_library)
                .collect(),
        }
    }
}
