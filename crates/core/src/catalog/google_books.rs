//! Google Books API client.
//!
//! Category listings are `subject:` searches. Google volume ids are strings,
//! so numeric id lookups are not supported and report `NotFound`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::open_library::user_agent;
use super::records::{RawPage, SourceRecord};
use super::{BookSource, SourceError};

/// Default Google Books API base URL.
pub const DEFAULT_GOOGLE_BOOKS_URL: &str = "https://www.googleapis.com/books/v1";

/// Google Books caps `maxResults` at 40.
const MAX_RESULTS: u32 = 40;

/// Google Books API client.
pub struct GoogleBooksSource {
    client: Client,
    base_url: String,
}

impl GoogleBooksSource {
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
        debug!("Google Books GET {} {:?}", url, query);

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

    async fn volumes(&self, q: String, start_index: u32, limit: u32) -> Result<RawPage, SourceError> {
        let response: GbVolumesResponse = self
            .get_json(
                "/volumes",
                &[
                    ("q", q),
                    ("maxResults", limit.clamp(1, MAX_RESULTS).to_string()),
                    ("startIndex", start_index.to_string()),
                ],
            )
            .await?;
        Ok(response.into())
    }
}

#[async_trait]
impl BookSource for GoogleBooksSource {
    fn name(&self) -> &str {
        "google_books"
    }

    async fn trending(&self, limit: u32) -> Result<RawPage, SourceError> {
        self.volumes("subject:bestseller".to_string(), 0, limit).await
    }

    async fn search(&self, query: &str, page: u32, limit: u32) -> Result<RawPage, SourceError> {
        let start_index = page.saturating_sub(1).saturating_mul(limit);
        self.volumes(query.trim().to_string(), start_index, limit)
            .await
    }

    async fn subject(
        &self,
        category: &str,
        offset: u32,
        limit: u32,
    ) -> Result<RawPage, SourceError> {
        self.volumes(format!("subject:{}", category.to_lowercase()), offset, limit)
            .await
    }

    async fn lookup_id(&self, id: u64) -> Result<SourceRecord, SourceError> {
        Err(SourceError::NotFound(format!(
            "Google Books has no numeric id {}",
            id
        )))
    }

    async fn lookup_key(&self, key: &str) -> Result<SourceRecord, SourceError> {
        let path = format!("/volumes/{}", urlencoding::encode(key));
        let volume: Value = self.get_json(&path, &[]).await?;
        Ok(SourceRecord::google_books(volume))
    }
}

// ============================================================================
// Google Books API Response Types (private)
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GbVolumesResponse {
    #[serde(default)]
    total_items: u64,
    #[serde(default)]
    items: Vec<Value>,
}

impl From<GbVolumesResponse> for RawPage {
    fn from(response: GbVolumesResponse) -> Self {
        RawPage {
            total: response.total_items,
            records: response
                .items
                .into_iter()
                .map(SourceRecord::google_books)
                .collect(),
        }
    }
}
