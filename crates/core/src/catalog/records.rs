//! Raw records as returned by the external catalog APIs.
//!
//! Fields whose shape differs between endpoints (search docs, subject works,
//! work records) are kept as loose JSON and resolved by the normalizer.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// Open Library
// ============================================================================

/// An Open Library search doc, subject work, or work record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OpenLibraryDoc {
    /// Work or edition key (e.g. "/works/OL45883W").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub author_name: Vec<String>,
    /// Plain author list (string or array of strings).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<Value>,
    /// Author objects: `{name}`, plain strings, or `{author: {key}}` in work records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authors: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub by_statement: Option<String>,
    #[serde(default)]
    pub subject: Vec<String>,
    #[serde(default)]
    pub subject_facet: Vec<String>,
    /// Work-record subjects.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subjects: Option<Value>,
    /// Either a string or `{type, value}`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<Value>,
    /// Array of sentences, a string, or `{type, value}`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_sentence: Option<Value>,
    /// Cover id; subject works call it `cover_id`.
    #[serde(default, alias = "cover_id", skip_serializing_if = "Option::is_none")]
    pub cover_i: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_edition_key: Option<String>,
    #[serde(default)]
    pub isbn: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_publish_year: Option<i32>,
    /// Search index version; a secondary numeric identifier.
    #[serde(
        default,
        rename = "_version_",
        skip_serializing_if = "Option::is_none"
    )]
    pub version: Option<u64>,
    #[serde(default)]
    pub publisher: Vec<String>,
    #[serde(default)]
    pub language: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_pages_median: Option<u32>,
    #[serde(default)]
    pub edition_key: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ratings_average: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ratings_count: Option<u32>,
}

// ============================================================================
// Google Books
// ============================================================================

/// A Google Books volume.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleVolume {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub volume_info: VolumeInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sale_info: Option<SaleInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub authors: Vec<String>,
    /// "YYYY", "YYYY-MM" or "YYYY-MM-DD".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_links: Option<ImageLinks>,
    #[serde(default)]
    pub industry_identifiers: Vec<IndustryIdentifier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ratings_count: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageLinks {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub small_thumbnail: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndustryIdentifier {
    #[serde(rename = "type")]
    pub kind: String,
    pub identifier: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_price: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retail_price: Option<Money>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Money {
    pub amount: f64,
    #[serde(default)]
    pub currency_code: String,
}

// ============================================================================
// Envelope
// ============================================================================

/// One raw record from any source.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceRecord {
    OpenLibrary(OpenLibraryDoc),
    GoogleBooks(GoogleVolume),
    /// A record whose JSON did not match the expected schema.
    Malformed(String),
}

impl SourceRecord {
    /// Decode one Open Library record, keeping decode failures as `Malformed`.
    pub fn open_library(value: Value) -> Self {
        match serde_json::from_value(value) {
            Ok(doc) => Self::OpenLibrary(doc),
            Err(e) => Self::Malformed(format!("Open Library record: {}", e)),
        }
    }

    /// Decode one Google Books volume, keeping decode failures as `Malformed`.
    pub fn google_books(value: Value) -> Self {
        match serde_json::from_value(value) {
            Ok(volume) => Self::GoogleBooks(volume),
            Err(e) => Self::Malformed(format!("Google Books volume: {}", e)),
        }
    }
}

/// A page of raw records plus the source's total hit count.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawPage {
    pub records: Vec<SourceRecord>,
    pub total: u64,
}

impl RawPage {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
