//! Mapping of raw source records to the canonical [`Book`].
//!
//! Every field is resolved through a fixed fallback chain (first non-empty
//! value wins). Normalization never fails: a record that could not be decoded
//! becomes [`Book::error_book`].

use chrono::{DateTime, Datelike, Utc};
use rand::Rng;
use serde_json::Value;
use tracing::warn;

use super::records::{GoogleVolume, OpenLibraryDoc, SourceRecord};
use crate::book::{Book, BookRating, RatingProvenance, BASE_PRICE};

/// Default Open Library covers endpoint.
pub const DEFAULT_COVERS_URL: &str = "https://covers.openlibrary.org/b";

const UNKNOWN_TITLE: &str = "Unknown Title";
const UNKNOWN_AUTHOR: &str = "Unknown Author";
const UNCATEGORIZED: &str = "Uncategorized";
const NO_DESCRIPTION: &str = "No description available";
const NO_ISBN: &str = "N/A";

/// Converts source records into canonical books.
#[derive(Debug, Clone)]
pub struct Normalizer {
    covers_url: String,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(DEFAULT_COVERS_URL)
    }
}

impl Normalizer {
    pub fn new(covers_url: impl Into<String>) -> Self {
        let covers_url = covers_url.into().trim_end_matches('/').to_string();
        Self { covers_url }
    }

    /// Normalize against the wall clock, synthesizing ratings from the thread RNG.
    pub fn normalize(&self, record: &SourceRecord) -> Book {
        self.normalize_with(record, Utc::now(), &mut rand::thread_rng())
    }

    /// Normalize with an explicit "now" and random source.
    pub fn normalize_with<R: Rng>(
        &self,
        record: &SourceRecord,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Book {
        match record {
            SourceRecord::OpenLibrary(doc) => self.from_open_library(doc, now, rng),
            SourceRecord::GoogleBooks(volume) => from_google_books(volume, now),
            SourceRecord::Malformed(reason) => {
                warn!("Error converting book record: {}", reason);
                Book::error_book()
            }
        }
    }

    fn from_open_library<R: Rng>(
        &self,
        doc: &OpenLibraryDoc,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Book {
        let cover_id = doc.cover_i.filter(|id| *id > 0);

        let id = cover_id
            .map(|id| id as u64)
            .or(doc.version)
            .unwrap_or_else(|| timestamp_id(now));

        let rating = match doc.ratings_average {
            Some(average) => Some(BookRating::sourced(
                round_to(average, 1),
                doc.ratings_count.unwrap_or(0),
            )),
            None => Some(synthesized_rating(rng)),
        };

        Book {
            id,
            title: doc
                .title
                .as_deref()
                .and_then(non_empty)
                .unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
            author: open_library_author(doc).unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()),
            description: open_library_description(doc)
                .unwrap_or_else(|| NO_DESCRIPTION.to_string()),
            category: first_of(&doc.subject)
                .or_else(|| first_of(&doc.subject_facet))
                .or_else(|| doc.subjects.as_ref().and_then(first_text))
                .unwrap_or_else(|| UNCATEGORIZED.to_string()),
            image_url: self.open_library_cover(doc, cover_id),
            price: price_for_year(doc.first_publish_year, now.year()),
            isbn: first_of(&doc.isbn).unwrap_or_else(|| NO_ISBN.to_string()),
            publisher: first_of(&doc.publisher),
            language: first_of(&doc.language),
            page_count: doc.number_of_pages_median,
            publication_year: doc.first_publish_year,
            rating,
            age_group: None,
            source_key: doc
                .key
                .as_deref()
                .and_then(non_empty)
                .or_else(|| first_of(&doc.edition_key).map(|k| format!("/books/{}", k))),
        }
    }

    fn open_library_cover(&self, doc: &OpenLibraryDoc, cover_id: Option<i64>) -> Option<String> {
        let base = &self.covers_url;
        if let Some(id) = cover_id {
            return Some(format!("{}/id/{}-L.jpg", base, id));
        }
        if let Some(olid) = doc.cover_edition_key.as_deref().and_then(non_empty) {
            return Some(format!("{}/olid/{}-L.jpg", base, olid));
        }
        if let Some(isbn) = first_of(&doc.isbn) {
            return Some(format!("{}/isbn/{}-L.jpg", base, isbn));
        }
        doc.key.as_deref().and_then(non_empty).map(|key| {
            let key = key.strip_prefix('/').unwrap_or(key.as_str());
            format!("{}/olid/{}-L.jpg", base, key)
        })
    }
}

/// Normalize with the default covers endpoint.
pub fn normalize(record: &SourceRecord) -> Book {
    Normalizer::default().normalize(record)
}

/// Recency-based price: 9.99, +10 if published fewer than 5 years ago,
/// +5 if fewer than 20. An unknown year gets the base price.
pub fn price_for_year(year: Option<i32>, current_year: i32) -> f64 {
    let Some(year) = year else {
        return BASE_PRICE;
    };
    let years_since = current_year - year;
    let price = if years_since < 5 {
        BASE_PRICE + 10.0
    } else if years_since < 20 {
        BASE_PRICE + 5.0
    } else {
        BASE_PRICE
    };
    round_to(price, 2)
}

fn from_google_books(volume: &GoogleVolume, now: DateTime<Utc>) -> Book {
    let info = &volume.volume_info;

    let authors: Vec<&str> = info
        .authors
        .iter()
        .map(|a| a.trim())
        .filter(|a| !a.is_empty())
        .collect();

    let price = volume
        .sale_info
        .as_ref()
        .and_then(|sale| {
            sale.list_price
                .as_ref()
                .or(sale.retail_price.as_ref())
                .map(|money| money.amount)
        })
        .filter(|amount| *amount > 0.0)
        .unwrap_or(BASE_PRICE);

    Book {
        id: volume
            .id
            .parse::<u64>()
            .unwrap_or_else(|_| timestamp_id(now)),
        title: info
            .title
            .as_deref()
            .and_then(non_empty)
            .unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
        author: if authors.is_empty() {
            UNKNOWN_AUTHOR.to_string()
        } else {
            authors.join(", ")
        },
        description: info
            .description
            .as_deref()
            .and_then(non_empty)
            .unwrap_or_else(|| NO_DESCRIPTION.to_string()),
        category: first_of(&info.categories).unwrap_or_else(|| UNCATEGORIZED.to_string()),
        image_url: info
            .image_links
            .as_ref()
            .and_then(|links| links.thumbnail.as_deref())
            .and_then(non_empty),
        price: round_to(price, 2),
        isbn: info
            .industry_identifiers
            .first()
            .and_then(|id| non_empty(&id.identifier))
            .unwrap_or_else(|| NO_ISBN.to_string()),
        publisher: info.publisher.as_deref().and_then(non_empty),
        language: info.language.as_deref().and_then(non_empty),
        page_count: info.page_count,
        publication_year: info.published_date.as_deref().and_then(leading_year),
        rating: info
            .average_rating
            .map(|average| BookRating::sourced(average, info.ratings_count.unwrap_or(0))),
        age_group: None,
        source_key: non_empty(&volume.id),
    }
}

fn open_library_author(doc: &OpenLibraryDoc) -> Option<String> {
    first_of(&doc.author_name)
        .or_else(|| doc.author.as_ref().and_then(first_text))
        .or_else(|| doc.authors.as_ref().and_then(first_author_entry))
        .or_else(|| doc.by_statement.as_deref().and_then(non_empty))
}

/// `authors[0]` as `{name}`, a plain string, or a work record's `{author: {key}}`.
fn first_author_entry(authors: &Value) -> Option<String> {
    let first = match authors {
        Value::Array(items) => items.first()?,
        other => other,
    };
    match first {
        Value::String(s) => non_empty(s),
        Value::Object(map) => map
            .get("name")
            .and_then(Value::as_str)
            .and_then(non_empty)
            .or_else(|| {
                map.get("author")
                    .and_then(|a| a.get("key"))
                    .and_then(Value::as_str)
                    .and_then(non_empty)
            }),
        _ => None,
    }
}

fn open_library_description(doc: &OpenLibraryDoc) -> Option<String> {
    if let Some(description) = doc.description.as_ref().and_then(text_or_value) {
        return Some(description);
    }

    let sentences: Vec<String> = match doc.first_sentence.as_ref()? {
        Value::Array(items) => items.iter().filter_map(text_or_value).collect(),
        other => text_or_value(other).into_iter().collect(),
    };
    if sentences.is_empty() {
        None
    } else {
        Some(format!("{}...", sentences.join(". ")))
    }
}

/// A string, or the `value` field of a `{type, value}` object.
fn text_or_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => non_empty(s),
        Value::Object(map) => map.get("value").and_then(Value::as_str).and_then(non_empty),
        _ => None,
    }
}

/// A string, or the first string of an array.
fn first_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => non_empty(s),
        Value::Array(items) => items.first().and_then(Value::as_str).and_then(non_empty),
        _ => None,
    }
}

fn first_of(items: &[String]) -> Option<String> {
    items.first().and_then(|s| non_empty(s))
}

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn leading_year(date: &str) -> Option<i32> {
    let digits = date.get(..4)?;
    if digits.chars().all(|c| c.is_ascii_digit()) {
        digits.parse().ok()
    } else {
        None
    }
}

fn synthesized_rating<R: Rng>(rng: &mut R) -> BookRating {
    BookRating {
        average: round_to(rng.gen_range(3.0..=5.0), 1),
        count: rng.gen_range(10..=509),
        provenance: RatingProvenance::Synthesized,
    }
}

fn timestamp_id(now: DateTime<Utc>) -> u64 {
    now.timestamp_millis().max(0) as u64
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
