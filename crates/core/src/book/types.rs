//! Canonical book model shared by every catalog source.

use serde::{Deserialize, Serialize};

/// Price every book starts from before recency markups.
pub const BASE_PRICE: f64 = 9.99;

/// Where a rating came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatingProvenance {
    /// Supplied by the catalog source.
    Source,
    /// Generated locally as a display stand-in.
    Synthesized,
}

/// Average rating plus number of ratings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookRating {
    pub average: f64,
    pub count: u32,
    pub provenance: RatingProvenance,
}

impl BookRating {
    pub fn sourced(average: f64, count: u32) -> Self {
        Self {
            average,
            count,
            provenance: RatingProvenance::Source,
        }
    }

    pub fn is_synthesized(&self) -> bool {
        self.provenance == RatingProvenance::Synthesized
    }
}

/// A book in canonical form, independent of the source schema.
///
/// `id` is only meaningful within one session: when the source has no
/// numeric identifier it is derived from the current time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub id: u64,
    pub title: String,
    /// Single display string, never empty.
    pub author: String,
    pub description: String,
    /// Single category, never empty.
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Derived price, rounded to cents.
    pub price: f64,
    /// `"N/A"` when unknown.
    pub isbn: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publication_year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<BookRating>,
    /// Reading age band, kids books only (e.g. "4-7").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_group: Option<String>,
    /// Source-side key for detail lookups (e.g. "/works/OL45883W").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_key: Option<String>,
}

impl Book {
    /// Sentinel returned when a source record cannot be normalized.
    pub fn error_book() -> Self {
        Self::minimal(0, "Error fetching book", "There was an error fetching this book.")
    }

    /// Stand-in returned when a detail lookup by key fails on every path.
    pub fn placeholder_details() -> Self {
        Self::minimal(0, "Book Details", "Unable to load complete book details.")
    }

    fn minimal(id: u64, title: &str, description: &str) -> Self {
        Self {
            id,
            title: title.to_string(),
            author: "Unknown Author".to_string(),
            description: description.to_string(),
            category: "Uncategorized".to_string(),
            image_url: None,
            price: BASE_PRICE,
            isbn: "N/A".to_string(),
            publisher: None,
            language: None,
            page_count: None,
            publication_year: None,
            rating: None,
            age_group: None,
            source_key: None,
        }
    }
}

/// One page of books.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookPage {
    pub books: Vec<Book>,
    /// 0-based.
    pub current_page: u32,
    pub total_items: u64,
    pub total_pages: u32,
}

impl BookPage {
    /// Build a page, deriving the page count from the total.
    pub fn new(books: Vec<Book>, current_page: u32, total_items: u64, size: u32) -> Self {
        let total_pages = if size == 0 {
            0
        } else {
            total_items.div_ceil(u64::from(size)) as u32
        };
        Self {
            books,
            current_page,
            total_items,
            total_pages,
        }
    }

    /// Slice page `page` of `size` out of a full result list.
    pub fn paginate(all: &[Book], page: u32, size: u32) -> Self {
        Self::new(
            page_slice(all, page, size).to_vec(),
            page,
            all.len() as u64,
            size,
        )
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }
}

/// The `[page*size, (page+1)*size)` window of `items`, clamped to its bounds.
pub fn page_slice<T>(items: &[T], page: u32, size: u32) -> &[T] {
    let start = (page as usize).saturating_mul(size as usize).min(items.len());
    let end = start.saturating_add(size as usize).min(items.len());
    &items[start..end]
}

/// Which path served a catalog response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// The live catalog source (possibly via the cache).
    Live,
    /// The generated mock catalog.
    Fallback,
}

/// A catalog response tagged with the path that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sourced<T> {
    pub data: T,
    pub provenance: Provenance,
    /// True when a live response was served from the response cache.
    #[serde(default)]
    pub from_cache: bool,
}

impl<T> Sourced<T> {
    pub fn live(data: T) -> Self {
        Self {
            data,
            provenance: Provenance::Live,
            from_cache: false,
        }
    }

    pub fn cached(data: T) -> Self {
        Self {
            data,
            provenance: Provenance::Live,
            from_cache: true,
        }
    }

    pub fn fallback(data: T) -> Self {
        Self {
            data,
            provenance: Provenance::Fallback,
            from_cache: false,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.provenance == Provenance::Fallback
    }

    /// Transform the payload, keeping the provenance tags.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Sourced<U> {
        Sourced {
            data: f(self.data),
            provenance: self.provenance,
            from_cache: self.from_cache,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered(n: u64) -> Vec<Book> {
        (1..=n)
            .map(|i| Book {
                id: i,
                ..Book::error_book()
            })
            .collect()
    }

    #[test]
    fn test_paginate_middle_and_last_page() {
        let all = numbered(25);

        let page = BookPage::paginate(&all, 1, 10);
        assert_eq!(page.books.first().map(|b| b.id), Some(11));
        assert_eq!(page.books.len(), 10);
        assert_eq!(page.total_items, 25);
        assert_eq!(page.total_pages, 3);

        let last = BookPage::paginate(&all, 2, 10);
        assert_eq!(last.books.len(), 5);
    }

    #[test]
    fn test_paginate_past_end_is_empty() {
        let all = numbered(3);
        let page = BookPage::paginate(&all, 5, 10);
        assert!(page.is_empty());
        assert_eq!(page.current_page, 5);
        assert_eq!(page.total_pages, 1);
    }

    #[test]
    fn test_error_book_fields() {
        let book = Book::error_book();
        assert_eq!(book.id, 0);
        assert_eq!(book.title, "Error fetching book");
        assert_eq!(book.author, "Unknown Author");
        assert_eq!(book.category, "Uncategorized");
        assert_eq!(book.price, 9.99);
        assert_eq!(book.isbn, "N/A");
        assert!(book.image_url.is_none());
    }

    #[test]
    fn test_sourced_map_keeps_tags() {
        let sourced = Sourced::cached(vec![1, 2, 3]).map(|v| v.len());
        assert_eq!(sourced.data, 3);
        assert_eq!(sourced.provenance, Provenance::Live);
        assert!(sourced.from_cache);
        assert!(!sourced.is_fallback());
    }

    #[test]
    fn test_book_json_omits_absent_fields() {
        let json = serde_json::to_value(Book::placeholder_details()).unwrap();
        assert_eq!(json["title"], "Book Details");
        assert!(json.get("image_url").is_none());
        assert!(json.get("rating").is_none());
    }
}
