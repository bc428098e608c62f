//! Testing utilities and mock implementations.
//!
//! Mocks for the external seams (book source, chat-completion model, clock)
//! so the catalog client, assistant and HTTP API can be exercised without
//! network access.
//!
//! # Example
//!
//! ```rust,ignore
//! use bytebooks_core::testing::{fixtures, MockBookSource};
//!
//! let source = MockBookSource::new();
//! source.set_docs(vec![fixtures::open_library_doc("Dune", "Frank Herbert", 101)]).await;
//!
//! // Use in CatalogClient::new(...)
//! ```

mod mock_llm;
mod mock_source;

pub use mock_llm::MockLlm;
pub use mock_source::{MockBookSource, RecordedSourceQuery};

use std::sync::Mutex;

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::cache::Clock;

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    /// Start at 2024-01-01T00:00:00Z.
    pub fn new() -> Self {
        Self::starting_at(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
    }

    pub fn starting_at(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// Test fixtures and helper functions.
pub mod fixtures {
    use serde_json::{json, Value};

    use crate::book::{Book, BookRating};
    use crate::cart::CartItem;

    /// An Open Library search doc with a cover id and work key derived from it.
    pub fn open_library_doc(title: &str, author: &str, cover_id: i64) -> Value {
        json!({
            "key": format!("/works/OL{}W", cover_id),
            "title": title,
            "author_name": [author],
            "cover_i": cover_id,
            "first_publish_year": 2015,
            "subject": ["Fiction"],
        })
    }

    /// A Google Books volume.
    pub fn google_volume(id: &str, title: &str, author: &str) -> Value {
        json!({
            "id": id,
            "volumeInfo": {
                "title": title,
                "authors": [author],
                "categories": ["Fiction"],
                "publishedDate": "2019-05-01",
            },
        })
    }

    /// A canonical book with reasonable defaults.
    pub fn book(id: u64, title: &str, category: &str) -> Book {
        Book {
            id,
            title: title.to_string(),
            author: "Test Author".to_string(),
            description: format!("A test book called {}.", title),
            category: category.to_string(),
            image_url: None,
            price: 12.99,
            isbn: format!("978000000{:04}", id % 10_000),
            publisher: None,
            language: Some("en".to_string()),
            page_count: Some(320),
            publication_year: Some(2015),
            rating: Some(BookRating::sourced(4.2, 100)),
            age_group: None,
            source_key: None,
        }
    }

    /// A book with the given price and publication year.
    pub fn priced_book(id: u64, title: &str, price: f64, year: Option<i32>) -> Book {
        Book {
            price,
            publication_year: year,
            ..book(id, title, "fiction")
        }
    }

    /// A cart line for a book.
    pub fn cart_item(id: u64, title: &str, price: f64) -> CartItem {
        CartItem {
            id,
            title: title.to_string(),
            author: "Test Author".to_string(),
            image_url: None,
            price,
            quantity: 1,
        }
    }
}
