//! Generated in-memory catalog used whenever the live source fails.
//!
//! The dataset is deterministic: book `i` of a category always has the same
//! id, title and price, so fallback responses are stable across restarts.

use crate::book::{page_slice, Book, BookPage, BookRating};

/// Known categories and how many books each one holds.
pub const MOCK_CATEGORIES: &[(&str, u32)] = &[
    ("bestseller", 12),
    ("fiction", 20),
    ("science", 15),
    ("kids", 16),
    ("history", 14),
    ("cooking", 10),
    ("technology", 18),
    ("art", 8),
    ("psychology", 12),
];

/// Size of the set generated on the fly for an unknown category.
pub const UNKNOWN_CATEGORY_SIZE: u32 = 8;

/// Reading age bands assigned to kids books in rotation.
pub const AGE_GROUPS: &[&str] = &["0-3", "4-7", "8-12", "13+"];

/// Mock catalog with the same query surface as the live client.
#[derive(Debug, Clone)]
pub struct MockCatalog {
    categories: Vec<(String, Vec<Book>)>,
    all: Vec<Book>,
}

impl Default for MockCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCatalog {
    pub fn new() -> Self {
        let categories: Vec<(String, Vec<Book>)> = MOCK_CATEGORIES
            .iter()
            .map(|(name, count)| {
                let mut books = generate_books(name, *count);
                if *name == "kids" {
                    assign_age_groups(&mut books);
                }
                (name.to_string(), books)
            })
            .collect();

        let all = categories
            .iter()
            .flat_map(|(_, books)| books.iter().cloned())
            .collect();

        Self { categories, all }
    }

    /// Every generated book, in category order.
    pub fn all(&self) -> &[Book] {
        &self.all
    }

    /// Page through the whole catalog.
    pub fn list(&self, page: u32, size: u32) -> BookPage {
        BookPage::paginate(&self.all, page, size)
    }

    /// Books where any whitespace-separated term matches title, author, isbn
    /// or description (case-insensitive). An empty query matches everything.
    pub fn search(&self, query: &str, page: u32, size: u32) -> BookPage {
        let lowered = query.to_lowercase();
        let terms: Vec<&str> = lowered.split_whitespace().collect();

        let matches: Vec<Book> = self
            .all
            .iter()
            .filter(|book| terms.is_empty() || terms.iter().any(|term| book_matches(book, term)))
            .cloned()
            .collect();

        BookPage::paginate(&matches, page, size)
    }

    /// One page of a category. Unknown categories get a freshly generated set.
    pub fn by_category(&self, category: &str, page: u32, size: u32) -> Vec<Book> {
        let wanted = category.to_lowercase();
        match self.categories.iter().find(|(name, _)| *name == wanted) {
            Some((_, books)) => page_slice(books, page, size).to_vec(),
            None => {
                let books = generate_books(category, UNKNOWN_CATEGORY_SIZE);
                page_slice(&books, page, size).to_vec()
            }
        }
    }

    pub fn by_id(&self, id: u64) -> Option<Book> {
        self.all.iter().find(|book| book.id == id).cloned()
    }
}

fn book_matches(book: &Book, term: &str) -> bool {
    book.title.to_lowercase().contains(term)
        || book.author.to_lowercase().contains(term)
        || book.isbn.to_lowercase().contains(term)
        || book.description.to_lowercase().contains(term)
}

/// Generate `count` books for `category`.
pub fn generate_books(category: &str, count: u32) -> Vec<Book> {
    let display = capitalize(category);
    let code = category.chars().next().map(|c| c as u64).unwrap_or(0);

    (1..=count)
        .map(|i| {
            let n = u64::from(i);
            Book {
                id: n + code * 100,
                title: format!("{} Book {}", display, i),
                author: format!("Author {}", i % 5 + 1),
                description: format!(
                    "This is a sample description for a {} book #{}. It includes all the details \
                     a reader might want to know before purchasing this book, including plot \
                     summaries, themes, and more information about the author.",
                    category, i
                ),
                category: category.to_string(),
                image_url: Some(format!(
                    "https://via.placeholder.com/150?text={}+{}",
                    urlencoding::encode(category),
                    i
                )),
                price: ((9.99 + f64::from(i % 10)) * 100.0).floor() / 100.0,
                isbn: format!("978123456{:04}", i % 10),
                publisher: Some(format!("{} Publishing", display)),
                language: Some("en".to_string()),
                page_count: Some(200 + i * 10),
                publication_year: Some(2020 + (i % 5) as i32),
                rating: Some(BookRating::sourced(
                    f64::min(5.0, ((3.5 + f64::from(i % 5) / 10.0) * 10.0).floor() / 10.0),
                    10 + i * 5,
                )),
                age_group: None,
                source_key: None,
            }
        })
        .collect()
}

fn assign_age_groups(books: &mut [Book]) {
    for (index, book) in books.iter_mut().enumerate() {
        book.age_group = Some(AGE_GROUPS[index % AGE_GROUPS.len()].to_string());
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_sizes() {
        let mock = MockCatalog::new();
        for (name, count) in MOCK_CATEGORIES {
            assert_eq!(
                mock.by_category(name, 0, 100).len(),
                *count as usize,
                "category {}",
                name
            );
        }
        assert_eq!(mock.all().len(), 125);
    }

    #[test]
    fn test_generated_book_fields() {
        let books = generate_books("fiction", 20);
        let book = &books[9]; // i = 10

        assert_eq!(book.id, 10 + 102 * 100);
        assert_eq!(book.title, "Fiction Book 10");
        assert_eq!(book.author, "Author 1");
        assert_eq!(book.price, 9.99);
        assert_eq!(book.isbn, "9781234560000");
        assert_eq!(book.publication_year, Some(2020));
        assert_eq!(book.publisher.as_deref(), Some("Fiction Publishing"));
        assert_eq!(book.page_count, Some(300));
        assert_eq!(book.rating.as_ref().map(|r| r.count), Some(60));
        assert!(book.rating.as_ref().map(|r| !r.is_synthesized()).unwrap_or(false));
    }

    #[test]
    fn test_prices_positive_and_ratings_capped() {
        let mock = MockCatalog::new();
        for book in mock.all() {
            assert!(book.price > 0.0);
            let rating = book.rating.as_ref().unwrap();
            assert!(rating.average >= 3.5 && rating.average <= 5.0);
        }
    }

    #[test]
    fn test_kids_age_groups_cycle() {
        let mock = MockCatalog::new();
        let kids = mock.by_category("Kids", 0, 16);
        let groups: Vec<&str> = kids.iter().filter_map(|b| b.age_group.as_deref()).collect();
        assert_eq!(&groups[..5], &["0-3", "4-7", "8-12", "13+", "0-3"]);
        assert_eq!(groups.len(), 16);
    }

    #[test]
    fn test_unknown_category_generates_eight() {
        let mock = MockCatalog::new();
        let books = mock.by_category("poetry", 0, 10);
        assert_eq!(books.len(), 8);
        assert_eq!(books[0].title, "Poetry Book 1");
        assert_eq!(books[0].category, "poetry");
    }

    #[test]
    fn test_category_paging() {
        let mock = MockCatalog::new();
        assert_eq!(mock.by_category("fiction", 1, 8).len(), 8);
        assert_eq!(mock.by_category("fiction", 2, 8).len(), 4);
        assert!(mock.by_category("fiction", 3, 8).is_empty());
    }

    #[test]
    fn test_search_terms() {
        let mock = MockCatalog::new();

        let page = mock.search("cooking", 0, 100);
        assert_eq!(page.total_items, 10);

        // Any term may match
        let page = mock.search("Art psychology", 0, 100);
        assert_eq!(page.total_items, 20);

        let page = mock.search("   ", 0, 10);
        assert_eq!(page.total_items, 125);
        assert_eq!(page.books.len(), 10);
        assert_eq!(page.total_pages, 13);

        assert_eq!(mock.search("zzzz", 0, 10).total_items, 0);
    }

    #[test]
    fn test_by_id() {
        let mock = MockCatalog::new();
        let id = 3 + u64::from(b's') * 100;
        assert_eq!(mock.by_id(id).map(|b| b.title), Some("Science Book 3".to_string()));
        assert!(mock.by_id(1).is_none());
    }

    #[test]
    fn test_list_pages_whole_catalog() {
        let mock = MockCatalog::new();
        let page = mock.list(0, 10);
        assert_eq!(page.books.len(), 10);
        assert_eq!(page.books[0].title, "Bestseller Book 1");
        assert_eq!(page.total_items, 125);
    }
}
