use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::book::Book;

/// Price bucket applied to a result page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceRange {
    #[default]
    #[serde(rename = "all")]
    All,
    #[serde(rename = "under5")]
    Under5,
    #[serde(rename = "5to10")]
    From5To10,
    #[serde(rename = "10to20")]
    From10To20,
    #[serde(rename = "over20")]
    Over20,
}

impl PriceRange {
    /// Parse a query-string value. Unknown values mean no filter.
    pub fn parse(value: &str) -> Self {
        match value {
            "under5" => Self::Under5,
            "5to10" => Self::From5To10,
            "10to20" => Self::From10To20,
            "over20" => Self::Over20,
            _ => Self::All,
        }
    }

    pub fn contains(&self, price: f64) -> bool {
        match self {
            Self::All => true,
            Self::Under5 => price < 5.0,
            Self::From5To10 => (5.0..=10.0).contains(&price),
            Self::From10To20 => price > 10.0 && price <= 20.0,
            Self::Over20 => price > 20.0,
        }
    }
}

/// Result ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortBy {
    /// Keep the catalog's order.
    #[default]
    Relevance,
    /// Publication year descending; unknown years sort last.
    Newest,
    PriceAsc,
    PriceDesc,
    TitleAsc,
}

impl SortBy {
    /// Parse a query-string value. Unknown values keep relevance order.
    pub fn parse(value: &str) -> Self {
        match value {
            "newest" => Self::Newest,
            "priceAsc" => Self::PriceAsc,
            "priceDesc" => Self::PriceDesc,
            "titleAsc" => Self::TitleAsc,
            _ => Self::Relevance,
        }
    }

    fn compare(&self, a: &Book, b: &Book) -> Ordering {
        match self {
            Self::Relevance => Ordering::Equal,
            Self::Newest => b
                .publication_year
                .unwrap_or(0)
                .cmp(&a.publication_year.unwrap_or(0)),
            Self::PriceAsc => a.price.total_cmp(&b.price),
            Self::PriceDesc => b.price.total_cmp(&a.price),
            Self::TitleAsc => a
                .title
                .to_lowercase()
                .cmp(&b.title.to_lowercase())
                .then_with(|| a.title.cmp(&b.title)),
        }
    }
}

/// Drop books outside `range`, then order the rest. The sort is stable.
pub fn filter_and_sort(books: Vec<Book>, range: PriceRange, sort_by: SortBy) -> Vec<Book> {
    let mut books: Vec<Book> = books
        .into_iter()
        .filter(|book| range.contains(book.price))
        .collect();
    books.sort_by(|a, b| sort_by.compare(a, b));
    books
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures::priced_book;

    fn titles(books: &[Book]) -> Vec<&str> {
        books.iter().map(|b| b.title.as_str()).collect()
    }

    fn shelf() -> Vec<Book> {
        vec![
            priced_book(1, "beta", 4.99, Some(2001)),
            priced_book(2, "Alpha", 5.0, None),
            priced_book(3, "Gamma", 10.0, Some(2020)),
            priced_book(4, "delta", 10.01, Some(1999)),
            priced_book(5, "Epsilon", 20.0, Some(2020)),
            priced_book(6, "Zeta", 20.5, Some(2010)),
        ]
    }

    #[test]
    fn test_price_range_boundaries() {
        let pick = |range| titles(&filter_and_sort(shelf(), range, SortBy::Relevance)).len();
        assert_eq!(pick(PriceRange::All), 6);
        assert_eq!(
            titles(&filter_and_sort(shelf(), PriceRange::Under5, SortBy::Relevance)),
            vec!["beta"]
        );
        assert_eq!(
            titles(&filter_and_sort(shelf(), PriceRange::From5To10, SortBy::Relevance)),
            vec!["Alpha", "Gamma"]
        );
        assert_eq!(
            titles(&filter_and_sort(shelf(), PriceRange::From10To20, SortBy::Relevance)),
            vec!["delta", "Epsilon"]
        );
        assert_eq!(
            titles(&filter_and_sort(shelf(), PriceRange::Over20, SortBy::Relevance)),
            vec!["Zeta"]
        );
    }

    #[test]
    fn test_sort_orders() {
        let sorted = |sort| titles(&filter_and_sort(shelf(), PriceRange::All, sort))
            .into_iter()
            .map(str::to_string)
            .collect::<Vec<_>>();

        assert_eq!(
            sorted(SortBy::Relevance),
            vec!["beta", "Alpha", "Gamma", "delta", "Epsilon", "Zeta"]
        );
        // Ties keep catalog order; missing year sorts as 0
        assert_eq!(
            sorted(SortBy::Newest),
            vec!["Gamma", "Epsilon", "Zeta", "beta", "delta", "Alpha"]
        );
        assert_eq!(sorted(SortBy::PriceAsc)[0], "beta");
        assert_eq!(sorted(SortBy::PriceDesc)[0], "Zeta");
        assert_eq!(
            sorted(SortBy::TitleAsc),
            vec!["Alpha", "beta", "delta", "Epsilon", "Gamma", "Zeta"]
        );
    }

    #[test]
    fn test_parse_is_lenient() {
        assert_eq!(PriceRange::parse("5to10"), PriceRange::From5To10);
        assert_eq!(PriceRange::parse("cheap"), PriceRange::All);
        assert_eq!(SortBy::parse("priceDesc"), SortBy::PriceDesc);
        assert_eq!(SortBy::parse(""), SortBy::Relevance);
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(serde_json::to_value(PriceRange::From10To20).unwrap(), "10to20");
        assert_eq!(serde_json::to_value(SortBy::TitleAsc).unwrap(), "titleAsc");
    }
}
