//! Canonical book model and paging/provenance wrappers.

mod types;

pub use types::{
    page_slice, Book, BookPage, BookRating, Provenance, RatingProvenance, Sourced, BASE_PRICE,
};
