//! Shopping cart.

mod store;

pub use store::CartStore;

use serde::{Deserialize, Serialize};

use crate::book::Book;

/// One cart line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    /// Book id.
    pub id: u64,
    pub title: String,
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Unit price.
    pub price: f64,
    pub quantity: u32,
}

impl CartItem {
    pub fn line_total(&self) -> f64 {
        self.price * f64::from(self.quantity)
    }
}

impl From<&Book> for CartItem {
    fn from(book: &Book) -> Self {
        Self {
            id: book.id,
            title: book.title.clone(),
            author: book.author.clone(),
            image_url: book.image_url.clone(),
            price: book.price,
            quantity: 1,
        }
    }
}
