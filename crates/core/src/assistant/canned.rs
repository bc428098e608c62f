//! Offline answers used when no model is configured or a call fails.

use rand::seq::SliceRandom;
use rand::Rng;

use super::{BookInsights, InsightDetails, SimilarBook};
use crate::book::Book;

/// Keyword-triggered chat reply. First matching rule wins.
pub fn chat_reply(message: &str) -> &'static str {
    let message = message.to_lowercase();
    let mentions = |words: &[&str]| words.iter().any(|w| message.contains(w));

    if mentions(&["recommend", "suggestion"]) {
        "Based on your interests, I'd recommend 'The Midnight Library' by Matt Haig, \
         'Project Hail Mary' by Andy Weir, or 'Klara and the Sun' by Kazuo Ishiguro. \
         These are popular titles with great reviews!"
    } else if mentions(&["hello", "hi"]) {
        "Hello! I'm the ByteBooks AI assistant. How can I help you discover your next great read today?"
    } else if mentions(&["science fiction", "sci-fi"]) {
        "For science fiction fans, I recommend checking out works by Ted Chiang, Liu Cixin, \
         and Martha Wells. The 'Murderbot Diaries' series is particularly popular right now!"
    } else if mentions(&["mystery", "thriller"]) {
        "If you enjoy mysteries and thrillers, you might like books by Tana French, Jane Harper, \
         or Anthony Horowitz. 'The Thursday Murder Club' by Richard Osman is also a delightful \
         recent addition to the genre."
    } else {
        "I'm here to help you find your next favorite book. You can ask me for recommendations \
         based on genre, author, or themes you enjoy reading about."
    }
}

/// Random sample of up to `limit` candidates.
pub fn sample_recommendations<R: Rng>(candidates: &[Book], limit: usize, rng: &mut R) -> Vec<Book> {
    candidates.choose_multiple(rng, limit).cloned().collect()
}

/// Templated insights built from the book's own fields.
pub fn insights(book: &Book) -> BookInsights {
    let fiction = book.category.eq_ignore_ascii_case("fiction");
    let category = if book.category.is_empty() {
        "Literature"
    } else {
        book.category.as_str()
    };

    BookInsights::Structured(InsightDetails {
        themes: vec![
            "Personal Growth".to_string(),
            "Adventure".to_string(),
            category.to_string(),
            if fiction {
                "Character Development"
            } else {
                "Knowledge"
            }
            .to_string(),
        ],
        writing_style: format!(
            "{} employs a {} style that engages readers through {}.",
            book.author,
            if fiction { "narrative" } else { "informative" },
            if fiction {
                "vivid descriptions and dialogue"
            } else {
                "clear explanations and examples"
            }
        ),
        audience: format!(
            "This book would appeal to readers interested in {}, particularly those who enjoy \
             {}'s unique perspective on the subject.",
            book.category, book.author
        ),
        similar_books: vec![
            SimilarBook {
                title: format!("Another {} Book", book.category),
                author: "Similar Author 1".to_string(),
            },
            SimilarBook {
                title: format!("The {} Experience", book.category),
                author: "Similar Author 2".to_string(),
            },
            SimilarBook {
                title: format!("{} Masterpiece", book.category),
                author: "Similar Author 3".to_string(),
            },
        ],
    })
}

/// Templated answer to a question about a book.
pub fn answer(book: &Book) -> String {
    format!(
        "Based on what I know about \"{}\" by {}, it's a notable work in the {} category. \
         The book explores various themes and ideas that readers find engaging. To get more \
         specific information, you might want to check reviews or read the full description.",
        book.title, book.author, book.category
    )
}
