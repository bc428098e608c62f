//! AI shopping assistant.
//!
//! Wraps an [`LlmClient`] with the bookstore persona and prompt templates.
//! Every operation degrades to canned answers when no model is configured
//! or the call fails, so callers never see an error.

pub mod canned;
mod llm;

pub use llm::{
    ChatCompletionClient, ChatMessage, ChatRole, CompletionRequest, CompletionResponse, LlmClient,
    LlmError, LlmUsage,
};

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::book::Book;
use crate::config::AssistantConfig;
use crate::metrics::ASSISTANT_REPLIES;

/// Persona sent as the system message of every completion.
pub const PERSONA: &str = "You are ByteBooks AI, a helpful assistant for ByteBooks online \
bookstore. You help users discover books, learn about authors and genres, and get personalized \
recommendations. You are knowledgeable about literature, publishing, and reading in general. \
Keep your answers helpful, concise, and focused on books and reading.";

/// Most recommendations returned.
pub const MAX_RECOMMENDATIONS: usize = 5;

/// Candidates listed in a recommendation prompt.
pub const MAX_PROMPT_CANDIDATES: usize = 50;

/// A title suggested alongside insights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarBook {
    pub title: String,
    #[serde(default)]
    pub author: String,
}

/// Structured insights about one book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightDetails {
    pub themes: Vec<String>,
    #[serde(default, alias = "writingStyle")]
    pub writing_style: String,
    #[serde(default)]
    pub audience: String,
    #[serde(default, alias = "similarBooks")]
    pub similar_books: Vec<SimilarBook>,
}

/// Insights as parsed from the model, or its raw text when it did not
/// answer in the expected shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BookInsights {
    Structured(InsightDetails),
    Raw { raw_response: String },
}

/// Bookstore assistant.
pub struct Assistant {
    llm: Option<Arc<dyn LlmClient>>,
    max_tokens: u32,
    temperature: f32,
}

impl Assistant {
    /// Assistant over an explicit client. `None` answers from canned replies.
    pub fn new(llm: Option<Arc<dyn LlmClient>>) -> Self {
        Self {
            llm,
            max_tokens: 500,
            temperature: 0.7,
        }
    }

    /// Build from configuration; a missing or blank credential means canned mode.
    pub fn from_config(config: &AssistantConfig) -> Self {
        let llm = config.credential().map(|key| {
            Arc::new(ChatCompletionClient::new(
                config.api_url.clone(),
                key,
                config.model.clone(),
            )) as Arc<dyn LlmClient>
        });

        Self {
            llm,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.llm.is_some()
    }

    /// Reply to a chat message in the context of earlier turns.
    pub async fn chat(&self, message: &str, history: &[ChatMessage]) -> String {
        match self.complete("chat", message, history).await {
            Some(text) => text,
            None => canned::chat_reply(message).to_string(),
        }
    }

    /// Pick up to five candidates matching the user's preferences.
    pub async fn recommend(&self, preferences: &str, candidates: &[Book]) -> Vec<Book> {
        const OP: &str = "recommend";
        let fallback = || {
            ASSISTANT_REPLIES.with_label_values(&[OP, "canned"]).inc();
            canned::sample_recommendations(candidates, MAX_RECOMMENDATIONS, &mut rand::thread_rng())
        };

        if candidates.is_empty() || self.llm.is_none() {
            return fallback();
        }

        let prompt = recommendation_prompt(preferences, candidates);
        match self.complete_raw(OP, &prompt, &[]).await {
            Some(reply) => {
                ASSISTANT_REPLIES.with_label_values(&[OP, "model"]).inc();
                match_titles(&reply, candidates)
            }
            None => fallback(),
        }
    }

    /// Themes, style, audience and similar titles for a book.
    pub async fn insights(&self, book: &Book) -> BookInsights {
        let prompt = format!(
            "Analyze this book and provide insights:\n\
             Title: {}\n\
             Author: {}\n\
             Description: {}\n\n\
             Provide the following in JSON format:\n\
             1. Main themes (list of 3-5)\n\
             2. Writing style (brief description)\n\
             3. Who would enjoy this book (brief description)\n\
             4. Similar books (list of 3 titles and authors)",
            book.title, book.author, book.description
        );

        match self.complete("insights", &prompt, &[]).await {
            Some(reply) => parse_insights(&reply),
            None => canned::insights(book),
        }
    }

    /// Answer a free-form question about a book.
    pub async fn answer(&self, question: &str, book: &Book) -> String {
        let prompt = format!(
            "Book: {} by {}\n\
             Category: {}\n\
             Description: {}\n\n\
             User question: \"{}\"\n\n\
             Please answer the question about this book. If you don't know the specific answer \
             because it's not in the provided information, give your best educated response based \
             on your knowledge of literature and this type of book, but indicate that it's your \
             best guess based on limited information.",
            book.title, book.author, book.category, book.description, question
        );

        match self.complete("answer", &prompt, &[]).await {
            Some(text) => text,
            None => canned::answer(book),
        }
    }

    /// Completion with reply metrics for both outcomes.
    async fn complete(
        &self,
        operation: &'static str,
        prompt: &str,
        history: &[ChatMessage],
    ) -> Option<String> {
        let reply = self.complete_raw(operation, prompt, history).await;
        let origin = if reply.is_some() { "model" } else { "canned" };
        ASSISTANT_REPLIES
            .with_label_values(&[operation, origin])
            .inc();
        reply
    }

    /// Model reply, or `None` when unconfigured or the call failed.
    async fn complete_raw(
        &self,
        operation: &'static str,
        prompt: &str,
        history: &[ChatMessage],
    ) -> Option<String> {
        let llm = self.llm.as_ref()?;

        let request = CompletionRequest::new(prompt)
            .with_system(PERSONA)
            .with_history(history)
            .with_max_tokens(self.max_tokens)
            .with_temperature(self.temperature);

        match llm.complete(request).await {
            Ok(response) => {
                debug!(
                    operation,
                    model = %response.model,
                    output_tokens = response.usage.output_tokens,
                    "Assistant completion received"
                );
                Some(response.text)
            }
            Err(e) => {
                warn!("Assistant {} failed, using canned reply: {}", operation, e);
                None
            }
        }
    }
}

fn recommendation_prompt(preferences: &str, candidates: &[Book]) -> String {
    let list = candidates
        .iter()
        .take(MAX_PROMPT_CANDIDATES)
        .map(|b| format!("{} by {} ({})", b.title, b.author, b.category))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Based on the user's preferences: \"{}\", recommend 5 books from this list:\n\n{}\n\n\
         Return just the book titles separated by commas, nothing else.",
        preferences, list
    )
}

/// Candidates whose title contains any of the comma-separated titles in `reply`.
fn match_titles(reply: &str, candidates: &[Book]) -> Vec<Book> {
    let titles: Vec<String> = reply
        .split(',')
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect();

    candidates
        .iter()
        .filter(|book| {
            let title = book.title.to_lowercase();
            titles.iter().any(|t| title.contains(t.as_str()))
        })
        .take(MAX_RECOMMENDATIONS)
        .cloned()
        .collect()
}

/// Parse the JSON object embedded in a reply, or keep the text.
fn parse_insights(reply: &str) -> BookInsights {
    let object = match (reply.find('{'), reply.rfind('}')) {
        (Some(start), Some(end)) if start < end => &reply[start..=end],
        _ => reply,
    };

    match serde_json::from_str::<InsightDetails>(object) {
        Ok(details) => BookInsights::Structured(details),
        Err(e) => {
            debug!("Insights reply is not structured JSON: {}", e);
            BookInsights::Raw {
                raw_response: reply.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixtures, MockLlm};

    fn shelf() -> Vec<Book> {
        vec![
            fixtures::book(1, "The Hobbit", "fiction"),
            fixtures::book(2, "Dune", "fiction"),
            fixtures::book(3, "Dune Messiah", "fiction"),
            fixtures::book(4, "Cosmos", "science"),
            fixtures::book(5, "Sapiens", "history"),
            fixtures::book(6, "Educated", "history"),
            fixtures::book(7, "Becoming", "history"),
        ]
    }

    fn assistant_with(llm: &Arc<MockLlm>) -> Assistant {
        Assistant::new(Some(llm.clone() as Arc<dyn LlmClient>))
    }

    #[tokio::test]
    async fn test_chat_without_credential_is_canned() {
        let assistant = Assistant::from_config(&AssistantConfig::default());
        assert!(!assistant.is_configured());

        let reply = assistant.chat("hi there", &[]).await;
        assert!(reply.starts_with("Hello!"));
    }

    #[tokio::test]
    async fn test_blank_key_is_unconfigured() {
        let config = AssistantConfig {
            api_key: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(!Assistant::from_config(&config).is_configured());
    }

    #[tokio::test]
    async fn test_chat_sends_persona_and_history() {
        let llm = Arc::new(MockLlm::new());
        llm.push_response("Try Piranesi.").await;
        let assistant = assistant_with(&llm);

        let history = vec![
            ChatMessage::user("I liked Jonathan Strange"),
            ChatMessage::assistant("Great choice!"),
        ];
        let reply = assistant.chat("What next?", &history).await;
        assert_eq!(reply, "Try Piranesi.");

        let requests = llm.recorded_requests().await;
        assert_eq!(requests.len(), 1);
        let messages = requests[0].messages();
        assert_eq!(messages[0].role, ChatRole::System);
        assert_eq!(messages[0].content, PERSONA);
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[3].content, "What next?");
    }

    #[tokio::test]
    async fn test_chat_error_falls_back() {
        let llm = Arc::new(MockLlm::new());
        llm.set_next_error(LlmError::Api {
            status: 401,
            message: "bad key".to_string(),
        })
        .await;
        let assistant = assistant_with(&llm);

        let reply = assistant.chat("any mystery books?", &[]).await;
        assert!(reply.contains("Tana French"));
    }

    #[tokio::test]
    async fn test_recommend_matches_titles() {
        let llm = Arc::new(MockLlm::new());
        llm.push_response(" dune ,  , Cosmos, Not In Stock").await;
        let assistant = assistant_with(&llm);

        let picks = assistant.recommend("space", &shelf()).await;
        let titles: Vec<&str> = picks.iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, vec!["Dune", "Dune Messiah", "Cosmos"]);

        let prompt = &llm.recorded_requests().await[0].prompt;
        assert!(prompt.starts_with("Based on the user's preferences: \"space\""));
        assert!(prompt.contains("The Hobbit by Test Author (fiction)"));
    }

    #[tokio::test]
    async fn test_recommend_caps_at_five() {
        let llm = Arc::new(MockLlm::new());
        llm.push_response("e").await;
        let assistant = assistant_with(&llm);

        // "e" appears in every title but Cosmos
        let picks = assistant.recommend("anything", &shelf()).await;
        assert_eq!(picks.len(), 5);
    }

    #[tokio::test]
    async fn test_recommend_prompt_lists_fifty() {
        let llm = Arc::new(MockLlm::new());
        llm.push_response("Book 1").await;
        let assistant = assistant_with(&llm);

        let many: Vec<Book> = (1..=60)
            .map(|i| fixtures::book(i, &format!("Book {}", i), "art"))
            .collect();
        assistant.recommend("art", &many).await;

        let prompt = &llm.recorded_requests().await[0].prompt;
        assert!(prompt.contains("Book 50 by"));
        assert!(!prompt.contains("Book 51 by"));
    }

    #[tokio::test]
    async fn test_recommend_without_candidates_skips_model() {
        let llm = Arc::new(MockLlm::new());
        let assistant = assistant_with(&llm);

        assert!(assistant.recommend("anything", &[]).await.is_empty());
        assert_eq!(llm.request_count().await, 0);
    }

    #[tokio::test]
    async fn test_recommend_canned_samples_candidates() {
        let assistant = Assistant::new(None);
        let shelf = shelf();

        let picks = assistant.recommend("anything", &shelf).await;
        assert_eq!(picks.len(), 5);
        assert!(picks.iter().all(|p| shelf.contains(p)));
    }

    #[tokio::test]
    async fn test_insights_parses_embedded_json() {
        let llm = Arc::new(MockLlm::new());
        llm.push_response(
            "Sure! ```json\n{\"themes\":[\"Power\",\"Ecology\"],\"writingStyle\":\"Dense\",\
             \"audience\":\"Epic fans\",\"similarBooks\":[{\"title\":\"Hyperion\",\"author\":\"Dan Simmons\"}]}\n```",
        )
        .await;
        let assistant = assistant_with(&llm);

        let insights = assistant.insights(&fixtures::book(2, "Dune", "fiction")).await;
        let BookInsights::Structured(details) = insights else {
            panic!("expected structured insights");
        };
        assert_eq!(details.themes, vec!["Power", "Ecology"]);
        assert_eq!(details.writing_style, "Dense");
        assert_eq!(details.similar_books[0].author, "Dan Simmons");
    }

    #[tokio::test]
    async fn test_insights_keeps_raw_text() {
        let llm = Arc::new(MockLlm::new());
        llm.push_response("It is a book about sand.").await;
        let assistant = assistant_with(&llm);

        let insights = assistant.insights(&fixtures::book(2, "Dune", "fiction")).await;
        assert_eq!(
            insights,
            BookInsights::Raw {
                raw_response: "It is a book about sand.".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_answer_prompt_and_fallback() {
        let llm = Arc::new(MockLlm::new());
        llm.push_response("About 400 pages.").await;
        let assistant = assistant_with(&llm);
        let book = fixtures::book(2, "Dune", "fiction");

        assert_eq!(assistant.answer("How long is it?", &book).await, "About 400 pages.");
        let prompt = &llm.recorded_requests().await[0].prompt;
        assert!(prompt.contains("User question: \"How long is it?\""));

        // Queue exhausted: the mock reports an empty completion
        let fallback = assistant.answer("Again?", &book).await;
        assert!(fallback.starts_with("Based on what I know about \"Dune\""));
    }

    #[test]
    fn test_insights_serialization_shapes() {
        let raw = BookInsights::Raw {
            raw_response: "text".to_string(),
        };
        assert_eq!(serde_json::to_value(&raw).unwrap()["raw_response"], "text");
    }
}
