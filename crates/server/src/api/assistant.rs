//! AI assistant API handlers.
//!
//! None of these fail because of the model: without a configured key, or when
//! a completion fails, the assistant answers from canned replies.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use bytebooks_core::assistant::MAX_PROMPT_CANDIDATES;
use bytebooks_core::{Book, BookInsights, CatalogError, ChatMessage};
use serde::{Deserialize, Serialize};

use super::handlers::{api_error, ApiError};
use crate::state::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    /// Earlier turns, oldest first.
    #[serde(default)]
    pub history: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub reply: String,
}

#[derive(Debug, Deserialize)]
pub struct RecommendRequest {
    pub preferences: String,
    /// Draw candidates from this category instead of the featured listing.
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RecommendResponse {
    pub books: Vec<Book>,
}

#[derive(Debug, Deserialize)]
pub struct InsightsRequest {
    pub book_id: u64,
}

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub book_id: u64,
    pub question: String,
}

#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub answer: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/v1/assistant/chat
pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let message = request.message.trim();
    if message.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "message is required"));
    }

    let reply = state.assistant().chat(message, &request.history).await;
    Ok(Json(ChatResponse { reply }))
}

/// POST /api/v1/assistant/recommend
pub async fn recommend(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RecommendRequest>,
) -> Json<RecommendResponse> {
    let limit = MAX_PROMPT_CANDIDATES as u32;
    let candidates = match request.category.as_deref().map(str::trim) {
        Some(category) if !category.is_empty() => {
            state.catalog().by_category(category, 0, limit).await.data
        }
        _ => state.catalog().list_all(0, limit).await.data.books,
    };

    let books = state
        .assistant()
        .recommend(&request.preferences, &candidates)
        .await;
    Json(RecommendResponse { books })
}

/// POST /api/v1/assistant/insights
pub async fn insights(
    State(state): State<Arc<AppState>>,
    Json(request): Json<InsightsRequest>,
) -> Result<Json<BookInsights>, ApiError> {
    let book = find_book(&state, request.book_id).await?;
    Ok(Json(state.assistant().insights(&book).await))
}

/// POST /api/v1/assistant/ask
pub async fn ask(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AskRequest>,
) -> Result<Json<AskResponse>, ApiError> {
    let question = request.question.trim();
    if question.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "question is required"));
    }

    let book = find_book(&state, request.book_id).await?;
    let answer = state.assistant().answer(question, &book).await;
    Ok(Json(AskResponse { answer }))
}

async fn find_book(state: &AppState, id: u64) -> Result<Book, ApiError> {
    match state.catalog().by_id(id).await {
        Ok(book) => Ok(book.data),
        Err(e @ CatalogError::NotFound(_)) => Err(api_error(StatusCode::NOT_FOUND, e.to_string())),
    }
}
