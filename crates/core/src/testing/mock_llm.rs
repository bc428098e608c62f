//! Mock chat-completion model for testing.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::assistant::{CompletionRequest, CompletionResponse, LlmClient, LlmError, LlmUsage};

/// Mock implementation of the [`LlmClient`] trait.
///
/// Replies are served from a queue; once it is empty every call fails with
/// [`LlmError::EmptyResponse`].
#[derive(Debug)]
pub struct MockLlm {
    responses: Arc<RwLock<VecDeque<String>>>,
    requests: Arc<RwLock<Vec<CompletionRequest>>>,
    next_error: Arc<RwLock<Option<LlmError>>>,
}

impl Default for MockLlm {
    fn default() -> Self {
        Self::new()
    }
}

impl MockLlm {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(RwLock::new(VecDeque::new())),
            requests: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Queue a reply.
    pub async fn push_response(&self, text: impl Into<String>) {
        self.responses.write().await.push_back(text.into());
    }

    /// Configure the next call to fail with the given error.
    pub async fn set_next_error(&self, error: LlmError) {
        *self.next_error.write().await = Some(error);
    }

    /// Get all recorded requests.
    pub async fn recorded_requests(&self) -> Vec<CompletionRequest> {
        self.requests.read().await.clone()
    }

    pub async fn request_count(&self) -> usize {
        self.requests.read().await.len()
    }
}

#[async_trait]
impl LlmClient for MockLlm {
    fn provider(&self) -> &str {
        "mock"
    }

    fn model(&self) -> &str {
        "mock-model"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.requests.write().await.push(request);

        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }

        let text = self
            .responses
            .write()
            .await
            .pop_front()
            .ok_or(LlmError::EmptyResponse)?;

        Ok(CompletionResponse {
            text,
            usage: LlmUsage::default(),
            model: "mock-model".to_string(),
        })
    }
}
