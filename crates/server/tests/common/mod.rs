//! Common test utilities for integration tests.
//!
//! Provides a test fixture that wires the full API over mock external
//! services: a scripted book source and, optionally, a scripted model.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use bytebooks_core::cache::{ResponseCache, DEFAULT_CACHE_TTL};
use bytebooks_core::testing::{MockBookSource, MockLlm};
use bytebooks_core::{
    create_verifier, Assistant, AuthStore, CartStore, CatalogClient, Config, HomeFeed,
    KeyValueStore, LlmClient, MemoryStore, RateLimiter,
};
use bytebooks_server::state::AppState;

pub use bytebooks_core::testing::fixtures;

/// Test response with status and parsed JSON body.
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

/// Test fixture containing the router and mock services.
pub struct TestFixture {
    pub router: Router,
    pub source: Arc<MockBookSource>,
    pub llm: Arc<MockLlm>,
    pub store: Arc<MemoryStore>,
}

impl TestFixture {
    /// Create a fixture with no model configured.
    pub async fn new() -> Self {
        Self::with_config(TestConfig::default()).await
    }

    pub async fn with_config(test_config: TestConfig) -> Self {
        let source = Arc::new(MockBookSource::new());
        let llm = Arc::new(MockLlm::new());
        let store = Arc::new(MemoryStore::new());
        let shared: Arc<dyn KeyValueStore> = store.clone();

        let config = Config::default();

        let cache = Arc::new(ResponseCache::new(Arc::clone(&shared), DEFAULT_CACHE_TTL));
        let catalog = Arc::new(CatalogClient::new(
            source.clone(),
            cache,
            RateLimiter::new(Duration::from_millis(1)),
        ));

        let home = HomeFeed::new(Arc::clone(&catalog), Arc::clone(&shared));
        let cart = CartStore::new(Arc::clone(&shared));
        let auth = AuthStore::new(create_verifier(&config.auth), Arc::clone(&shared));

        let assistant = if test_config.enable_llm {
            Assistant::new(Some(llm.clone() as Arc<dyn LlmClient>))
        } else {
            Assistant::new(None)
        };

        let state = Arc::new(AppState::new(config, catalog, home, cart, auth, assistant));
        let router = bytebooks_server::api::create_router(state);

        Self {
            router,
            source,
            llm,
            store,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a POST request without a body.
    pub async fn post_empty(&self, path: &str) -> TestResponse {
        self.request("POST", path, None).await
    }

    /// Send a PUT request with JSON body.
    pub async fn put(&self, path: &str, body: Value) -> TestResponse {
        self.request("PUT", path, Some(body)).await
    }

    /// Send a DELETE request.
    pub async fn delete(&self, path: &str) -> TestResponse {
        self.request("DELETE", path, None).await
    }

    /// Send a GET request and return the raw text body.
    pub async fn get_text(&self, path: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        (status, String::from_utf8_lossy(&body_bytes).into_owned())
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        let request = request_builder.body(body).unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }
}

/// Configuration for test fixture.
#[derive(Debug, Clone, Default)]
pub struct TestConfig {
    /// Answer assistant calls from the scripted model
    pub enable_llm: bool,
}

impl TestConfig {
    /// Create config with the scripted model enabled.
    pub fn with_llm() -> Self {
        Self { enable_llm: true }
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}
