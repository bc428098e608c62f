pub mod assistant;
pub mod auth;
pub mod book;
pub mod cache;
pub mod cart;
pub mod catalog;
pub mod config;
pub mod home;
pub mod metrics;
pub mod rate_limiter;
pub mod search;
pub mod store;
pub mod testing;

pub use assistant::{Assistant, BookInsights, ChatMessage, ChatRole, LlmClient};
pub use auth::{create_verifier, AuthError, AuthStore, CredentialVerifier, DemoVerifier, User};
pub use book::{Book, BookPage, BookRating, Provenance, RatingProvenance, Sourced};
pub use cache::ResponseCache;
pub use cart::{CartItem, CartStore};
pub use catalog::{create_source, BookSource, CatalogClient, CatalogError, MockCatalog, SourceError};
pub use config::{
    load_config, load_config_from_str, validate_config, CatalogSourceKind, Config, ConfigError,
    SanitizedConfig,
};
pub use home::{HomeFeed, HomeSnapshot};
pub use rate_limiter::{RateLimiter, RateLimiterError};
pub use search::{
    run_guarded, run_search, PriceRange, SearchOutcome, SearchRequest, SearchResults,
    SearchSession, SortBy,
};
pub use store::{KeyValueStore, MemoryStore, SqliteStore, StoreError};
