use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub assistant: AssistantConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    8080
}

/// Durable local store configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("bytebooks.db")
}

/// Which external catalog answers live requests.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CatalogSourceKind {
    #[default]
    OpenLibrary,
    GoogleBooks,
}

/// Catalog client configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogConfig {
    /// Live source backend (default: open_library)
    #[serde(default)]
    pub source: CatalogSourceKind,
    /// Skip the live source entirely and answer from the mock catalog
    #[serde(default)]
    pub use_mock_data: bool,
    #[serde(default = "default_open_library_url")]
    pub open_library_url: String,
    #[serde(default = "default_covers_url")]
    pub covers_url: String,
    #[serde(default = "default_google_books_url")]
    pub google_books_url: String,
    /// Response cache time-to-live in seconds (default: 300)
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,
    /// Minimum spacing between outbound requests in milliseconds (default: 500)
    #[serde(default = "default_rate_limit_ms")]
    pub rate_limit_ms: u64,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            source: CatalogSourceKind::default(),
            use_mock_data: false,
            open_library_url: default_open_library_url(),
            covers_url: default_covers_url(),
            google_books_url: default_google_books_url(),
            cache_ttl_secs: default_cache_ttl(),
            rate_limit_ms: default_rate_limit_ms(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_open_library_url() -> String {
    "https://openlibrary.org".to_string()
}

fn default_covers_url() -> String {
    "https://covers.openlibrary.org/b".to_string()
}

fn default_google_books_url() -> String {
    "https://www.googleapis.com/books/v1".to_string()
}

fn default_cache_ttl() -> u64 {
    300
}

fn default_rate_limit_ms() -> u64 {
    500
}

fn default_timeout() -> u32 {
    30
}

/// AI assistant configuration (OpenAI-compatible chat completions)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AssistantConfig {
    #[serde(default = "default_assistant_url")]
    pub api_url: String,
    /// Bearer credential. Without it the assistant answers from canned replies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            api_url: default_assistant_url(),
            api_key: None,
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }
}

impl AssistantConfig {
    /// Returns the API key if one is set and non-blank.
    pub fn credential(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }
}

fn default_assistant_url() -> String {
    "https://api.deepseek.com/chat/completions".to_string()
}

fn default_model() -> String {
    "deepseek-chat".to_string()
}

fn default_max_tokens() -> u32 {
    500
}

fn default_temperature() -> f32 {
    0.7
}

/// Demo account accepted by the login flow
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    #[serde(default = "default_demo_email")]
    pub demo_email: String,
    #[serde(default = "default_demo_password")]
    pub demo_password: String,
    #[serde(default = "default_demo_name")]
    pub demo_name: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            demo_email: default_demo_email(),
            demo_password: default_demo_password(),
            demo_name: default_demo_name(),
        }
    }
}

fn default_demo_email() -> String {
    "demo@example.com".to_string()
}

fn default_demo_password() -> String {
    "password".to_string()
}

fn default_demo_name() -> String {
    "Demo User".to_string()
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub catalog: CatalogConfig,
    pub assistant: SanitizedAssistantConfig,
    pub auth: SanitizedAuthConfig,
}

/// Sanitized assistant config (API key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedAssistantConfig {
    pub api_url: String,
    pub api_key_configured: bool,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Sanitized auth config (password hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedAuthConfig {
    pub demo_email: String,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            database: config.database.clone(),
            catalog: config.catalog.clone(),
            assistant: SanitizedAssistantConfig {
                api_url: config.assistant.api_url.clone(),
                api_key_configured: config.assistant.credential().is_some(),
                model: config.assistant.model.clone(),
                max_tokens: config.assistant.max_tokens,
                temperature: config.assistant.temperature,
            },
            auth: SanitizedAuthConfig {
                demo_email: config.auth.demo_email.clone(),
            },
        }
    }
}
