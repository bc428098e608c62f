use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Catalog cache TTL is positive and base URLs are set
/// - Assistant temperature is within [0, 2]
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.catalog.cache_ttl_secs == 0 {
        return Err(ConfigError::ValidationError(
            "catalog.cache_ttl_secs must be greater than 0".to_string(),
        ));
    }

    for (name, url) in [
        ("catalog.open_library_url", &config.catalog.open_library_url),
        ("catalog.covers_url", &config.catalog.covers_url),
        ("catalog.google_books_url", &config.catalog.google_books_url),
        ("assistant.api_url", &config.assistant.api_url),
    ] {
        if url.trim().is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "{} cannot be empty",
                name
            )));
        }
    }

    if !(0.0..=2.0).contains(&config.assistant.temperature) {
        return Err(ConfigError::ValidationError(
            "assistant.temperature must be between 0 and 2".to_string(),
        ));
    }

    Ok(())
}
