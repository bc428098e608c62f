use std::sync::Arc;

use bytebooks_core::{
    Assistant, AuthStore, CartStore, CatalogClient, Config, HomeFeed, SanitizedConfig,
    SearchSession,
};

/// Shared application state.
///
/// The storefront is single-session: one cart, one signed-in user and one
/// search session per process.
pub struct AppState {
    config: Config,
    catalog: Arc<CatalogClient>,
    home: HomeFeed,
    cart: CartStore,
    auth: AuthStore,
    assistant: Assistant,
    search: SearchSession,
}

impl AppState {
    pub fn new(
        config: Config,
        catalog: Arc<CatalogClient>,
        home: HomeFeed,
        cart: CartStore,
        auth: AuthStore,
        assistant: Assistant,
    ) -> Self {
        Self {
            config,
            catalog,
            home,
            cart,
            auth,
            assistant,
            search: SearchSession::new(),
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn catalog(&self) -> &CatalogClient {
        &self.catalog
    }

    pub fn home(&self) -> &HomeFeed {
        &self.home
    }

    pub fn cart(&self) -> &CartStore {
        &self.cart
    }

    pub fn auth(&self) -> &AuthStore {
        &self.auth
    }

    pub fn assistant(&self) -> &Assistant {
        &self.assistant
    }

    pub fn search_session(&self) -> &SearchSession {
        &self.search
    }
}
