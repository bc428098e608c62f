use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::{assistant, auth, books, cart, handlers, middleware::metrics_middleware};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // API routes
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Catalog
        .route("/books", get(books::list_books))
        .route("/books/search", get(books::search_books))
        .route("/books/category/{category}", get(books::books_by_category))
        .route("/books/{id}", get(books::get_book))
        .route("/home", get(books::home))
        // Cart
        .route(
            "/cart",
            get(cart::get_cart)
                .post(cart::add_to_cart)
                .delete(cart::clear_cart),
        )
        .route(
            "/cart/{id}",
            put(cart::update_quantity).delete(cart::remove_from_cart),
        )
        // Session
        .route("/auth/login", post(auth::login))
        .route("/auth/register", post(auth::register))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        // Assistant
        .route("/assistant/chat", post(assistant::chat))
        .route("/assistant/recommend", post(assistant::recommend))
        .route("/assistant/insights", post(assistant::insights))
        .route("/assistant/ask", post(assistant::ask))
        .with_state(state.clone());

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::metrics))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(middleware::from_fn(metrics_middleware)),
        )
}
