//! Cart API handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use bytebooks_core::{CartItem, CartStore};
use serde::{Deserialize, Serialize};

use super::handlers::{api_error, ApiError};
use crate::state::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub id: u64,
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub image_url: Option<String>,
    pub price: f64,
    /// Defaults to 1.
    #[serde(default)]
    pub quantity: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest {
    /// Zero or less removes the line.
    pub quantity: i64,
}

#[derive(Debug, Serialize)]
pub struct CartResponse {
    pub items: Vec<CartItem>,
    pub total_items: u64,
    pub total_price: f64,
}

impl From<&CartStore> for CartResponse {
    fn from(cart: &CartStore) -> Self {
        Self {
            items: cart.items(),
            total_items: cart.total_items(),
            total_price: cart.total_price(),
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/v1/cart
pub async fn get_cart(State(state): State<Arc<AppState>>) -> Json<CartResponse> {
    Json(CartResponse::from(state.cart()))
}

/// POST /api/v1/cart
pub async fn add_to_cart(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AddToCartRequest>,
) -> Result<Json<CartResponse>, ApiError> {
    if !request.price.is_finite() || request.price < 0.0 {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "price must be a non-negative number",
        ));
    }

    let item = CartItem {
        id: request.id,
        title: request.title,
        author: request.author,
        image_url: request.image_url,
        price: request.price,
        quantity: 1,
    };
    state.cart().add_item(item, request.quantity);
    Ok(Json(CartResponse::from(state.cart())))
}

/// PUT /api/v1/cart/{id}
pub async fn update_quantity(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Json(request): Json<UpdateQuantityRequest>,
) -> Result<Json<CartResponse>, ApiError> {
    ensure_in_cart(state.cart(), id)?;
    state.cart().update_quantity(id, request.quantity);
    Ok(Json(CartResponse::from(state.cart())))
}

/// DELETE /api/v1/cart/{id}
pub async fn remove_from_cart(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<CartResponse>, ApiError> {
    ensure_in_cart(state.cart(), id)?;
    state.cart().remove_item(id);
    Ok(Json(CartResponse::from(state.cart())))
}

/// DELETE /api/v1/cart
pub async fn clear_cart(State(state): State<Arc<AppState>>) -> Json<CartResponse> {
    state.cart().clear();
    Json(CartResponse::from(state.cart()))
}

fn ensure_in_cart(cart: &CartStore, id: u64) -> Result<(), ApiError> {
    if cart.contains(id) {
        Ok(())
    } else {
        Err(api_error(
            StatusCode::NOT_FOUND,
            format!("Book {} is not in the cart", id),
        ))
    }
}
