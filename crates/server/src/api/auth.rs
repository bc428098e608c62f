//! Session API handlers.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use bytebooks_core::{AuthError, User};
use serde::{Deserialize, Serialize};

use super::handlers::{api_error, ApiError, SuccessResponse};
use crate::metrics::AUTH_FAILURES_TOTAL;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
}

/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<User>, ApiError> {
    state
        .auth()
        .login(&request.email, &request.password)
        .map(Json)
        .map_err(auth_error)
}

/// POST /api/v1/auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let user = state
        .auth()
        .register(&request.name, &request.email, &request.password)
        .map_err(auth_error)?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// POST /api/v1/auth/logout
pub async fn logout(State(state): State<Arc<AppState>>) -> Json<SuccessResponse> {
    state.auth().logout();
    Json(SuccessResponse {
        message: "Logged out".to_string(),
    })
}

/// GET /api/v1/auth/me
pub async fn me(State(state): State<Arc<AppState>>) -> Json<SessionResponse> {
    let user = state.auth().current_user();
    Json(SessionResponse {
        authenticated: user.is_some(),
        user,
    })
}

fn auth_error(error: AuthError) -> ApiError {
    match error {
        AuthError::InvalidCredentials(message) => {
            AUTH_FAILURES_TOTAL
                .with_label_values(&["invalid_credentials"])
                .inc();
            api_error(StatusCode::UNAUTHORIZED, message)
        }
        AuthError::InvalidRegistration(message) => {
            AUTH_FAILURES_TOTAL
                .with_label_values(&["invalid_registration"])
                .inc();
            api_error(StatusCode::BAD_REQUEST, message)
        }
    }
}
