// handlers/token.rs - POST /api/token/ handler

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::api::json_body;
use crate::auth::{generate_jwt, verify_password, AuthError, Claims};
use crate::database::UserRepository;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access: String,
    pub token_type: String,
    /// Seconds until the token expires
    pub expires_in: u64,
}

/// POST /api/token/ - exchange username and password for a bearer token
pub async fn obtain(
    State(state): State<AppState>,
    payload: Result<Json<serde_json::Value>, JsonRejection>,
) -> ApiResult<TokenResponse> {
    let body = json_body(payload)?;
    let request: TokenRequest = serde_json::from_value(body)
        .map_err(|e| ApiError::validation_error(format!("Invalid credentials payload: {}", e), None))?;

    let user = state
        .store
        .user_by_username(&request.username)
        .await?
        .filter(|user| verify_password(&request.password, &user.password_hash))
        .ok_or(AuthError::InvalidCredentials)?;

    let security = &state.config.security;
    let claims = Claims::new(user.id, user.username.clone(), security.jwt_expiry_hours);
    let access = generate_jwt(&claims, security)?;

    tracing::info!(user = %user, "issued access token");
    Ok(ApiResponse::success(TokenResponse {
        access,
        token_type: "Bearer".to_string(),
        expires_in: claims.lifetime_secs(),
    }))
}
