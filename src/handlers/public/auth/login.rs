// handlers/public/auth/login.rs - POST /auth/login handler

use axum::extract::State;

use crate::auth;
use crate::error::ApiError;
use crate::handlers::run_blocking;
use crate::middleware::{ApiJson, ApiResponse, ApiResult};
use crate::models::{LoginRequest, TokenResponse};
use crate::AppState;

use super::require_field;

/// POST /auth/login - Authenticate user and receive JWT token
///
/// Expected Input:
/// ```json
/// {
///   "username": "string",
///   "password": "string"
/// }
/// ```
///
/// Expected Output (Success):
/// ```json
/// {
///   "success": true,
///   "data": { "auth": true, "token": "eyJhbGciOiJIUzI1NiI..." }
/// }
/// ```
pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> ApiResult<TokenResponse> {
    let username = require_field(payload.username)?;
    let password = require_field(payload.password)?;

    let user = state
        .store
        .find_user_by_username(&username)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    let hash = user.password.clone();
    let valid = run_blocking(move || auth::verify_password(&password, &hash)).await??;
    if !valid {
        tracing::warn!("Failed login for user {}", user.username);
        return Err(ApiError::unauthorized("Unauthorized"));
    }

    let token = auth::issue_token(&user)?;
    Ok(ApiResponse::success(TokenResponse { auth: true, token }))
}
