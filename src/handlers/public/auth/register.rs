// handlers/public/auth/register.rs - POST /auth/register handler

use axum::extract::State;

use crate::auth;
use crate::error::ApiError;
use crate::handlers::run_blocking;
use crate::middleware::{ApiJson, ApiResponse, ApiResult};
use crate::models::{NewUser, RegisterRequest, TokenResponse};
use crate::AppState;

use super::require_field;

/// POST /auth/register - Create an account and receive a JWT token
///
/// Expected Input:
/// ```json
/// {
///   "username": "string",   // Required
///   "password": "string",   // Required
///   "email": "string"       // Optional
/// }
/// ```
///
/// Responds 201 with `{ "auth": true, "token": "..." }`, 400 when username or
/// password is missing or the body is not valid JSON, 409 when the username or email is already taken.
pub async fn register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> ApiResult<TokenResponse> {
    let username = require_field(payload.username)?;
    let password = require_field(payload.password)?;
    let email = payload.email.unwrap_or_default();

    // Signing key must be available before the user is written
    let signer = auth::TokenSigner::from_config()?;

    if state.store.user_exists(&username, &email).await? {
        return Err(ApiError::conflict("User already exists"));
    }

    let hashed = run_blocking(move || auth::hash_password(&password)).await??;

    let user = state
        .store
        .create_user(NewUser {
            username,
            password: hashed,
            email,
        })
        .await?;

    let token = signer.issue(&user)?;
    tracing::info!("Registered user {} ({})", user.username, user.id);

    Ok(ApiResponse::created(TokenResponse { auth: true, token }))
}
