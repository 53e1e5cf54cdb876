use axum::extract::{Extension, Path, State};

use crate::error::ApiError;
use crate::handlers::parse_id;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::models::User;
use crate::AppState;

/// GET /users - every registered user, password hashes omitted
pub async fn list_users(State(state): State<AppState>) -> ApiResult<Vec<User>> {
    let users = state.store.list_users().await?;
    Ok(ApiResponse::success(users))
}

/// GET /users/:id - only the caller may read their own record
pub async fn get_user(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<User> {
    let id = parse_id(&id)?;
    if auth_user.id != id {
        return Err(ApiError::unauthorized("Not authorized"));
    }

    let user = state.store.get_user(id).await?;
    Ok(ApiResponse::success(user))
}

/// DELETE /users/:id - self-service account removal; owned portfolios are left in place
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<User> {
    let id = parse_id(&id)?;
    if auth_user.id != id {
        return Err(ApiError::unauthorized("Not authorized"));
    }

    let user = state.store.delete_user(id).await?;
    tracing::info!("Deleted user {} ({})", user.username, user.id);
    Ok(ApiResponse::success(user))
}
