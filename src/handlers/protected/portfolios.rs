use axum::extract::{Extension, Path, State};

use crate::allocation;
use crate::error::ApiError;
use crate::handlers::parse_id;
use crate::middleware::{ApiJson, ApiResponse, ApiResult, AuthUser};
use crate::models::{CreatePortfolioRequest, Portfolio, UpdatePortfolioRequest};
use crate::AppState;

/// GET /portfolios - portfolios owned by the caller
pub async fn list_portfolios(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<Vec<Portfolio>> {
    let portfolios = state.store.list_portfolios_by_user(auth_user.id).await?;
    Ok(ApiResponse::success(portfolios))
}

/// GET /portfolios/:id
pub async fn get_portfolio(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Portfolio> {
    let portfolio = state.store.get_portfolio(parse_id(&id)?).await?;
    Ok(ApiResponse::success(portfolio))
}

/// POST /portfolios - create a portfolio owned by the caller
///
/// `funds` is required and its percentages must add up to exactly 100.
pub async fn create_portfolio(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    ApiJson(payload): ApiJson<CreatePortfolioRequest>,
) -> ApiResult<Portfolio> {
    let funds = payload
        .funds
        .ok_or_else(|| ApiError::bad_request("Incomplete request"))?;
    allocation::check(&funds)?;

    let portfolio = state
        .store
        .create_portfolio(auth_user.id, payload.name, funds)
        .await?;

    tracing::info!("Portfolio {} created for user {}", portfolio.id, auth_user.id);
    Ok(ApiResponse::created(portfolio))
}

/// PUT /portfolios/:id - replace individual fields
///
/// The allocation rule applies only when `updatedFields.funds` is present.
pub async fn update_portfolio(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<UpdatePortfolioRequest>,
) -> ApiResult<Portfolio> {
    let id = parse_id(&id)?;
    let update = payload.updated_fields;

    if let Some(funds) = &update.funds {
        allocation::check(funds)?;
    }

    let portfolio = if update.is_empty() {
        state.store.get_portfolio(id).await?
    } else {
        state.store.update_portfolio(id, &update).await?
    };

    tracing::info!("Portfolio {} updated", portfolio.id);
    Ok(ApiResponse::success(portfolio))
}

/// DELETE /portfolios/:id
pub async fn delete_portfolio(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Portfolio> {
    let portfolio = state.store.delete_portfolio(parse_id(&id)?).await?;
    tracing::info!("Portfolio {} deleted", portfolio.id);
    Ok(ApiResponse::success(portfolio))
}
