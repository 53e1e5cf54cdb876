use async_trait::async_trait;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::models::{FundEntry, NewUser, Portfolio, PortfolioUpdate, User};

/// Persistence boundary for users and portfolios.
///
/// Lookups by id fail with `DatabaseError::NotFound` when the record is absent.
#[async_trait]
pub trait Store: Send + Sync {
    async fn health_check(&self) -> Result<(), DatabaseError>;

    async fn create_user(&self, user: NewUser) -> Result<User, DatabaseError>;
    async fn get_user(&self, id: Uuid) -> Result<User, DatabaseError>;
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError>;
    /// True when `username` is taken, or `email` is non-empty and taken
    async fn user_exists(&self, username: &str, email: &str) -> Result<bool, DatabaseError>;
    async fn list_users(&self) -> Result<Vec<User>, DatabaseError>;
    async fn delete_user(&self, id: Uuid) -> Result<User, DatabaseError>;

    async fn create_portfolio(
        &self,
        owner: Uuid,
        name: String,
        funds: Vec<FundEntry>,
    ) -> Result<Portfolio, DatabaseError>;
    async fn get_portfolio(&self, id: Uuid) -> Result<Portfolio, DatabaseError>;
    async fn list_portfolios_by_user(&self, owner: Uuid) -> Result<Vec<Portfolio>, DatabaseError>;
    async fn update_portfolio(
        &self,
        id: Uuid,
        update: &PortfolioUpdate,
    ) -> Result<Portfolio, DatabaseError>;
    async fn delete_portfolio(&self, id: Uuid) -> Result<Portfolio, DatabaseError>;
}

pub(crate) fn user_not_found(id: Uuid) -> DatabaseError {
    DatabaseError::NotFound(format!("User {} not found", id))
}

pub(crate) fn portfolio_not_found(id: Uuid) -> DatabaseError {
    DatabaseError::NotFound(format!("Portfolio {} not found", id))
}
