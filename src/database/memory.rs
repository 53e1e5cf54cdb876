use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::repository::{portfolio_not_found, user_not_found, Store};
use crate::models::{FundEntry, NewUser, Portfolio, PortfolioUpdate, User};

#[derive(Default)]
struct Tables {
    // Insertion order doubles as creation order
    users: Vec<User>,
    portfolios: Vec<Portfolio>,
}

impl Tables {
    /// Stored users keep an empty `portfolios` list; ownership is resolved on read
    fn hydrate(&self, user: &User) -> User {
        let mut user = user.clone();
        user.portfolios = self
            .portfolios
            .iter()
            .filter(|p| p.user == user.id)
            .map(|p| p.id)
            .collect();
        user
    }
}

/// Process-local store used by tests and `--storage memory` runs
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn health_check(&self) -> Result<(), DatabaseError> {
        Ok(())
    }

    async fn create_user(&self, user: NewUser) -> Result<User, DatabaseError> {
        let mut tables = self.tables.write().await;
        let taken = tables.users.iter().any(|u| {
            u.username == user.username || (!user.email.is_empty() && u.email == user.email)
        });
        if taken {
            return Err(DatabaseError::Conflict("User already exists".to_string()));
        }

        let user = user.into_user();
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: Uuid) -> Result<User, DatabaseError> {
        let tables = self.tables.read().await;
        let user = tables.users.iter().find(|u| u.id == id).map(|u| tables.hydrate(u));
        user.ok_or_else(|| user_not_found(id))
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError> {
        let tables = self.tables.read().await;
        let user = tables
            .users
            .iter()
            .find(|u| u.username == username)
            .map(|u| tables.hydrate(u));
        Ok(user)
    }

    async fn user_exists(&self, username: &str, email: &str) -> Result<bool, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .iter()
            .any(|u| u.username == username || (!email.is_empty() && u.email == email)))
    }

    async fn list_users(&self) -> Result<Vec<User>, DatabaseError> {
        let tables = self.tables.read().await;
        let users = tables.users.iter().map(|u| tables.hydrate(u)).collect();
        Ok(users)
    }

    async fn delete_user(&self, id: Uuid) -> Result<User, DatabaseError> {
        let mut tables = self.tables.write().await;
        let index = tables
            .users
            .iter()
            .position(|u| u.id == id)
            .ok_or_else(|| user_not_found(id))?;
        let user = tables.hydrate(&tables.users[index]);
        tables.users.remove(index);
        Ok(user)
    }

    async fn create_portfolio(
        &self,
        owner: Uuid,
        name: String,
        funds: Vec<FundEntry>,
    ) -> Result<Portfolio, DatabaseError> {
        let portfolio = Portfolio {
            id: Uuid::new_v4(),
            name,
            funds,
            user: owner,
        };
        self.tables.write().await.portfolios.push(portfolio.clone());
        Ok(portfolio)
    }

    async fn get_portfolio(&self, id: Uuid) -> Result<Portfolio, DatabaseError> {
        self.tables
            .read()
            .await
            .portfolios
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| portfolio_not_found(id))
    }

    async fn list_portfolios_by_user(&self, owner: Uuid) -> Result<Vec<Portfolio>, DatabaseError> {
        Ok(self
            .tables
            .read()
            .await
            .portfolios
            .iter()
            .filter(|p| p.user == owner)
            .cloned()
            .collect())
    }

    async fn update_portfolio(
        &self,
        id: Uuid,
        update: &PortfolioUpdate,
    ) -> Result<Portfolio, DatabaseError> {
        let mut tables = self.tables.write().await;
        let portfolio = tables
            .portfolios
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| portfolio_not_found(id))?;
        update.apply_to(portfolio);
        Ok(portfolio.clone())
    }

    async fn delete_portfolio(&self, id: Uuid) -> Result<Portfolio, DatabaseError> {
        let mut tables = self.tables.write().await;
        let index = tables
            .portfolios
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| portfolio_not_found(id))?;
        Ok(tables.portfolios.remove(index))
    }
}
