use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::repository::{portfolio_not_found, user_not_found, Store};
use crate::models::{FundEntry, NewUser, Portfolio, PortfolioUpdate, User};

const USER_COLUMNS: &str = r#"
    u.id, u.username, u.password, u.email, u.created_at,
    ARRAY(
        SELECT p.id FROM portfolios p
        WHERE p.user_id = u.id
        ORDER BY p.created_at, p.id
    ) AS portfolios
"#;

const PORTFOLIO_COLUMNS: &str = "id, name, funds, user_id";

#[derive(FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    password: String,
    email: String,
    portfolios: Vec<Uuid>,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            username: row.username,
            password: row.password,
            email: row.email,
            portfolios: row.portfolios,
            created_at: row.created_at,
        }
    }
}

#[derive(FromRow)]
struct PortfolioRow {
    id: Uuid,
    name: String,
    funds: Json<Vec<FundEntry>>,
    user_id: Uuid,
}

impl From<PortfolioRow> for Portfolio {
    fn from(row: PortfolioRow) -> Self {
        Portfolio {
            id: row.id,
            name: row.name,
            funds: row.funds.0,
            user: row.user_id,
        }
    }
}

/// PostgreSQL-backed store. Funds are kept as a JSONB array on the portfolio row.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn select_user(&self, filter: &str, value: &str) -> Result<Option<User>, DatabaseError> {
        let sql = format!("SELECT {} FROM users u WHERE {}", USER_COLUMNS, filter);
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(User::from))
    }
}

#[async_trait]
impl Store for PgStore {
    async fn health_check(&self) -> Result<(), DatabaseError> {
        DatabaseManager::health_check(&self.pool).await
    }

    async fn create_user(&self, user: NewUser) -> Result<User, DatabaseError> {
        let user = user.into_user();
        sqlx::query(
            "INSERT INTO users (id, username, password, email, created_at) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.password)
        .bind(&user.email)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_write(e, "User"))?;

        Ok(user)
    }

    async fn get_user(&self, id: Uuid) -> Result<User, DatabaseError> {
        let sql = format!("SELECT {} FROM users u WHERE u.id = $1", USER_COLUMNS);
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(User::from)
            .ok_or_else(|| user_not_found(id))
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError> {
        self.select_user("u.username = $1", username).await
    }

    async fn user_exists(&self, username: &str, email: &str) -> Result<bool, DatabaseError> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM users WHERE username = $1 OR ($2 <> '' AND email = $2)",
        )
        .bind(username)
        .bind(email)
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }

    async fn list_users(&self) -> Result<Vec<User>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM users u ORDER BY u.created_at, u.id",
            USER_COLUMNS
        );
        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn delete_user(&self, id: Uuid) -> Result<User, DatabaseError> {
        let user = self.get_user(id).await?;
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        // Lost a race with a concurrent delete
        if result.rows_affected() == 0 {
            return Err(user_not_found(id));
        }
        Ok(user)
    }

    async fn create_portfolio(
        &self,
        owner: Uuid,
        name: String,
        funds: Vec<FundEntry>,
    ) -> Result<Portfolio, DatabaseError> {
        let sql = format!(
            "INSERT INTO portfolios (id, name, funds, user_id) VALUES ($1, $2, $3, $4) RETURNING {}",
            PORTFOLIO_COLUMNS
        );
        let row = sqlx::query_as::<_, PortfolioRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(name)
            .bind(Json(funds))
            .bind(owner)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DatabaseError::from_write(e, "Portfolio"))?;

        Ok(row.into())
    }

    async fn get_portfolio(&self, id: Uuid) -> Result<Portfolio, DatabaseError> {
        let sql = format!("SELECT {} FROM portfolios WHERE id = $1", PORTFOLIO_COLUMNS);
        sqlx::query_as::<_, PortfolioRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Portfolio::from)
            .ok_or_else(|| portfolio_not_found(id))
    }

    async fn list_portfolios_by_user(&self, owner: Uuid) -> Result<Vec<Portfolio>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM portfolios WHERE user_id = $1 ORDER BY created_at, id",
            PORTFOLIO_COLUMNS
        );
        let rows = sqlx::query_as::<_, PortfolioRow>(&sql)
            .bind(owner)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Portfolio::from).collect())
    }

    async fn update_portfolio(
        &self,
        id: Uuid,
        update: &PortfolioUpdate,
    ) -> Result<Portfolio, DatabaseError> {
        let sql = format!(
            "UPDATE portfolios SET name = COALESCE($2, name), funds = COALESCE($3, funds) \
             WHERE id = $1 RETURNING {}",
            PORTFOLIO_COLUMNS
        );
        sqlx::query_as::<_, PortfolioRow>(&sql)
            .bind(id)
            .bind(update.name.as_deref())
            .bind(update.funds.as_ref().map(Json))
            .fetch_optional(&self.pool)
            .await?
            .map(Portfolio::from)
            .ok_or_else(|| portfolio_not_found(id))
    }

    async fn delete_portfolio(&self, id: Uuid) -> Result<Portfolio, DatabaseError> {
        let sql = format!("DELETE FROM portfolios WHERE id = $1 RETURNING {}", PORTFOLIO_COLUMNS);
        sqlx::query_as::<_, PortfolioRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Portfolio::from)
            .ok_or_else(|| portfolio_not_found(id))
    }
}
