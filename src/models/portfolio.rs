use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single ticker/percentage pair held inside a portfolio.
///
/// The percentage travels as a decimal-digit string on the wire
/// (`"portfolioPercentage": "80"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundEntry {
    pub symbol: String,
    pub portfolio_percentage: String,
}

impl FundEntry {
    pub fn new(symbol: impl Into<String>, portfolio_percentage: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            portfolio_percentage: portfolio_percentage.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Portfolio {
    pub id: Uuid,
    pub name: String,
    pub funds: Vec<FundEntry>,
    /// Owning user id
    pub user: Uuid,
}

/// POST /portfolios body. `funds` stays optional so a missing field can be
/// told apart from an empty list.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePortfolioRequest {
    #[serde(default)]
    pub name: String,
    pub funds: Option<Vec<FundEntry>>,
}

/// PUT /portfolios/:id body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePortfolioRequest {
    #[serde(default)]
    pub updated_fields: PortfolioUpdate,
}

/// Fields that may be replaced independently on an existing portfolio.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioUpdate {
    pub name: Option<String>,
    pub funds: Option<Vec<FundEntry>>,
}

impl PortfolioUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.funds.is_none()
    }

    /// Apply the present fields onto `portfolio`, leaving absent ones untouched.
    pub fn apply_to(&self, portfolio: &mut Portfolio) {
        if let Some(name) = &self.name {
            portfolio.name = name.clone();
        }
        if let Some(funds) = &self.funds {
            portfolio.funds = funds.clone();
        }
    }
}
