pub mod portfolio;
pub mod user;

pub use portfolio::{
    CreatePortfolioRequest, FundEntry, Portfolio, PortfolioUpdate, UpdatePortfolioRequest,
};
pub use user::{LoginRequest, NewUser, RegisterRequest, TokenResponse, User};
