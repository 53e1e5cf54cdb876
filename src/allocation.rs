//! Fund allocation rule for portfolios.
//!
//! A full fund list is only acceptable when its percentages add up to exactly
//! 100. Each percentage must be a base-10 integer in `0..=100`; anything else
//! is rejected as malformed instead of silently counting as zero.

use crate::models::FundEntry;

/// Required allocation sum for a complete fund list
pub const FULL_ALLOCATION: u64 = 100;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AllocationError {
    #[error("Fund allocations must sum to 100, got {total}")]
    InvalidAllocation { total: u64 },

    #[error("Fund '{symbol}' has a malformed percentage: '{value}'")]
    MalformedPercentage { symbol: String, value: String },
}

/// Returns true iff every percentage is well formed and they sum to exactly 100.
pub fn validate(funds: &[FundEntry]) -> bool {
    check(funds).is_ok()
}

/// Same rule as [`validate`], reporting why a fund list was rejected.
pub fn check(funds: &[FundEntry]) -> Result<(), AllocationError> {
    let total = funds.iter().try_fold(0u64, |acc, fund| {
        parse_percentage(fund).map(|pct| acc.saturating_add(pct))
    })?;

    if total != FULL_ALLOCATION {
        return Err(AllocationError::InvalidAllocation { total });
    }
    Ok(())
}

fn parse_percentage(fund: &FundEntry) -> Result<u64, AllocationError> {
    fund.portfolio_percentage
        .trim()
        .parse::<u64>()
        .ok()
        .filter(|pct| *pct <= FULL_ALLOCATION)
        .ok_or_else(|| AllocationError::MalformedPercentage {
            symbol: fund.symbol.clone(),
            value: fund.portfolio_percentage.clone(),
        })
}
