// handlers/public/auth - token acquisition (no JWT required)

pub mod login;
pub mod register;

pub use login::login;
pub use register::register;

use crate::error::ApiError;

/// Treat absent and empty credentials the same way
fn require_field(value: Option<String>) -> Result<String, ApiError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::bad_request("Incomplete request"))
}
