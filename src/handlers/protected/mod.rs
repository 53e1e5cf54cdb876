// Handlers behind jwt_auth_middleware; `AuthUser` is always present in extensions

pub mod portfolios;
pub mod users;
