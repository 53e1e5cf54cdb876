pub mod protected;
pub mod public;

use uuid::Uuid;

use crate::error::ApiError;

/// Parse a record id from a path segment, rejecting malformed ids with 400
pub(crate) fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::bad_request(format!("Invalid id: {}", raw)))
}

/// Run CPU-heavy work (password hashing) off the async workers
pub(crate) async fn run_blocking<T, F>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work).await.map_err(|e| {
        tracing::error!("Blocking task failed: {}", e);
        ApiError::internal_server_error("Something went wrong")
    })
}
