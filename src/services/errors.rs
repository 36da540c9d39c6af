use thiserror::Error;

use crate::repository::RepositoryError;
use crate::storage::StorageError;

/// Result type returned by service functions.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors surfaced to the HTTP layer.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The requested product does not exist.
    #[error("not found")]
    NotFound,
    /// Another request modified the product while it was being updated.
    #[error("product was modified concurrently")]
    Conflict,
    /// The request payload failed validation.
    #[error("{0}")]
    Form(String),
    /// An attachment could not be written.
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// Any other failure of the underlying stores.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<RepositoryError> for ServiceError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::NotFound => ServiceError::NotFound,
            RepositoryError::ConcurrencyConflict => ServiceError::Conflict,
            other => ServiceError::Internal(other.to_string()),
        }
    }
}
