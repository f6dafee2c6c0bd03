use thiserror::Error;
use tokio::io;

use crate::storage::StorageError;

pub type ServiceResult<T> = core::result::Result<T, ServiceError>;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Recoverable problem with what the user entered.
    #[error("{0}")]
    Input(String),
    /// Fatal misconfiguration, reported before any request is attempted.
    #[error("configuration error: {0}")]
    Config(String),
    #[error("network error: {0}")]
    NetworkError(String),
    #[error("API error: {0}")]
    ApiError(String),
    #[error("{0}")]
    Storage(#[from] StorageError),
    #[error("{0}")]
    IoError(#[from] io::Error),
    #[error("{0}")]
    SerdeJsonError(#[from] serde_json::Error),
    #[error("{0}")]
    Dialog(#[from] dialoguer::Error),
    #[error("{0}")]
    FromString(String),
}

impl ServiceError {
    pub fn is_input(&self) -> bool {
        matches!(self, ServiceError::Input(_))
    }
}
