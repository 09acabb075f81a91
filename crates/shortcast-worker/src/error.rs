//! Worker error types.

use thiserror::Error;

use shortcast_models::ModelError;
use shortcast_store::StoreError;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Admission rejected: {0}")]
    Admission(String),

    #[error("Validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Invalid job data: {0}")]
    Model(#[from] ModelError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl WorkerError {
    pub fn admission(msg: impl Into<String>) -> Self {
        Self::Admission(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Backend I/O failures. These abort a dispatch cycle; anything else
    /// only fails the job at hand.
    pub fn is_storage(&self) -> bool {
        matches!(self, WorkerError::Store(e) if e.is_io())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, WorkerError::Store(e) if e.is_not_found())
    }
}
