//! Model error types.

use thiserror::Error;

pub type ModelResult<T> = Result<T, ModelError>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("Unknown channel: {0}")]
    UnknownChannel(String),

    #[error("Unknown platform: {0}")]
    UnknownPlatform(String),

    #[error("Unknown aggregation policy: {0}")]
    UnknownPolicy(String),

    #[error("Invalid day key: {0}")]
    InvalidDayKey(String),

    #[error("Scheduled time must be within the next {0} days")]
    ScheduleTooFar(i64),
}
