use std::result::Result as StdResult;

use thiserror::Error;

/// Unified error type for domain, storage, and service layers.
#[derive(Error, Debug)]
pub enum FarmError {
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Malformed record: {0}")]
    MalformedRecord(String),
    #[error("Persistence error: {0}")]
    Storage(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = StdResult<T, FarmError>;

impl FarmError {
    pub fn validation(message: impl Into<String>) -> Self {
        FarmError::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        FarmError::NotFound(message.into())
    }

    pub fn constraint(message: impl Into<String>) -> Self {
        FarmError::ConstraintViolation(message.into())
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        FarmError::MalformedRecord(message.into())
    }

    /// `NotFound` is reported to users but does not abort a workflow.
    pub fn is_not_found(&self) -> bool {
        matches!(self, FarmError::NotFound(_))
    }
}

impl From<std::io::Error> for FarmError {
    fn from(err: std::io::Error) -> Self {
        FarmError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for FarmError {
    fn from(err: serde_json::Error) -> Self {
        FarmError::Storage(err.to_string())
    }
}
