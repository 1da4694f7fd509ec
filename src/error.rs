//! Operation-level error taxonomy shared by every component.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompanionError {
    /// Missing, unknown or expired credentials. Callers must re-authenticate.
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// Storage, network or parse failure. Nothing was changed.
    #[error("Operation failed: {0}")]
    OperationFailed(#[from] anyhow::Error),
}

impl CompanionError {
    pub fn kind(&self) -> &'static str {
        match self {
            CompanionError::Unauthorized => "unauthorized",
            CompanionError::Forbidden(_) => "forbidden",
            CompanionError::NotFound(_) => "not_found",
            CompanionError::InvalidInput(_) => "invalid_input",
            CompanionError::Conflict(_) => "conflict",
            CompanionError::OperationFailed(_) => "operation_failed",
        }
    }
}

pub type CompanionResult<T> = std::result::Result<T, CompanionError>;
