//! Domain errors for the image comparison service.

use thiserror::Error;
use uuid::Uuid;

/// Domain-level errors that can occur while pairing images or recording judgments.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Need at least 2 images, found {found}")]
    NotEnoughImages { found: usize },

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Session not found: {0}")]
    SessionNotFound(Uuid),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl From<std::io::Error> for DomainError {
    fn from(err: std::io::Error) -> Self {
        DomainError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::Serialization(err.to_string())
    }
}
