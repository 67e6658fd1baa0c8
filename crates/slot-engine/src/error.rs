//! Error types for slot-engine operations.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Unknown business: {0}")]
    UnknownBusiness(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Store error: {0}")]
    Store(String),
}

impl EngineError {
    /// Whether the caller should report this as a client-side (4xx) failure.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            EngineError::InvalidRequest(_) | EngineError::UnknownBusiness(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
