use std::fmt;

use crate::store::StoreError;

#[derive(Debug, Clone, PartialEq)]
pub enum PolyjobError {
    StoreError(String),
    StateTransitionError(String),
    ProcessingError(String),
    ConfigurationError(String),
    ValidationError(String),
}

impl fmt::Display for PolyjobError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolyjobError::StoreError(msg) => write!(f, "Store error: {msg}"),
            PolyjobError::StateTransitionError(msg) => write!(f, "State transition error: {msg}"),
            PolyjobError::ProcessingError(msg) => write!(f, "Processing error: {msg}"),
            PolyjobError::ConfigurationError(msg) => write!(f, "Configuration error: {msg}"),
            PolyjobError::ValidationError(msg) => write!(f, "Validation error: {msg}"),
        }
    }
}

impl std::error::Error for PolyjobError {}

impl From<StoreError> for PolyjobError {
    fn from(err: StoreError) -> Self {
        PolyjobError::StoreError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PolyjobError>;
