//! Configuration error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),

    #[error("Invalid value for {field} ({value}): {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

impl ConfigurationError {
    pub fn invalid_value(
        field: impl Into<String>,
        value: String,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            field: field.into(),
            value,
            reason: reason.into(),
        }
    }
}

impl From<ConfigurationError> for crate::error::PolyjobError {
    fn from(err: ConfigurationError) -> Self {
        crate::error::PolyjobError::ConfigurationError(err.to_string())
    }
}

pub type ConfigResult<T> = std::result::Result<T, ConfigurationError>;
