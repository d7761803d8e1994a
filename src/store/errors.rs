//! # Store Error Types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Store unavailable during {operation}: {message}")]
    Unavailable { operation: String, message: String },

    #[error("Store query failed: {operation}: {message}")]
    Query { operation: String, message: String },

    #[error("Failed to decode job document: {message}")]
    Decode { message: String },

    #[error("Failed to serialize job document: {message}")]
    Serialization { message: String },
}

impl StoreError {
    pub fn unavailable(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Unavailable {
            operation: operation.into(),
            message: message.into(),
        }
    }

    pub fn query(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Query {
            operation: operation.into(),
            message: message.into(),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Classify a sqlx error raised while running `operation`
    pub fn from_sqlx(operation: &str, err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Io(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => Self::unavailable(operation, err.to_string()),
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                Self::decode(err.to_string())
            }
            other => Self::query(operation, other.to_string()),
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_data() || err.is_syntax() || err.is_eof() {
            Self::decode(err.to_string())
        } else {
            Self::Serialization {
                message: err.to_string(),
            }
        }
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
