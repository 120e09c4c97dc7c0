//! Result and error types for the core library

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

/// Shared handle to the underlying cause of an internal error
///
/// Reference counted so that one failure can be handed to every caller
/// waiting on a deduplicated request.
pub type Cause = Arc<dyn std::error::Error + Send + Sync>;

/// Core library error type
#[derive(Error, Debug, Clone)]
pub enum Error {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Insufficient funds: balance {balance}, required {required}")]
    InsufficientFunds { balance: i64, required: i64 },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal error: {context}")]
    Internal {
        context: String,
        #[source]
        source: Option<Cause>,
    },
}

/// Classification of an [`Error`], as seen by the transport layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    InvalidCredentials,
    InsufficientFunds,
    Validation,
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::NotFound => "not found",
            ErrorKind::InvalidCredentials => "invalid credentials",
            ErrorKind::InsufficientFunds => "insufficient funds",
            ErrorKind::Validation => "validation",
            ErrorKind::Internal => "internal",
        };
        f.write_str(name)
    }
}

impl Error {
    /// Create a not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Wrap an underlying failure as an internal error
    pub fn internal<E>(context: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Internal {
            context: context.into(),
            source: Some(Arc::new(source)),
        }
    }

    /// Internal error with no underlying cause
    pub fn internal_msg(context: impl Into<String>) -> Self {
        Self::Internal {
            context: context.into(),
            source: None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::InvalidCredentials => ErrorKind::InvalidCredentials,
            Error::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            Error::Validation(_) => ErrorKind::Validation,
            Error::Internal { .. } => ErrorKind::Internal,
        }
    }
}

impl From<duckdb::Error> for Error {
    fn from(err: duckdb::Error) -> Self {
        Self::internal("storage operation failed", err)
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::internal("storage worker did not complete", err)
    }
}

/// Core library result type
pub type Result<T> = std::result::Result<T, Error>;
