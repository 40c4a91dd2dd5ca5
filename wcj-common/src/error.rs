//! Common error types for WC Journey

use thiserror::Error;

/// Common result type for WC Journey operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across WC Journey tools
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or parameter value
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    /// Whether the store itself is unreachable, as opposed to a single
    /// statement being rejected.
    pub fn is_connection(&self) -> bool {
        match self {
            Error::Database(err) => is_connection_error(err),
            _ => false,
        }
    }
}

/// Classify an sqlx error as a transport/connection failure.
pub fn is_connection_error(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::Protocol(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed
    )
}
