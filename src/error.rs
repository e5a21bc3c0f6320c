//! Error types for finchat.

use thiserror::Error;

/// Common error type for finchat.
#[derive(Error, Debug)]
pub enum ChatError {
    /// Database error.
    ///
    /// Errors from sqlx are converted into this variant.
    #[error("database error: {0}")]
    Database(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Validation error for user input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Queue transport failure (publish, consume or a closed delivery stream).
    #[error("transport error: {0}")]
    Transport(String),

    /// A subscriber could not accept a broadcast message.
    #[error("delivery error: {0}")]
    Delivery(String),

    /// Payload could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Stock quote lookup failed.
    #[error("quote error: {0}")]
    Quote(String),
}

impl From<sqlx::Error> for ChatError {
    fn from(e: sqlx::Error) -> Self {
        ChatError::Database(e.to_string())
    }
}

impl From<serde_json::Error> for ChatError {
    fn from(e: serde_json::Error) -> Self {
        ChatError::Serialization(e.to_string())
    }
}

#[cfg(feature = "amqp")]
impl From<lapin::Error> for ChatError {
    fn from(e: lapin::Error) -> Self {
        ChatError::Transport(e.to_string())
    }
}

/// Result type alias for finchat operations.
pub type Result<T> = std::result::Result<T, ChatError>;
