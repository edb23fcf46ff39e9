use std::io;
use thiserror::Error;

/// Unified error type for the relay bot
#[derive(Error, Debug)]
pub enum RelayError {
    /// Conversation store unreachable or holding a malformed value
    #[error("Store error: {0}")]
    Store(String),

    /// Completion API transport, status, or response-shape failure
    #[error("Completion error: {0}")]
    Completion(String),

    /// Configuration-related errors, fatal at startup
    #[error("Configuration error: {0}")]
    Config(String),

    /// Telegram Bot API transport failure
    #[error("Telegram error: {0}")]
    Telegram(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO-related errors
    #[error("IO error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl From<redis::RedisError> for RelayError {
    fn from(err: redis::RedisError) -> Self {
        RelayError::Store(format!("Redis error: {}", err))
    }
}

impl From<serde_json::Error> for RelayError {
    fn from(err: serde_json::Error) -> Self {
        RelayError::Serialization(format!("JSON error: {}", err))
    }
}
