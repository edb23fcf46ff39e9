use crate::core::error::RelayError;
use crate::providers::Message;
use async_trait::async_trait;

pub mod redis;

pub use redis::RedisStore;

/// Per-user conversation history persistence. The dispatcher is the only
/// writer; an absent entry reads back as an empty history, never an error.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Returns the persisted history, or empty if no entry exists. Fails
    /// with `RelayError::Store` only when the backend is unreachable or the
    /// stored value is malformed.
    async fn get(&self, user_id: i64) -> Result<Vec<Message>, RelayError>;

    /// Overwrites the full history under the user's key in a single write.
    async fn set(&self, user_id: i64, history: &[Message]) -> Result<(), RelayError>;

    /// Removes the entry entirely. Clearing an absent history is a no-op.
    async fn clear(&self, user_id: i64) -> Result<(), RelayError>;
}
