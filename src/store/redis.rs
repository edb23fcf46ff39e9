use crate::core::error::RelayError;
use crate::providers::Message;
use crate::store::HistoryStore;
use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

fn conversation_key(user_id: i64) -> String {
    format!("conversation:{}", user_id)
}

/// Conversation store backed by Redis. Each user's history lives under one
/// key as a JSON-encoded message list, so a `SET` replaces the whole
/// sequence atomically and a `DEL` resets it.
#[derive(Clone)]
pub struct RedisStore {
    connection: ConnectionManager,
}

impl RedisStore {
    /// Connects and issues a `PING` so a bad address or password fails at
    /// startup instead of on the first user message.
    pub async fn connect(url: &str) -> Result<Self, RelayError> {
        let client = redis::Client::open(url)?;
        let mut connection = client.get_connection_manager().await?;

        redis::cmd("PING")
            .query_async::<()>(&mut connection)
            .await?;

        Ok(Self { connection })
    }
}

#[async_trait]
impl HistoryStore for RedisStore {
    async fn get(&self, user_id: i64) -> Result<Vec<Message>, RelayError> {
        let mut connection = self.connection.clone();
        let data: Option<String> = connection.get(conversation_key(user_id)).await?;

        match data {
            Some(json) => serde_json::from_str(&json)
                .map_err(|e| RelayError::Store(format!("Malformed history value: {}", e))),
            None => Ok(Vec::new()),
        }
    }

    async fn set(&self, user_id: i64, history: &[Message]) -> Result<(), RelayError> {
        let json = serde_json::to_string(history)?;
        let mut connection = self.connection.clone();
        let _: () = connection.set(conversation_key(user_id), json).await?;
        Ok(())
    }

    async fn clear(&self, user_id: i64) -> Result<(), RelayError> {
        let mut connection = self.connection.clone();
        let _: () = connection.del(conversation_key(user_id)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_includes_user_id() {
        assert_eq!(conversation_key(42), "conversation:42");
        assert_eq!(conversation_key(-7), "conversation:-7");
    }
}
