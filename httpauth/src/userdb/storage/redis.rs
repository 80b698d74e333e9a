use async_trait::async_trait;
use redis::{AsyncCommands, aio::MultiplexedConnection};
use tokio::sync::Mutex;

use crate::userdb::{backend::AuthBackend, errors::UserError, types::UserData};

use super::config::REDIS_USERS_KEY;

/// Document-store user backend: one JSON document per user, held as a field
/// of a single Redis hash
pub struct RedisAuthBackend {
    client: redis::Client,
    key: String,
    conn: Mutex<Option<MultiplexedConnection>>,
}

impl std::fmt::Debug for RedisAuthBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisAuthBackend")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

impl RedisAuthBackend {
    /// Use the hash named by `HTTPAUTH_REDIS_KEY`.
    pub fn open(url: &str) -> Result<Self, UserError> {
        Self::open_with_key(url, REDIS_USERS_KEY.as_str())
    }

    /// Parse `url`; no connection is made until first use.
    pub fn open_with_key(url: &str, key: &str) -> Result<Self, UserError> {
        let client = redis::Client::open(url)?;
        Ok(Self {
            client,
            key: key.to_string(),
            conn: Mutex::new(None),
        })
    }

    /// Cached multiplexed connection, established lazily.
    async fn connection(&self) -> Result<MultiplexedConnection, UserError> {
        let mut guard = self.conn.lock().await;
        if let Some(conn) = guard.as_ref() {
            return Ok(conn.clone());
        }

        let conn = self.client.get_multiplexed_async_connection().await?;
        tracing::debug!(key = %self.key, "Opened Redis connection");
        *guard = Some(conn.clone());
        Ok(conn)
    }
}

#[async_trait]
impl AuthBackend for RedisAuthBackend {
    async fn save_user(&self, user: UserData) -> Result<(), UserError> {
        let mut conn = self.connection().await?;
        let document = serde_json::to_string(&user)?;
        let _: () = conn.hset(&self.key, &user.username, document).await?;
        Ok(())
    }

    async fn user(&self, username: &str) -> Result<Option<UserData>, UserError> {
        let mut conn = self.connection().await?;
        let document: Option<String> = conn.hget(&self.key, username).await?;

        match document {
            Some(d) => Ok(Some(serde_json::from_str(&d)?)),
            None => Ok(None),
        }
    }

    async fn users(&self) -> Result<Vec<UserData>, UserError> {
        let mut conn = self.connection().await?;
        let documents: Vec<String> = conn.hvals(&self.key).await?;

        documents
            .iter()
            .map(|d| serde_json::from_str(d).map_err(UserError::from))
            .collect()
    }

    async fn delete_user(&self, username: &str) -> Result<(), UserError> {
        let mut conn = self.connection().await?;
        let removed: i64 = conn.hdel(&self.key, username).await?;

        if removed == 0 {
            return Err(UserError::DeleteMissing(username.to_string()));
        }
        Ok(())
    }

    async fn close(&self) {
        if self.conn.lock().await.take().is_some() {
            tracing::debug!(key = %self.key, "Closed Redis connection");
        }
    }
}
