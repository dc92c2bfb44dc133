//! Redis-backed ephemeral store
//!
//! Shared revocation and rate-limit state for multi-node deployments. Every
//! trait method maps to a single Redis command, so atomicity comes from the
//! server rather than from caller-side read-then-write sequences.

use async_trait::async_trait;
use redis::{aio::MultiplexedConnection, Client};
use std::time::Duration;
use tokio::time::timeout;

use crate::domain::error::{Error, Result};
use crate::domain::ports::EphemeralStore;
use crate::infrastructure::constants::STORE_CONNECT_TIMEOUT;

/// Redis provider for the shared ephemeral store
pub struct RedisStore {
    client: Client,
}

impl RedisStore {
    /// Create a new Redis store provider.
    ///
    /// # Arguments
    /// * `url` - Redis connection URL (e.g., "redis://localhost:6379")
    ///
    /// # Errors
    /// Returns an error if the client cannot be created or the server does
    /// not answer an initial `PING`.
    pub async fn new(url: &str) -> Result<Self> {
        tracing::info!("[STORE] Initializing Redis provider: {}", url);

        let client = Client::open(url)
            .map_err(|e| Error::store(format!("failed to create redis client: {e}")))?;

        let mut conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| Error::store(format!("failed to connect to redis at {url}: {e}")))?;

        let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        if pong != "PONG" {
            return Err(Error::store("redis ping did not return pong"));
        }

        tracing::info!("[STORE] Redis connection established");

        Ok(Self { client })
    }

    /// Get a Redis connection with a bounded wait
    async fn get_connection(&self) -> Result<MultiplexedConnection> {
        timeout(
            STORE_CONNECT_TIMEOUT,
            self.client.get_multiplexed_async_connection(),
        )
        .await
        .map_err(|_| {
            Error::store(format!(
                "redis connection timeout after {}s; check server availability",
                STORE_CONNECT_TIMEOUT.as_secs()
            ))
        })?
        .map_err(|e| Error::store(format!("failed to establish redis connection: {e}")))
    }
}

#[async_trait]
impl EphemeralStore for RedisStore {
    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let mut conn = self.get_connection().await?;

        redis::cmd("SETEX")
            .arg(key)
            .arg(ttl.as_secs())
            .arg(value)
            .query_async::<()>(&mut conn)
            .await
            .map_err(|e| {
                tracing::warn!("[STORE] Redis SETEX failed for {}: {}", key, e);
                Error::from(e)
            })
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.get_connection().await?;

        let value: Option<String> = redis::cmd("GET").arg(key).query_async(&mut conn).await?;
        Ok(value)
    }

    async fn get_del(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.get_connection().await?;

        let value: Option<String> = redis::cmd("GETDEL").arg(key).query_async(&mut conn).await?;
        Ok(value)
    }

    async fn del(&self, key: &str) -> Result<()> {
        let mut conn = self.get_connection().await?;

        redis::cmd("DEL")
            .arg(key)
            .query_async::<()>(&mut conn)
            .await
            .map_err(|e| {
                tracing::warn!("[STORE] Redis DEL failed for {}: {}", key, e);
                Error::from(e)
            })
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let mut conn = self.get_connection().await?;

        let found: i64 = redis::cmd("EXISTS").arg(key).query_async(&mut conn).await?;
        Ok(found == 1)
    }

    async fn incr(&self, key: &str) -> Result<i64> {
        let mut conn = self.get_connection().await?;

        let count: i64 = redis::cmd("INCR").arg(key).query_async(&mut conn).await?;
        Ok(count)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<()> {
        let mut conn = self.get_connection().await?;

        redis::cmd("EXPIRE")
            .arg(key)
            .arg(ttl.as_secs())
            .query_async::<()>(&mut conn)
            .await
            .map_err(|e| {
                tracing::warn!("[STORE] Redis EXPIRE failed for {}: {}", key, e);
                Error::from(e)
            })
    }
}
