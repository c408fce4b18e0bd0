// src/cache/redis_client.rs
use async_trait::async_trait;
use redis::{Client, aio::ConnectionManager, AsyncCommands, RedisError};
use tracing::debug;
use crate::error::Result;
use crate::traits::KeyValueStore;

#[derive(Clone)]
pub struct RedisClient {
    manager: ConnectionManager,
}

impl RedisClient {
    pub async fn new(redis_url: &str) -> std::result::Result<Self, RedisError> {
        let client = Client::open(redis_url)?;
        let manager = ConnectionManager::new(client).await?;

        // Test connection
        let mut conn = manager.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;

        Ok(Self { manager })
    }
}

#[async_trait]
impl KeyValueStore for RedisClient {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.manager.clone();
        debug!("Redis GET: {}", key);
        Ok(conn.get(key).await?)
    }

    async fn set(&self, key: &str, value: &str, ttl_secs: u64) -> Result<()> {
        let mut conn = self.manager.clone();
        debug!("Redis SETEX: {} (TTL: {}s)", key, ttl_secs);
        conn.set_ex::<_, _, ()>(key, value, ttl_secs).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.manager.clone();
        debug!("Redis DEL: {}", key);
        conn.del::<_, ()>(key).await?;
        Ok(())
    }
}
