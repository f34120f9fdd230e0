//! Redis Cache Backend
//!
//! Shared cache for multi-instance deployments. Expiry is enforced by Redis.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;

use crate::cache::store::CacheBackend;
use crate::error::Result;

// == Redis Backend ==
#[derive(Clone)]
pub struct RedisBackend {
    conn: ConnectionManager,
}

impl RedisBackend {
    // == Connect ==
    /// Opens a managed connection and checks it with a PING.
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)?;
        let mut conn = ConnectionManager::new(client).await?;
        redis::cmd("PING").query_async::<_, String>(&mut conn).await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl CacheBackend for RedisBackend {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        let value = redis::cmd("GET")
            .arg(key)
            .query_async::<_, Option<String>>(&mut conn)
            .await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
        let mut conn = self.conn.clone();
        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);

        // Redis rejects a zero expiry; an already-expired value must read as absent.
        if ttl_ms == 0 {
            redis::cmd("DEL").arg(key).query_async::<_, ()>(&mut conn).await?;
            return Ok(());
        }

        redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("PX")
            .arg(ttl_ms)
            .query_async::<_, ()>(&mut conn)
            .await?;
        Ok(())
    }
}
