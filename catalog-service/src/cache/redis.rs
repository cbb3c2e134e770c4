//! Redis cache backend
//!
//! Each tag is a Redis set holding the (prefixed) keys attached to it. Values
//! and tag memberships are written in one atomic pipeline, and a tag is
//! dropped together with its members by a server-side script, so no write
//! can land between reading the members and deleting them.

use ::redis::{AsyncCommands, Script};
use async_trait::async_trait;
use deadpool_redis::{Config as DeadpoolConfig, Connection, Pool, Runtime};
use std::sync::LazyLock;
use std::time::Duration;

use super::CacheBackend;
use crate::config::RedisConfig;
use crate::error::{Error, Result};

/// Deletes every member of each tag set in KEYS, then the sets themselves.
/// Returns the number of entries removed.
static INVALIDATE_TAGS: LazyLock<Script> = LazyLock::new(|| {
    Script::new(
        r#"
local removed = 0
for _, tag in ipairs(KEYS) do
    local members = redis.call('SMEMBERS', tag)
    for i = 1, #members, 512 do
        removed = removed + redis.call('DEL', unpack(members, i, math.min(i + 511, #members)))
    end
    redis.call('DEL', tag)
end
return removed
"#,
    )
});

/// Cache backend on a deadpool-managed Redis pool
#[derive(Clone)]
pub struct RedisCacheBackend {
    pool: Pool,
    prefix: String,
}

impl RedisCacheBackend {
    pub fn new(pool: Pool, prefix: impl Into<String>) -> Self {
        Self {
            pool,
            prefix: prefix.into(),
        }
    }

    /// Connect with retries and build the backend
    pub async fn connect(config: &RedisConfig) -> Result<Self> {
        let pool = create_pool(config).await?;
        Ok(Self::new(pool, config.key_prefix.clone()))
    }

    fn entry_key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    fn tag_key(&self, tag: &str) -> String {
        format!("{}tag:{}", self.prefix, tag)
    }

    async fn connection(&self) -> Result<Connection> {
        self.pool
            .get()
            .await
            .map_err(|e| Error::Internal(format!("Failed to get Redis connection: {}", e)))
    }
}

#[async_trait]
impl CacheBackend for RedisCacheBackend {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.connection().await?;
        let value: Option<String> = conn.get(self.entry_key(key)).await?;
        Ok(value)
    }

    async fn put(
        &self,
        key: &str,
        value: &str,
        tags: &[String],
        ttl: Option<Duration>,
    ) -> Result<()> {
        let mut conn = self.connection().await?;
        let entry_key = self.entry_key(key);

        let mut pipe = ::redis::pipe();
        pipe.atomic();
        match ttl {
            Some(ttl) => pipe.set_ex(&entry_key, value, ttl.as_secs().max(1)).ignore(),
            None => pipe.set(&entry_key, value).ignore(),
        };
        for tag in tags {
            pipe.sadd(self.tag_key(tag), &entry_key).ignore();
        }

        pipe.query_async::<()>(&mut conn).await?;
        Ok(())
    }

    async fn invalidate_tags(&self, tags: &[String]) -> Result<()> {
        if tags.is_empty() {
            return Ok(());
        }

        let mut conn = self.connection().await?;
        let mut invocation = INVALIDATE_TAGS.prepare_invoke();
        for tag in tags {
            invocation.key(self.tag_key(tag));
        }

        let removed: i64 = invocation.invoke_async(&mut conn).await?;
        tracing::debug!(?tags, removed, "Redis tags invalidated");
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.connection().await?;
        ::redis::cmd("PING").query_async::<String>(&mut conn).await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}

/// Create a Redis connection pool, retrying with exponential backoff
pub(crate) async fn create_pool(config: &RedisConfig) -> Result<Pool> {
    let mut attempt = 0;
    let base_delay = Duration::from_secs(config.retry_delay_secs);

    loop {
        match try_create_pool(config).await {
            Ok(pool) => {
                if attempt > 0 {
                    tracing::info!(
                        "Redis connection established after {} attempt(s)",
                        attempt + 1
                    );
                } else {
                    tracing::info!(
                        "Redis connection pool created: max_connections={}",
                        config.max_connections
                    );
                }
                return Ok(pool);
            }
            Err(e) => {
                attempt += 1;

                if attempt > config.max_retries {
                    tracing::error!(
                        "Failed to connect to Redis after {} attempts: {}",
                        config.max_retries + 1,
                        e
                    );
                    return Err(e);
                }

                let delay = base_delay * 2_u32.pow(attempt.saturating_sub(1));

                tracing::warn!(
                    "Redis connection attempt {} failed: {}. Retrying in {:?}...",
                    attempt,
                    e,
                    delay
                );

                tokio::time::sleep(delay).await;
            }
        }
    }
}

async fn try_create_pool(config: &RedisConfig) -> Result<Pool> {
    let pool = DeadpoolConfig::from_url(&config.url)
        .builder()
        .map_err(|e| Error::Internal(format!("Failed to build Redis pool: {}", e)))?
        .max_size(config.max_connections)
        .runtime(Runtime::Tokio1)
        .build()
        .map_err(|e| Error::Internal(format!("Failed to create Redis pool: {}", e)))?;

    // Fail fast on an unreachable server
    let conn = pool
        .get()
        .await
        .map_err(|e| Error::Internal(format!("Failed to get Redis connection: {}", e)))?;
    drop(conn);

    Ok(pool)
}
