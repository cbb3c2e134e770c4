//! Tag-invalidated read cache
//!
//! [`TagCache`] wraps a read that produces a serialized JSON payload. The
//! payload is stored under a key describing the query shape and attached to
//! one or more tags; invalidating a tag drops every entry carrying it.
//!
//! Reads fail open: when the backend errors, the wrapped read runs directly.
//! Invalidation fails closed: a backend error is returned to the caller as
//! [`Error::CacheUnavailable`] so the write can be aborted.

use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{Error, Result};

pub mod memory;
pub mod redis;

pub use memory::MemoryCacheBackend;
pub use self::redis::RedisCacheBackend;

/// Storage for cached payloads and their tag associations
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Stored payload for `key`, if any
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key` and attach it to every tag
    async fn put(
        &self,
        key: &str,
        value: &str,
        tags: &[String],
        ttl: Option<Duration>,
    ) -> Result<()>;

    /// Remove every entry attached to any of `tags`
    ///
    /// Invalidating a tag with no entries is a no-op.
    async fn invalidate_tags(&self, tags: &[String]) -> Result<()>;

    /// Check the backend is reachable
    async fn ping(&self) -> Result<()>;

    /// Short backend name for logs and readiness output
    fn name(&self) -> &'static str;
}

/// Cache keys and tags for every cached read
pub mod keys {
    use crate::pagination::PageRequest;

    /// Tag shared by every product listing
    pub const PRODUCTS_TAG: &str = "productsCache";

    pub fn products_page(page: &PageRequest) -> String {
        format!("{}-{}-{}", PRODUCTS_TAG, page.page(), page.limit())
    }

    /// Tag shared by every user listing of one client
    pub fn users_tag(client_id: i64) -> String {
        format!("userCache-{}", client_id)
    }

    pub fn users_page(client_id: i64, page: &PageRequest) -> String {
        format!("{}-{}-{}", users_tag(client_id), page.page(), page.limit())
    }
}

/// Read-through cache with tag invalidation
#[derive(Clone)]
pub struct TagCache {
    backend: Arc<dyn CacheBackend>,
    ttl: Option<Duration>,
}

impl TagCache {
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self { backend, ttl: None }
    }

    /// Cache backed by an in-process map
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryCacheBackend::new()))
    }

    /// Expire entries after `ttl` in addition to tag invalidation
    pub fn with_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.ttl = ttl;
        self
    }

    /// Return the payload cached under `key`, or run `load` and cache its result
    pub async fn get_or_insert_with<F, Fut>(
        &self,
        key: &str,
        tags: &[String],
        load: F,
    ) -> Result<String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String>>,
    {
        match self.backend.get(key).await {
            Ok(Some(payload)) => {
                tracing::debug!(key, "Cache hit");
                return Ok(payload);
            }
            Ok(None) => {
                tracing::debug!(key, "Cache miss");
            }
            Err(e) => {
                tracing::warn!(
                    key,
                    backend = self.backend.name(),
                    "Cache read failed, reading from store: {}",
                    e
                );
                return load().await;
            }
        }

        let payload = load().await?;

        if let Err(e) = self.backend.put(key, &payload, tags, self.ttl).await {
            tracing::warn!(
                key,
                backend = self.backend.name(),
                "Cache write failed, serving uncached payload: {}",
                e
            );
        }

        Ok(payload)
    }

    /// Drop every entry attached to any of `tags`
    pub async fn invalidate_tags(&self, tags: &[String]) -> Result<()> {
        self.backend.invalidate_tags(tags).await.map_err(|e| {
            tracing::error!(
                ?tags,
                backend = self.backend.name(),
                "Cache invalidation failed: {}",
                e
            );
            Error::CacheUnavailable(e.to_string())
        })?;

        tracing::debug!(?tags, "Cache tags invalidated");
        Ok(())
    }

    pub async fn ping(&self) -> Result<()> {
        self.backend.ping().await
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }
}
