//! In-process cache backend

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::CacheBackend;
use crate::error::Result;

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    tags: Vec<String>,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Instant::now() >= at)
    }
}

/// Cache backend holding entries in a concurrent map
#[derive(Debug, Clone, Default)]
pub struct MemoryCacheBackend {
    entries: Arc<DashMap<String, Entry>>,
}

impl MemoryCacheBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live and expired-but-unreaped entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every expired entry
    pub fn purge_expired(&self) {
        self.entries.retain(|_, entry| !entry.is_expired());
    }
}

#[async_trait]
impl CacheBackend for MemoryCacheBackend {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        // The shard guard must be released before removing
        let found = self
            .entries
            .get(key)
            .map(|entry| (entry.is_expired(), entry.value.clone()));

        match found {
            Some((true, _)) => {
                // Only reap if no fresh value replaced it meanwhile
                self.entries.remove_if(key, |_, entry| entry.is_expired());
                Ok(None)
            }
            Some((false, value)) => Ok(Some(value)),
            None => Ok(None),
        }
    }

    async fn put(
        &self,
        key: &str,
        value: &str,
        tags: &[String],
        ttl: Option<Duration>,
    ) -> Result<()> {
        if ttl.is_some() {
            self.purge_expired();
        }

        self.entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                tags: tags.to_vec(),
                expires_at: ttl.map(|ttl| Instant::now() + ttl),
            },
        );
        Ok(())
    }

    async fn invalidate_tags(&self, tags: &[String]) -> Result<()> {
        self.entries
            .retain(|_, entry| !entry.tags.iter().any(|tag| tags.contains(tag)));
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
