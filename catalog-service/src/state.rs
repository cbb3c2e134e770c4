//! Application state shared across handlers

use std::sync::Arc;
use std::time::Duration;

use crate::{
    auth::{PasswordHasher, TokenService},
    cache::{RedisCacheBackend, TagCache},
    config::Config,
    database,
    error::Result,
    fixtures,
    repository::{Datastore, MemoryStore, PgStore},
};

/// Everything a handler needs, cloned into each request
///
/// Every field is reference counted, so cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    store: Arc<dyn Datastore>,
    cache: TagCache,
    hasher: PasswordHasher,
    tokens: TokenService,
}

impl AppState {
    /// Assemble state from already-built collaborators
    pub fn new(config: Config, store: Arc<dyn Datastore>, cache: TagCache) -> Result<Self> {
        let hasher = PasswordHasher::new(&config.password)?;
        let tokens = TokenService::from_config(&config.jwt)?;

        Ok(Self {
            config: Arc::new(config),
            store,
            cache,
            hasher,
            tokens,
        })
    }

    /// Connect the configured backends
    ///
    /// PostgreSQL and Redis are used when their sections are present. Without
    /// a database the in-memory store is used, seeded with the fixture
    /// dataset when `fixtures.seed_in_memory` is set. Without Redis the cache
    /// lives in process.
    pub async fn build(config: Config) -> Result<Self> {
        let store: Arc<dyn Datastore> = match &config.database {
            Some(db_config) => {
                let pool = database::create_pool(db_config).await?;
                if db_config.run_migrations {
                    database::run_migrations(&pool).await?;
                }
                Arc::new(PgStore::new(pool))
            }
            None => {
                tracing::warn!("No database configured, using the in-memory store");
                Arc::new(MemoryStore::new())
            }
        };

        let cache = match &config.redis {
            Some(redis_config) => {
                let backend = RedisCacheBackend::connect(redis_config).await?;
                TagCache::new(Arc::new(backend))
                    .with_ttl(redis_config.ttl_secs.map(Duration::from_secs))
            }
            None => {
                tracing::info!("No Redis configured, caching in process");
                TagCache::in_memory()
            }
        };

        let seed = config.database.is_none() && config.fixtures.seed_in_memory;
        let state = Self::new(config, store, cache)?;

        if seed {
            fixtures::load(state.store(), state.cache(), state.hasher()).await?;
        }

        tracing::info!(
            store = state.store.name(),
            cache = state.cache.backend_name(),
            "Application state ready"
        );

        Ok(state)
    }

    /// In-memory store and cache, without fixtures
    pub fn in_memory(config: Config) -> Result<Self> {
        Self::new(config, Arc::new(MemoryStore::new()), TagCache::in_memory())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &dyn Datastore {
        self.store.as_ref()
    }

    pub fn cache(&self) -> &TagCache {
        &self.cache
    }

    pub fn hasher(&self) -> &PasswordHasher {
        &self.hasher
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }
}
