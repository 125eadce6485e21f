//! Application state - shared across all handlers.

use std::sync::Arc;

use feedline_core::feed_cache::GlobalFeedCache;
use feedline_core::ports::{Cache, EntityStore, Renderer, TokenService};
use feedline_core::services::{MutationService, ReadService};
use feedline_infra::{InMemoryCache, InMemoryEntityStore, JsonRenderer, JwtTokenService};

use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub reads: Arc<ReadService>,
    pub mutations: Arc<MutationService>,
    pub feed_cache: GlobalFeedCache,
    pub renderer: Arc<dyn Renderer>,
    pub tokens: Arc<dyn TokenService>,
    pub store_backend: &'static str,
    pub cache_backend: &'static str,
}

impl AppState {
    /// Connect the configured backends, falling back to in-memory ones.
    pub async fn new(config: &AppConfig) -> Self {
        let (store, store_backend) = init_store(config).await;
        let cache = init_cache(config).await;
        let tokens: Arc<dyn TokenService> = Arc::new(JwtTokenService::new(config.jwt.clone()));

        let state = Self::from_parts(store, cache, tokens, Arc::new(JsonRenderer), config);
        let state = Self {
            store_backend,
            ..state
        };

        tracing::info!(
            store = state.store_backend,
            cache = state.cache_backend,
            "Application state initialized"
        );
        state
    }

    /// Wire the services over explicit backends.
    pub fn from_parts(
        store: Arc<dyn EntityStore>,
        cache: Arc<dyn Cache>,
        tokens: Arc<dyn TokenService>,
        renderer: Arc<dyn Renderer>,
        config: &AppConfig,
    ) -> Self {
        let cache_backend = cache.backend();
        let feed_cache = GlobalFeedCache::new(cache, config.feed_cache_ttl);

        Self {
            reads: Arc::new(ReadService::new(
                store.clone(),
                feed_cache.clone(),
                renderer.clone(),
                config.login_url.clone(),
            )),
            mutations: Arc::new(MutationService::new(
                store,
                feed_cache.clone(),
                config.login_url.clone(),
            )),
            feed_cache,
            renderer,
            tokens,
            store_backend: "memory",
            cache_backend,
        }
    }
}

#[cfg(feature = "postgres")]
async fn init_store(config: &AppConfig) -> (Arc<dyn EntityStore>, &'static str) {
    use feedline_infra::PostgresEntityStore;
    use feedline_infra::database::connect;
    use migration::{Migrator, MigratorTrait};

    let Some(db_config) = &config.database else {
        tracing::warn!("DATABASE_URL not set. Running on the in-memory store.");
        return (Arc::new(InMemoryEntityStore::new()), "memory");
    };

    let db = match connect(db_config).await {
        Ok(db) => db,
        Err(e) => {
            tracing::error!("Failed to connect to database: {}. Using in-memory fallback.", e);
            return (Arc::new(InMemoryEntityStore::new()), "memory");
        }
    };

    if config.run_migrations {
        match Migrator::up(&db, None).await {
            Ok(()) => tracing::info!("Database migrations applied"),
            Err(e) => tracing::error!(error = %e, "Failed to apply database migrations"),
        }
    }

    (Arc::new(PostgresEntityStore::new(db)), "postgres")
}

#[cfg(not(feature = "postgres"))]
async fn init_store(_config: &AppConfig) -> (Arc<dyn EntityStore>, &'static str) {
    tracing::info!("Running without postgres feature - using the in-memory store");
    (Arc::new(InMemoryEntityStore::new()), "memory")
}

#[cfg(feature = "redis")]
async fn init_cache(config: &AppConfig) -> Arc<dyn Cache> {
    use feedline_infra::{NoopCache, RedisCache};

    let Some(redis_config) = &config.redis else {
        return Arc::new(InMemoryCache::new());
    };

    match RedisCache::new(redis_config).await {
        Ok(cache) => Arc::new(cache),
        Err(e) if redis_config.fallback_to_memory => {
            tracing::error!(error = %e, "Redis unavailable. Using in-memory cache.");
            Arc::new(InMemoryCache::new())
        }
        Err(e) => {
            tracing::error!(error = %e, "Redis unavailable. Global feed caching disabled.");
            Arc::new(NoopCache)
        }
    }
}

#[cfg(not(feature = "redis"))]
async fn init_cache(_config: &AppConfig) -> Arc<dyn Cache> {
    Arc::new(InMemoryCache::new())
}
