//! Application configuration loaded from environment variables.

use std::env;
use std::time::Duration;

use feedline_infra::JwtConfig;
#[cfg(feature = "postgres")]
use feedline_infra::DatabaseConfig;
#[cfg(feature = "redis")]
use feedline_infra::RedisConfig;

const DEFAULT_FEED_CACHE_TTL_SECS: u64 = 20;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// `None` runs on the in-memory store.
    #[cfg(feature = "postgres")]
    pub database: Option<DatabaseConfig>,
    #[cfg(feature = "postgres")]
    pub run_migrations: bool,
    /// `None` runs on the in-memory cache.
    #[cfg(feature = "redis")]
    pub redis: Option<RedisConfig>,
    /// Lifetime of each cached global feed page; `None` keeps pages until invalidated.
    pub feed_cache_ttl: Option<Duration>,
    pub login_url: String,
    pub jwt: JwtConfig,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let ttl_secs = env::var("FEED_CACHE_TTL_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_FEED_CACHE_TTL_SECS);

        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            #[cfg(feature = "postgres")]
            database: DatabaseConfig::from_env(),
            #[cfg(feature = "postgres")]
            run_migrations: migrations_enabled(env::var("RUN_MIGRATIONS").ok().as_deref()),
            #[cfg(feature = "redis")]
            redis: env::var("REDIS_URL").ok().map(|_| RedisConfig::from_env()),
            feed_cache_ttl: (ttl_secs > 0).then(|| Duration::from_secs(ttl_secs)),
            login_url: env::var("LOGIN_URL").unwrap_or_else(|_| "/auth/login/".to_string()),
            jwt: JwtConfig::from_env(),
        }
    }
}

/// `RUN_MIGRATIONS` is on unless set to `false` or `0`.
#[cfg(feature = "postgres")]
fn migrations_enabled(raw: Option<&str>) -> bool {
    raw.is_none_or(|v| v != "false" && v != "0")
}

impl Default for AppConfig {
    /// Local defaults: in-memory backends, no environment lookups.
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            #[cfg(feature = "postgres")]
            database: None,
            #[cfg(feature = "postgres")]
            run_migrations: false,
            #[cfg(feature = "redis")]
            redis: None,
            feed_cache_ttl: Some(Duration::from_secs(DEFAULT_FEED_CACHE_TTL_SECS)),
            login_url: "/auth/login/".to_string(),
            jwt: JwtConfig::default(),
        }
    }
}
