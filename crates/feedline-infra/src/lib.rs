//! # Feedline Infrastructure
//!
//! Concrete implementations of the ports defined in `feedline-core`.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - No external dependencies, in-memory only
//! - `postgres` - PostgreSQL entity store via SeaORM
//! - `auth` - JWT identity tokens
//! - `redis` - Redis cache backend

pub mod cache;
pub mod render;
pub mod store;

#[cfg(feature = "postgres")]
pub mod database;

#[cfg(feature = "auth")]
pub mod auth;

// Re-exports - In-Memory
pub use cache::{InMemoryCache, NoopCache};
pub use render::JsonRenderer;
pub use store::InMemoryEntityStore;

#[cfg(feature = "postgres")]
pub use database::{DatabaseConfig, PostgresEntityStore};

#[cfg(feature = "auth")]
pub use auth::{JwtConfig, JwtTokenService};

#[cfg(feature = "redis")]
pub use cache::{RedisCache, RedisConfig};
