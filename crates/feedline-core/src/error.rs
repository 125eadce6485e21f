//! Domain-level error types.

use thiserror::Error;

use crate::ports::{CacheError, RenderError};

/// Domain errors - business logic failures surfaced by the services.
///
/// Authorization failures are not errors here: they resolve to redirects
/// (see [`crate::view::Outcome`]).
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Store failure: {0}")]
    Store(#[from] RepoError),

    #[error("Cache failure: {0}")]
    Cache(#[from] CacheError),

    #[error("Rendering failed: {0}")]
    Render(#[from] RenderError),
}

impl DomainError {
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            entity,
            key: key.to_string(),
        }
    }
}

/// Repository-level errors.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Database connection failed: {0}")]
    Connection(String),

    #[error("Query execution failed: {0}")]
    Query(String),

    #[error("Entity not found")]
    NotFound,

    #[error("Constraint violation: {0}")]
    Constraint(String),
}
