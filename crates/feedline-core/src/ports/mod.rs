//! Ports - trait definitions for external dependencies.
//! These are the "interfaces" that infrastructure must implement.

mod auth;
mod cache;
mod render;
mod store;

pub use auth::{AuthError, TokenClaims, TokenService};
pub use cache::{Cache, CacheError};
pub use render::{RenderError, Renderer};
pub use store::{EntityStore, FeedAnchor, FeedScope, FeedSnapshot, PostThread};
