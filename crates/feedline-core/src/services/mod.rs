//! Request-level services on top of the store, the cache and the guard.

mod mutations;
mod reads;

pub use mutations::MutationService;
pub use reads::{ReadService, RenderedPage};
