//! Entity store implementations that need no external service.

mod memory;

pub use memory::InMemoryEntityStore;
