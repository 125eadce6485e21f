//! # Feedline Core
//!
//! The domain layer of the Feedline blogging platform: entities, ports,
//! feed composition, pagination, the global-feed cache service, the
//! authorization guard and the read/mutation services built on top of them.
//! This crate has no infrastructure dependencies.

pub mod authz;
pub mod domain;
pub mod error;
pub mod feed;
pub mod feed_cache;
pub mod forms;
pub mod pagination;
pub mod ports;
pub mod services;
pub mod view;

pub use error::DomainError;
