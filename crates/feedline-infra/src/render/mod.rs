//! Renderers for views.

mod json;

pub use json::JsonRenderer;
