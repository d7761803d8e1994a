//! # Registry
//!
//! Lookup table from job variant to processing logic.

pub mod handler_registry;

pub use handler_registry::HandlerRegistry;
