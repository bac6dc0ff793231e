//! Configuration models and environment loading.
//!
//! This crate owns the World HUD process configuration: the LLM credential and
//! model, and the document-store connection. Everything is read from the
//! process environment at startup.

mod error;
mod loader;
mod model;

/// Public error type returned by config loading.
pub use error::ConfigError;
/// Environment variable names understood by the loader.
pub use loader::env_keys;
/// Configuration schema models.
pub use model::*;
