//! Error types for the core request handlers.

use thiserror::Error;
use worldhud_store::StoreError;

/// Errors returned by `HudService` operations.
#[derive(Debug, Error)]
pub enum HudError {
    /// The external LLM call failed.
    #[error("LLM service error: {0}")]
    Service(String),
    /// The addressed record does not exist.
    #[error("{0} not found")]
    NotFound(String),
    /// The request payload could not be interpreted.
    #[error("invalid request: {0}")]
    Validation(String),
    /// The document store failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl From<serde_json::Error> for HudError {
    fn from(err: serde_json::Error) -> Self {
        HudError::Store(StoreError::Serde(err))
    }
}
