//! Error types for document store operations.

/// Errors returned by document stores.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Serialization error.
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    /// Regex compilation error.
    #[error("regex error: {0}")]
    Regex(String),
    /// Collection name cannot be used as a storage key.
    #[error("invalid collection name: {0}")]
    InvalidCollection(String),
    /// Document has no string identifier.
    #[error("document has no `id` field")]
    MissingId,
    /// Store location could not be resolved.
    #[error(transparent)]
    Config(#[from] worldhud_config::ConfigError),
    /// Document is not a JSON object.
    #[error("document must be a JSON object")]
    NotAnObject,
}
