//! Configuration schema for World HUD.

use crate::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default downstream model identifier.
pub const DEFAULT_MODEL: &str = "gpt-5.2";
/// Default document-store connection string.
pub const DEFAULT_STORE_URL: &str = "file://.worldhud/store";
/// Default database name inside the document store.
pub const DEFAULT_DATABASE: &str = "world_hud_db";

/// Root config for the World HUD backend.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct HudConfig {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

impl HudConfig {
    /// Start building a config programmatically with defaults applied.
    pub fn builder() -> HudConfigBuilder {
        HudConfigBuilder::new()
    }
}

/// Builder for assembling a `HudConfig` in code.
#[derive(Debug, Default, Clone)]
pub struct HudConfigBuilder {
    config: HudConfig,
}

impl HudConfigBuilder {
    /// Create a new builder seeded with default config values.
    pub fn new() -> Self {
        Self {
            config: HudConfig::default(),
        }
    }

    /// Set the LLM credential.
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.config.llm.api_key = api_key.into();
        self
    }

    /// Set the downstream model identifier.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.llm.model = model.into();
        self
    }

    /// Set the document-store connection string.
    pub fn store_url(mut self, url: impl Into<String>) -> Self {
        self.config.store.url = url.into();
        self
    }

    /// Set the database name.
    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.config.store.database = database.into();
        self
    }

    /// Finalize and return the built `HudConfig`.
    pub fn build(self) -> HudConfig {
        self.config
    }
}

/// Credentials and model selection for the external LLM service.
#[derive(Clone, Serialize, Deserialize, PartialEq)]
pub struct LlmConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_model(),
        }
    }
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .finish()
    }
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

/// Document-store connection settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoreConfig {
    #[serde(default = "default_store_url")]
    pub url: String,
    #[serde(default = "default_database")]
    pub database: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: default_store_url(),
            database: default_database(),
        }
    }
}

fn default_store_url() -> String {
    DEFAULT_STORE_URL.to_string()
}

fn default_database() -> String {
    DEFAULT_DATABASE.to_string()
}

/// Storage backend selected by the connection string scheme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    /// Process-local store, discarded on shutdown.
    Memory,
    /// JSONL files under the given root directory.
    File(PathBuf),
}

impl StoreConfig {
    /// Resolve the backend named by the connection string.
    ///
    /// `memory://` selects the in-process store; `file://<path>` or a bare path
    /// selects the file store rooted at that path. Any other scheme is rejected.
    pub fn backend(&self) -> Result<StoreBackend, ConfigError> {
        let url = self.url.trim();
        if url.starts_with("memory://") {
            return Ok(StoreBackend::Memory);
        }
        if let Some(path) = url.strip_prefix("file://") {
            return Ok(StoreBackend::File(PathBuf::from(path)));
        }
        if let Some((scheme, _)) = url.split_once("://") {
            return Err(ConfigError::InvalidField {
                path: "store.url".to_string(),
                message: format!(
                    "unsupported store scheme `{scheme}://`; use memory://, file:// or a path"
                ),
            });
        }
        Ok(StoreBackend::File(PathBuf::from(url)))
    }
}
