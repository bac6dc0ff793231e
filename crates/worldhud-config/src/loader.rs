//! Environment-backed configuration loading.

use crate::{ConfigError, HudConfig};
use log::{debug, info};

/// Environment variable names read by [`HudConfig::from_env`].
pub mod env_keys {
    /// LLM credential.
    pub const API_KEY: &str = "HUD_LLM_API_KEY";
    /// Credential fallback shared with other OpenAI tooling.
    pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
    /// Downstream model identifier.
    pub const MODEL: &str = "HUD_LLM_MODEL";
    /// Document-store connection string.
    pub const STORE_URL: &str = "HUD_STORE_URL";
    /// Database name inside the document store.
    pub const DB_NAME: &str = "HUD_DB_NAME";
}

impl HudConfig {
    /// Load config from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load config through an arbitrary key lookup.
    ///
    /// Empty values are treated as unset. The credential is required; every
    /// other setting falls back to its default.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let api_key = read(env_keys::API_KEY)
            .or_else(|| {
                debug!("{} unset; trying {}", env_keys::API_KEY, env_keys::OPENAI_API_KEY);
                read(env_keys::OPENAI_API_KEY)
            })
            .ok_or_else(|| ConfigError::Missing(env_keys::API_KEY.to_string()))?;

        let mut builder = HudConfig::builder().api_key(api_key);
        if let Some(model) = read(env_keys::MODEL) {
            builder = builder.model(model);
        }
        if let Some(url) = read(env_keys::STORE_URL) {
            builder = builder.store_url(url);
        }
        if let Some(database) = read(env_keys::DB_NAME) {
            builder = builder.database(database);
        }
        let config = builder.build();
        validate_database(&config.store.database)?;
        config.store.backend().map_err(|err| match err {
            ConfigError::InvalidField { message, .. } => ConfigError::InvalidField {
                path: env_keys::STORE_URL.to_string(),
                message,
            },
            other => other,
        })?;

        info!(
            "loaded config from environment (model={}, store_url={}, database={})",
            config.llm.model, config.store.url, config.store.database
        );
        Ok(config)
    }
}

/// Database names become directory names, so path separators are rejected.
fn validate_database(database: &str) -> Result<(), ConfigError> {
    if database.contains(|c| c == '/' || c == '\\') || database == "." || database == ".." {
        return Err(ConfigError::InvalidField {
            path: env_keys::DB_NAME.to_string(),
            message: format!("`{database}` is not a valid database name"),
        });
    }
    Ok(())
}
