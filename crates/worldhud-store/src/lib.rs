//! Document persistence for World HUD.
//!
//! Records are stored as plain JSON documents in named collections and
//! addressed by their `id` field.

pub mod error;
pub mod memory;
pub mod provider;
pub mod query;

use log::info;
use std::sync::Arc;
use worldhud_config::{StoreBackend, StoreConfig};

/// Store error type.
pub use error::StoreError;
/// In-process document store.
pub use memory::InMemoryDocumentStore;
/// Document store interface and default file implementation.
pub use provider::{DocumentStore, FileDocumentStore};
/// Query, filter and update descriptions.
pub use query::{DocumentUpdate, FindOptions, SearchFilter};

/// Name of the identifier field every document carries.
pub const ID_FIELD: &str = "id";

/// Open the store selected by the connection string.
pub fn open_store(config: &StoreConfig) -> Result<Arc<dyn DocumentStore>, StoreError> {
    match config.backend()? {
        StoreBackend::Memory => {
            info!("opening in-memory document store (database={})", config.database);
            Ok(Arc::new(InMemoryDocumentStore::new()))
        }
        StoreBackend::File(root) => Ok(Arc::new(FileDocumentStore::new(
            root.join(&config.database),
        )?)),
    }
}

#[cfg(test)]
mod tests {
    use super::open_store;
    use crate::StoreError;
    use worldhud_config::StoreConfig;

    #[test]
    fn unsupported_scheme_is_not_opened() {
        let config = StoreConfig {
            url: "mongodb://localhost:27017".to_string(),
            ..StoreConfig::default()
        };
        let err = open_store(&config).err().expect("rejected");
        assert!(matches!(err, StoreError::Config(_)));
    }
}
