//! Process-local document store.

use crate::error::StoreError;
use crate::provider::{DocumentStore, ensure_object, validate_collection};
use crate::query::{self, DocumentUpdate, FindOptions, document_id};
use async_trait::async_trait;
use chrono::Utc;
use log::debug;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;

/// Document store holding every collection in memory. Contents are lost when
/// the process exits.
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    collections: RwLock<HashMap<String, Vec<Value>>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in a collection.
    pub fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .get(collection)
            .map_or(0, Vec::len)
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn insert(&self, collection: &str, document: Value) -> Result<(), StoreError> {
        validate_collection(collection)?;
        ensure_object(&document)?;
        debug!(
            "inserted document (collection={}, id={})",
            collection,
            document_id(&document).unwrap_or("<none>")
        );
        self.collections
            .write()
            .entry(collection.to_string())
            .or_default()
            .push(document);
        Ok(())
    }

    async fn find_one(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError> {
        validate_collection(collection)?;
        Ok(self.collections.read().get(collection).and_then(|documents| {
            documents
                .iter()
                .find(|document| document_id(document) == Some(id))
                .cloned()
        }))
    }

    async fn find(
        &self,
        collection: &str,
        options: &FindOptions,
    ) -> Result<Vec<Value>, StoreError> {
        validate_collection(collection)?;
        let documents = self
            .collections
            .read()
            .get(collection)
            .cloned()
            .unwrap_or_default();
        query::select(documents, options)
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        update: &DocumentUpdate,
    ) -> Result<bool, StoreError> {
        validate_collection(collection)?;
        let now = Utc::now();
        let mut collections = self.collections.write();
        let Some(document) = collections.get_mut(collection).and_then(|documents| {
            documents
                .iter_mut()
                .find(|document| document_id(document) == Some(id))
        }) else {
            return Ok(false);
        };
        update.apply(document, now);
        Ok(true)
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool, StoreError> {
        validate_collection(collection)?;
        let mut collections = self.collections.write();
        let Some(documents) = collections.get_mut(collection) else {
            return Ok(false);
        };
        let before = documents.len();
        documents.retain(|document| document_id(document) != Some(id));
        Ok(documents.len() != before)
    }

    async fn insert_if_absent(
        &self,
        collection: &str,
        document: Value,
    ) -> Result<Value, StoreError> {
        validate_collection(collection)?;
        ensure_object(&document)?;
        let id = document_id(&document).ok_or(StoreError::MissingId)?;
        let mut collections = self.collections.write();
        let documents = collections.entry(collection.to_string()).or_default();
        if let Some(existing) = documents
            .iter()
            .find(|existing| document_id(existing) == Some(id))
        {
            return Ok(existing.clone());
        }
        documents.push(document.clone());
        Ok(document)
    }

    async fn replace_one(
        &self,
        collection: &str,
        id: &str,
        document: Value,
        upsert: bool,
    ) -> Result<bool, StoreError> {
        validate_collection(collection)?;
        ensure_object(&document)?;
        let mut collections = self.collections.write();
        let documents = collections.entry(collection.to_string()).or_default();
        match documents
            .iter_mut()
            .find(|existing| document_id(existing) == Some(id))
        {
            Some(existing) => {
                *existing = document;
                Ok(true)
            }
            None if upsert => {
                documents.push(document);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::InMemoryDocumentStore;
    use crate::{DocumentStore, DocumentUpdate, FindOptions, SearchFilter};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use uuid::Uuid;

    #[tokio::test]
    async fn update_touches_and_increments() {
        let store = InMemoryDocumentStore::new();
        let id = Uuid::new_v4().to_string();
        store
            .insert(
                "contextual_memory",
                json!({ "id": id, "encounter_count": 1, "last_seen": "2000-01-01T00:00:00Z" }),
            )
            .await
            .expect("insert");
        let update = DocumentUpdate::new()
            .increment("encounter_count", 1)
            .touch("last_seen");
        assert!(store.update("contextual_memory", &id, &update).await.expect("update"));
        let stored = store
            .find_one("contextual_memory", &id)
            .await
            .expect("find")
            .expect("document");
        assert_eq!(stored["encounter_count"], json!(2));
        assert_ne!(stored["last_seen"], json!("2000-01-01T00:00:00Z"));
    }

    #[tokio::test]
    async fn delete_of_missing_document_leaves_collection_intact() {
        let store = InMemoryDocumentStore::new();
        store
            .insert("items", json!({ "id": "keep" }))
            .await
            .expect("insert");
        assert!(!store.delete("items", "missing").await.expect("delete"));
        assert!(!store.delete("other", "missing").await.expect("delete"));
        assert_eq!(store.len("items"), 1);
    }

    #[tokio::test]
    async fn insert_if_absent_returns_existing_document() {
        let store = InMemoryDocumentStore::new();
        store
            .insert_if_absent("settings", json!({ "id": "default", "theme": "dark" }))
            .await
            .expect("insert");
        let stored = store
            .insert_if_absent("settings", json!({ "id": "default", "theme": "light" }))
            .await
            .expect("existing");
        assert_eq!(stored["theme"], json!("dark"));
        assert_eq!(store.len("settings"), 1);
    }

    #[tokio::test]
    async fn find_applies_filter() {
        let store = InMemoryDocumentStore::new();
        for (id, description) in [("1", "Coffee shop"), ("2", "bus stop")] {
            store
                .insert("items", json!({ "id": id, "description": description }))
                .await
                .expect("insert");
        }
        let options = FindOptions::newest_first("id", 10)
            .with_filter(Some(SearchFilter::new("COFFEE", &["description"])));
        let found = store.find("items", &options).await.expect("find");
        assert_eq!(found, vec![json!({ "id": "1", "description": "Coffee shop" })]);
    }
}
