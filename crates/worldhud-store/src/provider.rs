//! Document store interface and the JSONL file implementation.

use crate::error::StoreError;
use crate::query::{self, DocumentUpdate, FindOptions, document_id};
use async_trait::async_trait;
use chrono::Utc;
use log::{debug, info, warn};
use parking_lot::Mutex;
use serde_json::Value;
use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

#[async_trait]
/// Persistence abstraction over named collections of JSON documents.
pub trait DocumentStore: Send + Sync {
    /// Store a document as given. Identifiers are not checked for duplicates.
    async fn insert(&self, collection: &str, document: Value) -> Result<(), StoreError>;

    /// Fetch a single document by identifier.
    async fn find_one(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError>;

    /// List documents, optionally filtered, ordered and capped.
    async fn find(
        &self,
        collection: &str,
        options: &FindOptions,
    ) -> Result<Vec<Value>, StoreError>;

    /// Apply a partial update. Returns `false` when no document matched.
    async fn update(
        &self,
        collection: &str,
        id: &str,
        update: &DocumentUpdate,
    ) -> Result<bool, StoreError>;

    /// Remove a document. Returns `false` when nothing was removed.
    async fn delete(&self, collection: &str, id: &str) -> Result<bool, StoreError>;

    /// Store `document` unless one with the same identifier already exists.
    /// The lookup and the insert happen under one lock. Returns the document
    /// that is stored afterwards.
    async fn insert_if_absent(
        &self,
        collection: &str,
        document: Value,
    ) -> Result<Value, StoreError>;

    /// Replace the document with the given identifier, inserting it when
    /// `upsert` is set and no document matched. Returns whether a document
    /// was replaced or inserted.
    async fn replace_one(
        &self,
        collection: &str,
        id: &str,
        document: Value,
        upsert: bool,
    ) -> Result<bool, StoreError>;
}

/// Reject collection names that cannot be used as file stems.
pub(crate) fn validate_collection(collection: &str) -> Result<(), StoreError> {
    let valid = !collection.is_empty()
        && collection
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidCollection(collection.to_string()))
    }
}

pub(crate) fn ensure_object(document: &Value) -> Result<(), StoreError> {
    if document.is_object() {
        Ok(())
    } else {
        Err(StoreError::NotAnObject)
    }
}

/// File-backed document store keeping one JSONL file per collection.
#[derive(Debug)]
pub struct FileDocumentStore {
    /// Root directory for collection files.
    root: PathBuf,
    /// Serialize write access to collection files.
    write_lock: Mutex<()>,
}

impl FileDocumentStore {
    /// Create a new file-backed store under the given root.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)?;
        info!("initialized file document store (root={})", root.display());
        Ok(Self {
            root,
            write_lock: Mutex::new(()),
        })
    }

    /// Path to the collection JSONL file.
    fn collection_path(&self, collection: &str) -> PathBuf {
        self.root.join(format!("{collection}.jsonl"))
    }

    /// Path to the temporary collection file.
    fn temp_path(&self, collection: &str) -> PathBuf {
        self.root.join(format!("{collection}.jsonl.tmp"))
    }

    /// Load all documents of a collection.
    fn load_documents(&self, collection: &str) -> Result<Vec<Value>, StoreError> {
        validate_collection(collection)?;
        let path = self.collection_path(collection);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let file = OpenOptions::new().read(true).open(path)?;
        let reader = BufReader::new(file);
        let mut documents = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let document: Value = serde_json::from_str(&line)?;
            documents.push(document);
        }
        Ok(documents)
    }

    /// Rewrite a collection atomically.
    fn write_documents(&self, collection: &str, documents: &[Value]) -> Result<(), StoreError> {
        let path = self.collection_path(collection);
        let temp_path = self.temp_path(collection);
        {
            let mut file = OpenOptions::new()
                .create(true)
                .truncate(true)
                .write(true)
                .open(&temp_path)?;
            for document in documents {
                let line = serde_json::to_string(document)?;
                writeln!(file, "{line}")?;
            }
        }
        std::fs::rename(temp_path, path)?;
        Ok(())
    }

    /// Append one document. Callers hold the write lock.
    fn append(&self, collection: &str, document: &Value) -> Result<(), StoreError> {
        let path = self.collection_path(collection);
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        let mut line = serde_json::to_string(document)?;
        line.push('\n');
        file.write_all(line.as_bytes())?;
        Ok(())
    }

    /// Load, mutate and rewrite a collection while holding the write lock.
    /// The collection is only rewritten when `mutate` reports a change.
    fn rewrite<F>(&self, collection: &str, mutate: F) -> Result<bool, StoreError>
    where
        F: FnOnce(&mut Vec<Value>) -> bool,
    {
        let _guard = self.write_lock.lock();
        let mut documents = self.load_documents(collection)?;
        let changed = mutate(&mut documents);
        if changed {
            self.write_documents(collection, &documents)?;
        }
        Ok(changed)
    }
}

#[async_trait]
impl DocumentStore for FileDocumentStore {
    /// Store a document by appending to the collection file.
    async fn insert(&self, collection: &str, document: Value) -> Result<(), StoreError> {
        validate_collection(collection)?;
        ensure_object(&document)?;
        let _guard = self.write_lock.lock();
        self.append(collection, &document)?;
        debug!(
            "inserted document (collection={}, id={})",
            collection,
            document_id(&document).unwrap_or("<none>")
        );
        Ok(())
    }

    async fn find_one(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError> {
        let documents = self.load_documents(collection)?;
        Ok(documents
            .into_iter()
            .find(|document| document_id(document) == Some(id)))
    }

    async fn find(
        &self,
        collection: &str,
        options: &FindOptions,
    ) -> Result<Vec<Value>, StoreError> {
        let documents = self.load_documents(collection)?;
        let selected = query::select(documents, options)?;
        debug!(
            "find documents (collection={}, returned={})",
            collection,
            selected.len()
        );
        Ok(selected)
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        update: &DocumentUpdate,
    ) -> Result<bool, StoreError> {
        let now = Utc::now();
        let matched = self.rewrite(collection, |documents| {
            match documents
                .iter_mut()
                .find(|document| document_id(document) == Some(id))
            {
                Some(document) => {
                    update.apply(document, now);
                    true
                }
                None => false,
            }
        })?;
        if !matched {
            warn!("update matched no document (collection={collection}, id={id})");
        }
        Ok(matched)
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool, StoreError> {
        let deleted = self.rewrite(collection, |documents| {
            match documents
                .iter()
                .position(|document| document_id(document) == Some(id))
            {
                Some(index) => {
                    documents.remove(index);
                    true
                }
                None => false,
            }
        })?;
        if deleted {
            info!("deleted document (collection={collection}, id={id})");
        } else {
            warn!("delete matched no document (collection={collection}, id={id})");
        }
        Ok(deleted)
    }

    async fn insert_if_absent(
        &self,
        collection: &str,
        document: Value,
    ) -> Result<Value, StoreError> {
        validate_collection(collection)?;
        ensure_object(&document)?;
        let id = document_id(&document).ok_or(StoreError::MissingId)?;
        let _guard = self.write_lock.lock();
        if let Some(existing) = self
            .load_documents(collection)?
            .into_iter()
            .find(|existing| document_id(existing) == Some(id))
        {
            return Ok(existing);
        }
        self.append(collection, &document)?;
        info!("inserted missing document (collection={collection}, id={id})");
        Ok(document)
    }

    async fn replace_one(
        &self,
        collection: &str,
        id: &str,
        document: Value,
        upsert: bool,
    ) -> Result<bool, StoreError> {
        ensure_object(&document)?;
        self.rewrite(collection, move |documents| {
            match documents
                .iter_mut()
                .find(|existing| document_id(existing) == Some(id))
            {
                Some(existing) => {
                    *existing = document;
                    true
                }
                None if upsert => {
                    documents.push(document);
                    true
                }
                None => false,
            }
        })
    }
}
