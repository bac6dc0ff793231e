//! Request handlers composing the gateway, the normalizer and the store.

use crate::error::HudError;
use crate::gateway::LlmGateway;
use crate::normalize::{normalize_recognition, normalize_social_cues};
use crate::prompt;
use crate::types::{
    HudSettings, MemoryCreate, MemoryItem, MemoryUpdate, RecognitionRecord, RecognitionRequest,
    SETTINGS_ID, SocialCues, SocialCuesRequest, TranslationRecord, TranslationRequest,
    collections,
};
use chrono::Utc;
use log::{debug, info};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;
use worldhud_store::{DocumentStore, DocumentUpdate, FindOptions, SearchFilter};

/// Default page sizes for history listings.
pub const DEFAULT_TRANSLATION_LIMIT: usize = 50;
pub const DEFAULT_RECOGNITION_LIMIT: usize = 20;
pub const DEFAULT_MEMORY_LIMIT: usize = 100;

/// Fields inspected by memory search.
const MEMORY_SEARCH_FIELDS: &[&str] = &["object_type", "description", "tags"];

/// Handlers shared by the HTTP surface and the realtime relay.
#[derive(Clone)]
pub struct HudService {
    gateway: LlmGateway,
    store: Arc<dyn DocumentStore>,
}

impl HudService {
    pub fn new(gateway: LlmGateway, store: Arc<dyn DocumentStore>) -> Self {
        Self { gateway, store }
    }

    /// Translate text and append it to the translation history.
    pub async fn translate(
        &self,
        request: TranslationRequest,
    ) -> Result<TranslationRecord, HudError> {
        let prompts = prompt::translation(
            &request.text,
            &request.source_language,
            &request.target_language,
        );
        let translated = self
            .gateway
            .invoke(&prompts.system, &prompts.user, None)
            .await?;
        let record = TranslationRecord {
            id: Uuid::new_v4(),
            original_text: request.text,
            translated_text: translated.trim().to_string(),
            source_language: request.source_language,
            target_language: request.target_language,
            timestamp: Utc::now(),
        };
        self.store
            .insert(collections::TRANSLATIONS, to_document(&record)?)
            .await?;
        info!(
            "translation stored (id={}, {}->{})",
            record.id, record.source_language, record.target_language
        );
        Ok(record)
    }

    /// Most recent translations first.
    pub async fn translations(&self, limit: usize) -> Result<Vec<TranslationRecord>, HudError> {
        self.list(
            collections::TRANSLATIONS,
            FindOptions::newest_first("timestamp", limit),
        )
        .await
    }

    /// Describe the objects in an image and append the result to the history.
    pub async fn recognize(
        &self,
        request: RecognitionRequest,
    ) -> Result<RecognitionRecord, HudError> {
        let prompts = prompt::recognition(request.context.as_deref());
        let raw = self
            .gateway
            .invoke(&prompts.system, &prompts.user, Some(&request.image_base64))
            .await?;
        let fields = normalize_recognition(&raw);
        let record = RecognitionRecord {
            id: Uuid::new_v4(),
            objects_detected: fields.objects_detected,
            description: fields.description,
            suggestions: fields.suggestions,
            timestamp: Utc::now(),
        };
        self.store
            .insert(collections::RECOGNITIONS, to_document(&record)?)
            .await?;
        info!(
            "recognition stored (id={}, objects={})",
            record.id,
            record.objects_detected.len()
        );
        Ok(record)
    }

    /// Most recent recognitions first.
    pub async fn recognitions(&self, limit: usize) -> Result<Vec<RecognitionRecord>, HudError> {
        self.list(
            collections::RECOGNITIONS,
            FindOptions::newest_first("timestamp", limit),
        )
        .await
    }

    pub async fn create_memory(&self, create: MemoryCreate) -> Result<MemoryItem, HudError> {
        let item = MemoryItem::new(create, Utc::now());
        self.store
            .insert(collections::MEMORY, to_document(&item)?)
            .await?;
        info!("memory stored (id={}, type={})", item.id, item.object_type);
        Ok(item)
    }

    /// Memories ordered by most recent encounter, optionally filtered by a
    /// case-insensitive term matched against type, description and tags.
    pub async fn memories(
        &self,
        limit: usize,
        search: Option<&str>,
    ) -> Result<Vec<MemoryItem>, HudError> {
        let filter = search
            .filter(|term| !term.is_empty())
            .map(|term| SearchFilter::new(term, MEMORY_SEARCH_FIELDS));
        self.list(
            collections::MEMORY,
            FindOptions::newest_first("last_seen", limit).with_filter(filter),
        )
        .await
    }

    /// Record another encounter, replacing notes and tags when supplied.
    pub async fn update_memory(&self, id: &str, update: MemoryUpdate) -> Result<(), HudError> {
        let mut changes = DocumentUpdate::new()
            .increment("encounter_count", 1)
            .touch("last_seen");
        if let Some(notes) = update.notes {
            changes = changes.set("notes", Value::String(notes));
        }
        if let Some(tags) = update.tags {
            changes = changes.set("tags", serde_json::to_value(tags)?);
        }
        if !self.store.update(collections::MEMORY, id, &changes).await? {
            return Err(HudError::NotFound("Memory".to_string()));
        }
        debug!("memory updated (id={id})");
        Ok(())
    }

    pub async fn delete_memory(&self, id: &str) -> Result<(), HudError> {
        if !self.store.delete(collections::MEMORY, id).await? {
            return Err(HudError::NotFound("Memory".to_string()));
        }
        Ok(())
    }

    /// Conversation prompts, cultural tips and phrases for a situation.
    pub async fn social_cues(&self, request: SocialCuesRequest) -> Result<SocialCues, HudError> {
        let prompts = prompt::social_cues(
            &request.situation,
            &request.language,
            request.cultural_context.as_deref(),
        );
        let raw = self
            .gateway
            .invoke(&prompts.system, &prompts.user, None)
            .await?;
        Ok(normalize_social_cues(&raw))
    }

    /// Current settings; defaults are created and persisted on first read.
    ///
    /// The store checks and inserts under one lock, so concurrent first reads
    /// leave a single settings document.
    pub async fn settings(&self) -> Result<HudSettings, HudError> {
        let document = self
            .store
            .insert_if_absent(collections::SETTINGS, to_document(&HudSettings::default())?)
            .await?;
        Ok(serde_json::from_value(document)?)
    }

    /// Overwrite the settings singleton. Any client-supplied id is replaced.
    pub async fn update_settings(
        &self,
        mut settings: HudSettings,
    ) -> Result<HudSettings, HudError> {
        if settings.id != SETTINGS_ID {
            debug!("ignoring client settings id `{}`", settings.id);
        }
        settings.id = SETTINGS_ID.to_string();
        self.store
            .replace_one(
                collections::SETTINGS,
                SETTINGS_ID,
                to_document(&settings)?,
                true,
            )
            .await?;
        Ok(settings)
    }

    async fn list<T: DeserializeOwned>(
        &self,
        collection: &str,
        options: FindOptions,
    ) -> Result<Vec<T>, HudError> {
        let documents = self.store.find(collection, &options).await?;
        documents
            .into_iter()
            .map(|document| serde_json::from_value(document).map_err(HudError::from))
            .collect()
    }
}

fn to_document<T: Serialize>(value: &T) -> Result<Value, HudError> {
    Ok(serde_json::to_value(value)?)
}
