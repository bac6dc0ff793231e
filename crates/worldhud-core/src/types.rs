//! Record and request types exchanged over the API and persisted in the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Fixed identifier of the settings singleton.
pub const SETTINGS_ID: &str = "default";

/// Collection names in the document store.
pub mod collections {
    pub const TRANSLATIONS: &str = "translations";
    pub const RECOGNITIONS: &str = "recognitions";
    pub const MEMORY: &str = "contextual_memory";
    pub const SETTINGS: &str = "settings";
}

/// Request to translate a piece of text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TranslationRequest {
    pub text: String,
    #[serde(default = "default_source_language")]
    pub source_language: String,
    #[serde(default = "default_target_language")]
    pub target_language: String,
}

fn default_source_language() -> String {
    "en".to_string()
}

fn default_target_language() -> String {
    "es".to_string()
}

/// Persisted translation. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TranslationRecord {
    pub id: Uuid,
    pub original_text: String,
    pub translated_text: String,
    pub source_language: String,
    pub target_language: String,
    pub timestamp: DateTime<Utc>,
}

/// Request to recognize objects in an image.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecognitionRequest {
    /// Base64 image, optionally carrying a `data:image/...;base64,` prefix.
    pub image_base64: String,
    #[serde(default)]
    pub context: Option<String>,
}

/// Persisted recognition result. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecognitionRecord {
    pub id: Uuid,
    /// Free-form object descriptors, usually `name`, `description`, `confidence`.
    pub objects_detected: Vec<Map<String, Value>>,
    /// Scene description.
    pub description: String,
    pub suggestions: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

/// Payload for creating a memory item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MemoryCreate {
    pub object_type: String,
    pub description: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub image_thumbnail: Option<String>,
}

/// Fields replaced by a memory update. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MemoryUpdate {
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

/// Something the wearer has seen before.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MemoryItem {
    pub id: Uuid,
    pub object_type: String,
    pub description: String,
    #[serde(default)]
    pub notes: Option<String>,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    /// Starts at 1; incremented by every update.
    pub encounter_count: u64,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub image_thumbnail: Option<String>,
}

impl MemoryItem {
    /// Build a fresh item first seen at `now`.
    pub fn new(create: MemoryCreate, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            object_type: create.object_type,
            description: create.description,
            notes: create.notes,
            first_seen: now,
            last_seen: now,
            encounter_count: 1,
            tags: create.tags,
            image_thumbnail: create.image_thumbnail,
        }
    }
}

/// Request for conversation help in a foreign language.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SocialCuesRequest {
    pub situation: String,
    pub language: String,
    #[serde(default)]
    pub cultural_context: Option<String>,
}

/// Conversation prompts, tips and phrases. Never persisted.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SocialCues {
    pub prompts: Vec<String>,
    pub cultural_tips: Vec<String>,
    pub common_phrases: Vec<String>,
}

/// HUD preferences, stored as a singleton under [`SETTINGS_ID`].
///
/// Fields missing from an incoming payload take their defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HudSettings {
    pub id: String,
    pub native_language: String,
    pub target_languages: Vec<String>,
    pub hud_opacity: f64,
    /// Widget name to axis coordinates, e.g. `{"compass": {"x": 10, "y": 4}}`.
    pub widget_positions: BTreeMap<String, BTreeMap<String, i64>>,
    pub enabled_widgets: Vec<String>,
    pub theme: String,
    pub font_size: String,
    pub auto_translate: bool,
    pub contextual_memory_enabled: bool,
}

impl Default for HudSettings {
    fn default() -> Self {
        Self {
            id: SETTINGS_ID.to_string(),
            native_language: "en".to_string(),
            target_languages: ["es", "ja", "de", "ru"].map(String::from).to_vec(),
            hud_opacity: 0.85,
            widget_positions: BTreeMap::new(),
            enabled_widgets: [
                "time",
                "weather",
                "compass",
                "battery",
                "translation",
                "object_recognition",
            ]
            .map(String::from)
            .to_vec(),
            theme: "dark_cyber".to_string(),
            font_size: "medium".to_string(),
            auto_translate: true,
            contextual_memory_enabled: true,
        }
    }
}
