//! Core request handling for the World HUD backend.
//!
//! This crate owns the record types, the LLM gateway, the best-effort JSON
//! normalizer and the `HudService` handlers shared by the HTTP surface and the
//! realtime relay.

pub mod error;
pub mod gateway;
pub mod languages;
pub mod normalize;
pub mod prompt;
pub mod service;
pub mod types;

pub use error::HudError;
pub use gateway::LlmGateway;
pub use service::HudService;
pub use types::{
    HudSettings, MemoryCreate, MemoryItem, MemoryUpdate, RecognitionRecord, RecognitionRequest,
    SETTINGS_ID, SocialCues, SocialCuesRequest, TranslationRecord, TranslationRequest,
};
