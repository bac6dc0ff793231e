//! Stateless gateway to the external LLM provider.

use crate::error::HudError;
use autoagents_llm::LLMProvider;
use autoagents_llm::chat::{ChatMessage, ChatRole, ImageMime, MessageType};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use log::{debug, error};
use std::sync::Arc;
use uuid::Uuid;

/// Sends one system/user prompt pair per call to the configured provider.
///
/// Every call builds its own conversation; nothing is carried over between
/// calls and failures are never retried.
#[derive(Clone)]
pub struct LlmGateway {
    provider: Arc<dyn LLMProvider>,
    model: String,
}

impl LlmGateway {
    pub fn new(provider: Arc<dyn LLMProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    /// Run a single completion and return the raw response text.
    pub async fn invoke(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        image: Option<&str>,
    ) -> Result<String, HudError> {
        let session_id = Uuid::new_v4();
        let mut messages = vec![ChatMessage {
            role: ChatRole::System,
            message_type: MessageType::Text,
            content: system_prompt.to_string(),
        }];
        if let Some(image) = image {
            let (mime, bytes) = decode_image(image)?;
            debug!(
                "attaching image (session_id={}, bytes={})",
                session_id,
                bytes.len()
            );
            messages.push(ChatMessage {
                role: ChatRole::User,
                message_type: MessageType::Image((mime, bytes)),
                content: String::new(),
            });
        }
        messages.push(ChatMessage {
            role: ChatRole::User,
            message_type: MessageType::Text,
            content: user_prompt.to_string(),
        });

        debug!(
            "invoking LLM (session_id={}, model={}, system_len={}, user_len={})",
            session_id,
            self.model,
            system_prompt.len(),
            user_prompt.len()
        );
        let response = self
            .provider
            .chat_with_tools(&messages, None, None)
            .await
            .map_err(|err| {
                error!("LLM call failed (session_id={session_id}): {err}");
                HudError::Service(err.to_string())
            })?;
        response.text().ok_or_else(|| {
            error!("LLM returned no text (session_id={session_id})");
            HudError::Service("empty response from model".to_string())
        })
    }
}

/// Decode a base64 image, stripping any `data:image/...;base64,` prefix.
///
/// The MIME type is taken from the prefix when present and defaults to JPEG.
pub fn decode_image(raw: &str) -> Result<(ImageMime, Vec<u8>), HudError> {
    let (header, payload) = match raw.split_once(',') {
        Some((header, payload)) => (Some(header), payload),
        None => (None, raw),
    };
    let mime = header.map_or(ImageMime::JPEG, mime_from_header);
    let cleaned: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD
        .decode(cleaned.as_bytes())
        .map_err(|err| HudError::Validation(format!("image_base64 is not valid base64: {err}")))?;
    Ok((mime, bytes))
}

fn mime_from_header(header: &str) -> ImageMime {
    let header = header.to_ascii_lowercase();
    if header.contains("image/png") {
        ImageMime::PNG
    } else if header.contains("image/gif") {
        ImageMime::GIF
    } else if header.contains("image/webp") {
        ImageMime::WEBP
    } else {
        ImageMime::JPEG
    }
}
