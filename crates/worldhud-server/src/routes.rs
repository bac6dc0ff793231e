//! HTTP routes mounted under `/api`.

use crate::error::ApiError;
use crate::relay::{OutboundMessage, Relay};
use chrono::Utc;
use rocket::serde::json::Json;
use rocket::{Route, State, delete, get, post, put, routes};
use serde_json::{Value, json};
use worldhud_core::service::{
    DEFAULT_MEMORY_LIMIT, DEFAULT_RECOGNITION_LIMIT, DEFAULT_TRANSLATION_LIMIT,
};
use worldhud_core::{
    HudService, HudSettings, MemoryCreate, MemoryItem, MemoryUpdate, RecognitionRecord,
    RecognitionRequest, SocialCues, SocialCuesRequest, TranslationRecord, TranslationRequest,
};

type ApiResult<T> = Result<Json<T>, ApiError>;

pub fn routes() -> Vec<Route> {
    routes![
        index,
        health,
        translate,
        translations,
        recognize,
        recognitions,
        create_memory,
        memories,
        update_memory,
        delete_memory,
        social_cues,
        settings,
        update_settings,
    ]
}

#[get("/")]
fn index() -> Json<Value> {
    Json(json!({ "message": "World HUD API v1.0", "status": "operational" }))
}

#[get("/health")]
fn health() -> Json<Value> {
    Json(json!({ "status": "healthy", "timestamp": Utc::now() }))
}

#[post("/translate", data = "<request>")]
async fn translate(
    service: &State<HudService>,
    relay: &State<Relay>,
    request: Json<TranslationRequest>,
) -> ApiResult<TranslationRecord> {
    let record = service.translate(request.into_inner()).await?;
    relay.broadcast(&OutboundMessage::TranslationResult {
        payload: record.clone(),
    });
    Ok(Json(record))
}

#[get("/translations?<limit>")]
async fn translations(
    service: &State<HudService>,
    limit: Option<usize>,
) -> ApiResult<Vec<TranslationRecord>> {
    let limit = limit.unwrap_or(DEFAULT_TRANSLATION_LIMIT);
    Ok(Json(service.translations(limit).await?))
}

#[post("/recognize", data = "<request>")]
async fn recognize(
    service: &State<HudService>,
    relay: &State<Relay>,
    request: Json<RecognitionRequest>,
) -> ApiResult<RecognitionRecord> {
    let record = service.recognize(request.into_inner()).await?;
    relay.broadcast(&OutboundMessage::RecognitionResult {
        payload: record.clone(),
    });
    Ok(Json(record))
}

#[get("/recognitions?<limit>")]
async fn recognitions(
    service: &State<HudService>,
    limit: Option<usize>,
) -> ApiResult<Vec<RecognitionRecord>> {
    let limit = limit.unwrap_or(DEFAULT_RECOGNITION_LIMIT);
    Ok(Json(service.recognitions(limit).await?))
}

#[post("/memory", data = "<create>")]
async fn create_memory(
    service: &State<HudService>,
    create: Json<MemoryCreate>,
) -> ApiResult<MemoryItem> {
    Ok(Json(service.create_memory(create.into_inner()).await?))
}

#[get("/memory?<limit>&<search>")]
async fn memories(
    service: &State<HudService>,
    limit: Option<usize>,
    search: Option<&str>,
) -> ApiResult<Vec<MemoryItem>> {
    let limit = limit.unwrap_or(DEFAULT_MEMORY_LIMIT);
    Ok(Json(service.memories(limit, search).await?))
}

/// An empty `tags` list means the tags were not supplied.
#[put("/memory/<id>?<notes>&<tags>")]
async fn update_memory(
    service: &State<HudService>,
    id: &str,
    notes: Option<String>,
    tags: Vec<String>,
) -> ApiResult<Value> {
    let update = MemoryUpdate {
        notes,
        tags: (!tags.is_empty()).then_some(tags),
    };
    service.update_memory(id, update).await?;
    Ok(Json(json!({ "status": "updated", "id": id })))
}

#[delete("/memory/<id>")]
async fn delete_memory(service: &State<HudService>, id: &str) -> ApiResult<Value> {
    service.delete_memory(id).await?;
    Ok(Json(json!({ "status": "deleted", "id": id })))
}

#[post("/social-cues", data = "<request>")]
async fn social_cues(
    service: &State<HudService>,
    request: Json<SocialCuesRequest>,
) -> ApiResult<SocialCues> {
    Ok(Json(service.social_cues(request.into_inner()).await?))
}

#[get("/settings")]
async fn settings(service: &State<HudService>) -> ApiResult<HudSettings> {
    Ok(Json(service.settings().await?))
}

#[put("/settings", data = "<settings>")]
async fn update_settings(
    service: &State<HudService>,
    settings: Json<HudSettings>,
) -> ApiResult<HudSettings> {
    Ok(Json(service.update_settings(settings.into_inner()).await?))
}
