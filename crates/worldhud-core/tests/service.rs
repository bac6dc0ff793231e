//! Handler integration tests against the document stores.

use pretty_assertions::assert_eq;
use std::sync::Arc;
use tokio::sync::Barrier;
use worldhud_core::types::collections;
use worldhud_core::{
    HudError, HudService, HudSettings, LlmGateway, MemoryCreate, MemoryUpdate,
    RecognitionRequest, SETTINGS_ID, SocialCuesRequest, TranslationRequest,
};
use worldhud_store::{DocumentStore, FileDocumentStore, FindOptions, InMemoryDocumentStore};
use worldhud_test_utils::{FailingLLM, ScriptedLLM};

fn service_with(llm: ScriptedLLM) -> (HudService, Arc<InMemoryDocumentStore>) {
    let store = Arc::new(InMemoryDocumentStore::new());
    let service = HudService::new(LlmGateway::new(Arc::new(llm), "test-model"), store.clone());
    (service, store)
}

fn memory(object_type: &str, description: &str, tags: &[&str]) -> MemoryCreate {
    MemoryCreate {
        object_type: object_type.to_string(),
        description: description.to_string(),
        notes: None,
        tags: tags.iter().map(|tag| tag.to_string()).collect(),
        image_thumbnail: None,
    }
}

/// New translations are trimmed, stored and listed first.
#[tokio::test]
async fn translation_is_listed_newest_first() {
    let llm = ScriptedLLM::new("unused");
    llm.push("  Buenos días \n");
    llm.push("Hola mundo");
    let (service, _) = service_with(llm);

    service
        .translate(TranslationRequest {
            text: "Good morning".to_string(),
            source_language: "en".to_string(),
            target_language: "es".to_string(),
        })
        .await
        .expect("first translation");
    let latest = service
        .translate(TranslationRequest {
            text: "Hello world".to_string(),
            source_language: "en".to_string(),
            target_language: "es".to_string(),
        })
        .await
        .expect("second translation");

    assert_eq!(latest.translated_text, "Hola mundo");
    let history = service.translations(50).await.expect("history");
    assert_eq!(history.len(), 2);
    assert_eq!(history[0], latest);
    assert_eq!(history[1].translated_text, "Buenos días");
    assert_eq!(service.translations(1).await.expect("capped").len(), 1);
}

/// Gateway failures surface as service errors and store nothing.
#[tokio::test]
async fn failed_translation_is_not_stored() {
    let store = Arc::new(InMemoryDocumentStore::new());
    let service = HudService::new(
        LlmGateway::new(Arc::new(FailingLLM::new("network down")), "test-model"),
        store.clone(),
    );
    let err = service
        .translate(TranslationRequest {
            text: "Hello".to_string(),
            source_language: "en".to_string(),
            target_language: "de".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, HudError::Service(_)));
    assert_eq!(store.len(collections::TRANSLATIONS), 0);
}

/// Fenced JSON and prose responses both produce a stored recognition.
#[tokio::test]
async fn recognition_handles_structured_and_prose_responses() {
    let llm = ScriptedLLM::new("unused");
    llm.push(
        "```json\n{\"objects\": [{\"name\": \"bike\", \"confidence\": \"high\"}], \
         \"scene_description\": \"A street\", \"suggestions\": [\"Lock it\"]}\n```",
    );
    llm.push("Just a red square.");
    let (service, store) = service_with(llm);
    let request = RecognitionRequest {
        image_base64: "data:image/png;base64,aGVsbG8=".to_string(),
        context: Some("street".to_string()),
    };

    let structured = service.recognize(request.clone()).await.expect("structured");
    assert_eq!(structured.description, "A street");
    assert_eq!(structured.suggestions, vec!["Lock it".to_string()]);
    assert_eq!(structured.objects_detected[0]["name"], "bike");

    let prose = service.recognize(request).await.expect("prose");
    assert_eq!(prose.description, "Just a red square.");
    assert!(prose.suggestions.is_empty());
    assert_eq!(prose.objects_detected[0]["name"], "Unknown");

    assert_eq!(store.len(collections::RECOGNITIONS), 2);
    let history = service.recognitions(20).await.expect("history");
    assert_eq!(history[0].id, prose.id);
}

/// Undecodable images are rejected before the model is called.
#[tokio::test]
async fn recognition_rejects_invalid_image() {
    let (service, store) = service_with(ScriptedLLM::new("{}"));
    let err = service
        .recognize(RecognitionRequest {
            image_base64: "not base64 at all!".to_string(),
            context: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, HudError::Validation(_)));
    assert_eq!(store.len(collections::RECOGNITIONS), 0);
}

/// Each update bumps the counter by one and refreshes last_seen.
#[tokio::test]
async fn memory_update_counts_encounters() {
    let (service, _) = service_with(ScriptedLLM::new("unused"));
    let created = service
        .create_memory(memory("statue", "bronze horse", &["park"]))
        .await
        .expect("create");
    assert_eq!(created.encounter_count, 1);
    assert_eq!(created.first_seen, created.last_seen);

    let id = created.id.to_string();
    service
        .update_memory(&id, MemoryUpdate::default())
        .await
        .expect("bare update");
    service
        .update_memory(
            &id,
            MemoryUpdate {
                notes: Some("seen on Sunday".to_string()),
                tags: Some(vec!["landmark".to_string()]),
            },
        )
        .await
        .expect("update with fields");

    let stored = service.memories(10, None).await.expect("list");
    assert_eq!(stored.len(), 1);
    let item = &stored[0];
    assert_eq!(item.encounter_count, 3);
    assert!(item.last_seen > created.last_seen);
    assert_eq!(item.first_seen, created.first_seen);
    assert_eq!(item.notes.as_deref(), Some("seen on Sunday"));
    assert_eq!(item.tags, vec!["landmark".to_string()]);
}

/// Search matches type, description or tags without regard to case.
#[tokio::test]
async fn memory_search_is_case_insensitive() {
    let (service, _) = service_with(ScriptedLLM::new("unused"));
    for create in [
        memory("Restaurant", "taco place", &[]),
        memory("sign", "RESTAURANT hours", &[]),
        memory("menu", "lunch specials", &["restaurant"]),
        memory("bench", "wooden", &["park"]),
    ] {
        service.create_memory(create).await.expect("create");
    }
    let found = service
        .memories(100, Some("restaurant"))
        .await
        .expect("search");
    assert_eq!(found.len(), 3);
    assert!(found.iter().all(|item| item.object_type != "bench"));
    assert_eq!(service.memories(100, Some("")).await.expect("all").len(), 4);
}

/// Unknown ids are reported and leave the collection untouched.
#[tokio::test]
async fn unknown_memory_ids_are_not_found() {
    let (service, store) = service_with(ScriptedLLM::new("unused"));
    service
        .create_memory(memory("tree", "oak", &[]))
        .await
        .expect("create");
    let before = service.memories(10, None).await.expect("before");

    let update = service
        .update_memory("missing", MemoryUpdate::default())
        .await
        .unwrap_err();
    let delete = service.delete_memory("missing").await.unwrap_err();
    assert!(matches!(update, HudError::NotFound(_)));
    assert!(matches!(delete, HudError::NotFound(_)));
    assert_eq!(update.to_string(), "Memory not found");

    assert_eq!(service.memories(10, None).await.expect("after"), before);
    assert_eq!(store.len(collections::MEMORY), 1);
}

#[tokio::test]
async fn delete_removes_memory() {
    let (service, _) = service_with(ScriptedLLM::new("unused"));
    let created = service
        .create_memory(memory("cup", "blue", &[]))
        .await
        .expect("create");
    service
        .delete_memory(&created.id.to_string())
        .await
        .expect("delete");
    assert!(service.memories(10, None).await.expect("list").is_empty());
}

/// Settings are a singleton under the fixed id.
#[tokio::test]
async fn settings_singleton_round_trip() {
    let (service, store) = service_with(ScriptedLLM::new("unused"));
    let defaults = service.settings().await.expect("defaults");
    assert_eq!(defaults, HudSettings::default());
    assert_eq!(store.len(collections::SETTINGS), 1);

    let written = service
        .update_settings(HudSettings {
            id: "client-chosen".to_string(),
            theme: "light".to_string(),
            hud_opacity: 0.5,
            ..HudSettings::default()
        })
        .await
        .expect("update");
    assert_eq!(written.id, SETTINGS_ID);

    let read = service.settings().await.expect("read");
    assert_eq!(read, written);
    assert_eq!(read.theme, "light");
    assert_eq!(store.len(collections::SETTINGS), 1);
}

/// Simultaneous first reads must not create more than one settings document.
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_first_settings_reads_create_one_document() {
    const READERS: usize = 8;
    for _ in 0..25 {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = Arc::new(FileDocumentStore::new(temp.path()).expect("store"));
        let service = HudService::new(
            LlmGateway::new(Arc::new(ScriptedLLM::new("unused")), "test-model"),
            store.clone(),
        );
        let barrier = Arc::new(Barrier::new(READERS));
        let readers: Vec<_> = (0..READERS)
            .map(|_| {
                let service = service.clone();
                let barrier = barrier.clone();
                tokio::spawn(async move {
                    barrier.wait().await;
                    service.settings().await
                })
            })
            .collect();
        for reader in readers {
            let settings = reader.await.expect("join").expect("settings");
            assert_eq!(settings, HudSettings::default());
        }
        let stored = store
            .find(collections::SETTINGS, &FindOptions::newest_first("id", 100))
            .await
            .expect("find");
        assert_eq!(stored.len(), 1);
    }
}

#[tokio::test]
async fn social_cues_fall_back_to_raw_prompt() {
    let llm = ScriptedLLM::new("unused");
    llm.push(
        "{\"prompts\": [\"¿Qué me recomienda?\"], \
         \"common_phrases\": [\"La cuenta, por favor\"]}",
    );
    llm.push("Smile and say hola.");
    let (service, store) = service_with(llm);
    let request = SocialCuesRequest {
        situation: "ordering at a restaurant".to_string(),
        language: "es".to_string(),
        cultural_context: None,
    };

    let parsed = service.social_cues(request.clone()).await.expect("parsed");
    assert_eq!(parsed.prompts, vec!["¿Qué me recomienda?".to_string()]);
    assert!(parsed.cultural_tips.is_empty());
    assert_eq!(parsed.common_phrases, vec!["La cuenta, por favor".to_string()]);

    let fallback = service.social_cues(request).await.expect("fallback");
    assert_eq!(fallback.prompts, vec!["Smile and say hola.".to_string()]);
    assert!(fallback.cultural_tips.is_empty());
    assert!(fallback.common_phrases.is_empty());

    for collection in [
        collections::TRANSLATIONS,
        collections::RECOGNITIONS,
        collections::MEMORY,
        collections::SETTINGS,
    ] {
        assert_eq!(store.len(collection), 0);
    }
}
