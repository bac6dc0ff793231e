//! Prompt templates for each capability.

use crate::languages::language_name;

/// System and user prompt pair for one gateway call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptPair {
    pub system: String,
    pub user: String,
}

pub fn translation(text: &str, source_code: &str, target_code: &str) -> PromptPair {
    let source = language_name(source_code);
    let target = language_name(target_code);
    let system = format!(
        "You are an expert translator specializing in natural, conversational translations.\n\
         Translate from {source} to {target}.\n\
         Provide only the translation, no explanations.\n\
         Maintain the tone and style of the original text.\n\
         For Mexican Spanish, use appropriate regional vocabulary and expressions."
    );
    PromptPair {
        system,
        user: format!("Translate this text: {text}"),
    }
}

const RECOGNITION_SYSTEM: &str = r#"You are an advanced visual AI assistant for an XR HUD system.
Analyze the image and provide:
1. A list of objects detected with their descriptions
2. A comprehensive description of the scene
3. Useful suggestions or information about the objects

Respond in JSON format:
{
    "objects": [{"name": "object_name", "description": "brief description", "confidence": "high/medium/low"}],
    "scene_description": "overall scene description",
    "suggestions": ["suggestion 1", "suggestion 2"]
}"#;

pub fn recognition(context: Option<&str>) -> PromptPair {
    let context_hint = context
        .filter(|context| !context.is_empty())
        .map(|context| format!("\nAdditional context: {context}"))
        .unwrap_or_default();
    PromptPair {
        system: RECOGNITION_SYSTEM.to_string(),
        user: format!(
            "Analyze this image and identify all objects, provide descriptions and useful information.{context_hint}"
        ),
    }
}

pub fn social_cues(
    situation: &str,
    language_code: &str,
    cultural_context: Option<&str>,
) -> PromptPair {
    let target = language_name(language_code);
    let system = format!(
        r#"You are a cultural and social expert helping someone communicate in {target}.
Provide helpful conversation prompts, cultural tips, and common phrases.
Be practical and culturally sensitive.

Respond in JSON format:
{{
    "prompts": ["prompt 1", "prompt 2", "prompt 3"],
    "cultural_tips": ["tip 1", "tip 2"],
    "common_phrases": ["phrase 1 (translation)", "phrase 2 (translation)"]
}}"#
    );
    let context = cultural_context
        .filter(|context| !context.is_empty())
        .map(|context| format!(" Cultural context: {context}"))
        .unwrap_or_default();
    PromptPair {
        system,
        user: format!(
            "I'm in this situation: {situation}. Help me communicate effectively in {target}.{context}"
        ),
    }
}
