//! Test helpers shared across World HUD crates.

pub mod llm;

pub use llm::{FailingLLM, FixedChatResponse, FixedLLM, RecordingChatLLM, ScriptedLLM};
