use async_trait::async_trait;
use autoagents_llm::chat::{
    ChatMessage, ChatProvider, ChatResponse, StructuredOutputFormat, Tool,
};
use autoagents_llm::completion::{CompletionProvider, CompletionRequest, CompletionResponse};
use autoagents_llm::embedding::EmbeddingProvider;
use autoagents_llm::error::LLMError;
use autoagents_llm::models::ModelsProvider;
use autoagents_llm::{LLMProvider, ToolCall};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct FixedChatResponse {
    text: Option<String>,
}

impl FixedChatResponse {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
        }
    }

    /// A response that carries no text at all.
    pub fn empty() -> Self {
        Self { text: None }
    }
}

impl std::fmt::Display for FixedChatResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.text.as_deref().unwrap_or_default())
    }
}

impl ChatResponse for FixedChatResponse {
    fn text(&self) -> Option<String> {
        self.text.clone()
    }

    fn tool_calls(&self) -> Option<Vec<ToolCall>> {
        None
    }
}

/// Provider that answers every chat with the same text.
#[derive(Debug, Clone)]
pub struct FixedLLM {
    response: String,
}

impl FixedLLM {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
        }
    }
}

#[async_trait]
impl ChatProvider for FixedLLM {
    async fn chat_with_tools(
        &self,
        _messages: &[ChatMessage],
        _tools: Option<&[Tool]>,
        _json_schema: Option<StructuredOutputFormat>,
    ) -> Result<Box<dyn ChatResponse>, LLMError> {
        Ok(Box::new(FixedChatResponse::new(self.response.clone())))
    }
}

/// Provider that replays queued responses in order, then falls back to a
/// default. Queued `None` entries produce a response without text.
#[derive(Debug, Clone)]
pub struct ScriptedLLM {
    queue: Arc<Mutex<VecDeque<Option<String>>>>,
    fallback: String,
}

impl ScriptedLLM {
    pub fn new(fallback: impl Into<String>) -> Self {
        Self {
            queue: Arc::new(Mutex::new(VecDeque::new())),
            fallback: fallback.into(),
        }
    }

    /// Queue the next response text.
    pub fn push(&self, response: impl Into<String>) {
        self.queue.lock().push_back(Some(response.into()));
    }

    /// Queue a response that carries no text.
    pub fn push_empty(&self) {
        self.queue.lock().push_back(None);
    }
}

#[async_trait]
impl ChatProvider for ScriptedLLM {
    async fn chat_with_tools(
        &self,
        _messages: &[ChatMessage],
        _tools: Option<&[Tool]>,
        _json_schema: Option<StructuredOutputFormat>,
    ) -> Result<Box<dyn ChatResponse>, LLMError> {
        let next = self
            .queue
            .lock()
            .pop_front()
            .unwrap_or_else(|| Some(self.fallback.clone()));
        match next {
            Some(text) => Ok(Box::new(FixedChatResponse::new(text))),
            None => Ok(Box::new(FixedChatResponse::empty())),
        }
    }
}

/// Provider that records the messages of every chat call.
#[derive(Debug, Clone)]
pub struct RecordingChatLLM {
    response: String,
    pub last_messages: Arc<Mutex<Vec<ChatMessage>>>,
    pub calls: Arc<Mutex<usize>>,
}

impl RecordingChatLLM {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            last_messages: Arc::new(Mutex::new(Vec::new())),
            calls: Arc::new(Mutex::new(0)),
        }
    }
}

#[async_trait]
impl ChatProvider for RecordingChatLLM {
    async fn chat_with_tools(
        &self,
        messages: &[ChatMessage],
        _tools: Option<&[Tool]>,
        _json_schema: Option<StructuredOutputFormat>,
    ) -> Result<Box<dyn ChatResponse>, LLMError> {
        *self.last_messages.lock() = messages.to_vec();
        *self.calls.lock() += 1;
        Ok(Box::new(FixedChatResponse::new(self.response.clone())))
    }
}

/// Provider whose every call fails with a provider error.
#[derive(Debug, Clone)]
pub struct FailingLLM {
    message: String,
}

impl FailingLLM {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl ChatProvider for FailingLLM {
    async fn chat_with_tools(
        &self,
        _messages: &[ChatMessage],
        _tools: Option<&[Tool]>,
        _json_schema: Option<StructuredOutputFormat>,
    ) -> Result<Box<dyn ChatResponse>, LLMError> {
        Err(LLMError::ProviderError(self.message.clone()))
    }
}

/// Implements the non-chat provider traits for a mock that only answers chat
/// requests. Completion and embedding calls fail with a provider error.
macro_rules! chat_only {
    ($($mock:ty),+ $(,)?) => {$(
        #[async_trait]
        impl CompletionProvider for $mock {
            async fn complete(
                &self,
                _req: &CompletionRequest,
                _json_schema: Option<StructuredOutputFormat>,
            ) -> Result<CompletionResponse, LLMError> {
                Err(unsupported("completion"))
            }
        }

        #[async_trait]
        impl EmbeddingProvider for $mock {
            async fn embed(&self, _input: Vec<String>) -> Result<Vec<Vec<f32>>, LLMError> {
                Err(unsupported("embedding"))
            }
        }

        #[async_trait]
        impl ModelsProvider for $mock {}

        impl LLMProvider for $mock {}
    )+};
}

fn unsupported(capability: &str) -> LLMError {
    LLMError::ProviderError(format!("{capability} is not supported by chat mocks"))
}

chat_only!(FixedLLM, ScriptedLLM, RecordingChatLLM, FailingLLM);
