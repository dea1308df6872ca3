//! Model backend
//!
//! The orchestrator talks to the language model only through [`ChatModel`].
//! `openai` is the production backend; [`ScriptedModel`] replays canned
//! replies so the turn loop can run without network access.

use crate::error::AgentError;
use crate::models::{ConversationMessage, ToolCallRequest, ToolDefinition};
use crate::Result;
use async_trait::async_trait;
use std::collections::VecDeque;
use tokio::sync::Mutex;

pub mod openai;
pub use openai::OpenAiClient;

/// Why the model stopped generating
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    ToolCalls,
    Length,
    ContentFilter,
    Other(String),
}

impl FinishReason {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("stop") => FinishReason::Stop,
            Some("tool_calls") => FinishReason::ToolCalls,
            Some("length") => FinishReason::Length,
            Some("content_filter") => FinishReason::ContentFilter,
            Some(other) => FinishReason::Other(other.to_string()),
            None => FinishReason::Other("none".to_string()),
        }
    }
}

/// One assistant turn returned by the backend
#[derive(Debug, Clone, PartialEq)]
pub struct ModelReply {
    pub message: ConversationMessage,
    pub finish_reason: FinishReason,
}

impl ModelReply {
    /// Final answer
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            message: ConversationMessage::assistant(content),
            finish_reason: FinishReason::Stop,
        }
    }

    /// Request to invoke tools
    pub fn tool_calls(calls: Vec<ToolCallRequest>) -> Self {
        Self {
            message: ConversationMessage::assistant_tool_calls(None, calls),
            finish_reason: FinishReason::ToolCalls,
        }
    }
}

/// Trait for chat-completion backends
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(
        &self,
        messages: &[ConversationMessage],
        tools: &[ToolDefinition],
    ) -> Result<ModelReply>;
}

/// Backend that answers from a fixed queue of replies.
/// Every request it receives is kept for inspection.
pub struct ScriptedModel {
    replies: Mutex<VecDeque<ModelReply>>,
    requests: Mutex<Vec<Vec<ConversationMessage>>>,
}

impl ScriptedModel {
    pub fn new(replies: Vec<ModelReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Message sequences received so far, one per `complete` call
    pub async fn requests(&self) -> Vec<Vec<ConversationMessage>> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn complete(
        &self,
        messages: &[ConversationMessage],
        _tools: &[ToolDefinition],
    ) -> Result<ModelReply> {
        self.requests.lock().await.push(messages.to_vec());

        self.replies
            .lock()
            .await
            .pop_front()
            .ok_or_else(|| AgentError::LlmError("Scripted model has no replies left".to_string()))
    }
}
