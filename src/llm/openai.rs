//! OpenAI chat-completions client
//!
//! Uses a long-lived reqwest::Client for connection pooling. Every request
//! is bounded by the configured timeout.

use super::{ChatModel, FinishReason, ModelReply};
use crate::error::AgentError;
use crate::models::{ConversationMessage, Role, ToolCallRequest, ToolDefinition};
use crate::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Reusable chat-completions client (connection-pooled)
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    timeout: Duration,
}

impl OpenAiClient {
    pub fn new(api_key: String, base_url: String, model: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(8)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            timeout,
        })
    }
}

#[async_trait]
impl ChatModel for OpenAiClient {
    async fn complete(
        &self,
        messages: &[ConversationMessage],
        tools: &[ToolDefinition],
    ) -> Result<ModelReply> {
        let url = format!("{}/chat/completions", self.base_url);

        let request = ChatRequest {
            model: &self.model,
            messages: messages.iter().map(WireMessage::from).collect(),
            tools: tools.iter().map(WireTool::from).collect(),
        };

        debug!(
            model = %self.model,
            message_count = request.messages.len(),
            tool_count = request.tools.len(),
            "Calling chat completions"
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("Chat completion request failed: {}", e);
                if e.is_timeout() {
                    AgentError::LlmError(format!(
                        "Model request timed out after {}s",
                        self.timeout.as_secs()
                    ))
                } else {
                    AgentError::LlmError(format!("Model request failed: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!(%status, "Chat completion error response: {}", error_text);
            return Err(AgentError::LlmError(format!(
                "Model API returned {}: {}",
                status, error_text
            )));
        }

        let completion: ChatResponse = response.json().await.map_err(|e| {
            error!("Failed to parse chat completion: {}", e);
            AgentError::LlmError(format!("Model response parse error: {}", e))
        })?;

        if let Some(usage) = &completion.usage {
            debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "Chat completion usage"
            );
        }

        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AgentError::LlmError("No choices in model response".to_string()))?;

        let finish_reason = FinishReason::parse(choice.finish_reason.as_deref());
        info!(finish_reason = ?finish_reason, "Chat completion received");

        Ok(ModelReply {
            message: choice.message.into(),
            finish_reason,
        })
    }
}

//
// ================= Wire format =================
//

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<WireTool>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireMessage {
    role: Role,
    #[serde(default)]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<WireToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireToolCall {
    id: String,
    #[serde(rename = "type", default = "function_kind")]
    kind: String,
    function: WireFunctionCall,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireFunctionCall {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Debug, Serialize)]
struct WireTool {
    #[serde(rename = "type")]
    kind: &'static str,
    function: WireFunctionDefinition,
}

#[derive(Debug, Serialize)]
struct WireFunctionDefinition {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: WireMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

fn function_kind() -> String {
    "function".to_string()
}

impl From<&ConversationMessage> for WireMessage {
    fn from(message: &ConversationMessage) -> Self {
        let tool_calls = if message.tool_calls.is_empty() {
            None
        } else {
            Some(
                message
                    .tool_calls
                    .iter()
                    .map(|call| WireToolCall {
                        id: call.id.clone(),
                        kind: function_kind(),
                        function: WireFunctionCall {
                            name: call.name.clone(),
                            arguments: call.arguments.clone(),
                        },
                    })
                    .collect(),
            )
        };

        Self {
            role: message.role,
            content: message.content.clone(),
            tool_calls,
            tool_call_id: message.tool_call_id.clone(),
        }
    }
}

impl From<WireMessage> for ConversationMessage {
    fn from(message: WireMessage) -> Self {
        Self {
            role: message.role,
            content: message.content,
            tool_calls: message
                .tool_calls
                .unwrap_or_default()
                .into_iter()
                .map(|call| ToolCallRequest {
                    id: call.id,
                    name: call.function.name,
                    arguments: call.function.arguments,
                })
                .collect(),
            tool_call_id: message.tool_call_id,
        }
    }
}

impl From<&ToolDefinition> for WireTool {
    fn from(definition: &ToolDefinition) -> Self {
        Self {
            kind: "function",
            function: WireFunctionDefinition {
                name: definition.name.clone(),
                description: definition.description.clone(),
                parameters: definition.parameters.clone(),
            },
        }
    }
}
