//! Core data models for the persona agent

use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder stored for a user field that has never been supplied.
pub const NOT_PROVIDED: &str = "not provided";

//
// ================= Conversation =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// One entry of the ordered dialogue sequence sent to the model.
///
/// Assistant turns may carry pending `tool_calls`; tool turns carry the
/// `tool_call_id` of the request that produced them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConversationMessage {
    pub role: Role,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCallRequest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ConversationMessage {
    fn text(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::text(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::text(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::text(Role::Assistant, content)
    }

    /// Assistant turn requesting tool invocations
    pub fn assistant_tool_calls(content: Option<String>, tool_calls: Vec<ToolCallRequest>) -> Self {
        Self {
            role: Role::Assistant,
            content,
            tool_calls,
            tool_call_id: None,
        }
    }

    pub fn tool(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: Some(tool_call_id.into()),
        }
    }

    pub fn text_content(&self) -> &str {
        self.content.as_deref().unwrap_or_default()
    }
}

//
// ================= Tool I/O =================
//

/// A tool invocation requested by the model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolCallRequest {
    /// Opaque identifier, unique within one model reply
    pub id: String,
    pub name: String,
    /// JSON-encoded argument object, exactly as the model produced it
    pub arguments: String,
}

impl ToolCallRequest {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }
}

/// Advertised shape of a tool: what the model sees.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON schema of the argument object
    pub parameters: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolResult {
    pub call_id: String,
    pub tool_name: String,
    pub content: serde_json::Value,
    pub is_error: bool,
}

impl ToolResult {
    pub fn success(call_id: impl Into<String>, tool_name: impl Into<String>, content: serde_json::Value) -> Self {
        Self {
            call_id: call_id.into(),
            tool_name: tool_name.into(),
            content,
            is_error: false,
        }
    }

    pub fn failure(call_id: impl Into<String>, tool_name: impl Into<String>, error: impl fmt::Display) -> Self {
        Self {
            call_id: call_id.into(),
            tool_name: tool_name.into(),
            content: serde_json::json!({ "error": error.to_string() }),
            is_error: true,
        }
    }

    /// Wrap into the `tool` message folded back into the dialogue
    pub fn into_message(self) -> ConversationMessage {
        ConversationMessage::tool(self.call_id, self.content.to_string())
    }
}

//
// ================= Session Memory =================
//

/// Facts remembered about one visitor, keyed by email in the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserRecord {
    pub name: String,
    pub notes: String,
}

impl Default for UserRecord {
    fn default() -> Self {
        Self {
            name: NOT_PROVIDED.to_string(),
            notes: NOT_PROVIDED.to_string(),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tool_result_message_keeps_call_id() {
        let message = ToolResult::success("call_1", "record_unknown_question", json!({"recorded": "ok"}))
            .into_message();

        assert_eq!(message.role, Role::Tool);
        assert_eq!(message.tool_call_id.as_deref(), Some("call_1"));
        assert_eq!(message.text_content(), r#"{"recorded":"ok"}"#);
    }

    #[test]
    fn test_failure_is_error_shaped() {
        let result = ToolResult::failure("call_2", "remember_user_details", "missing field `email`");
        assert!(result.is_error);
        assert_eq!(result.content["error"], "missing field `email`");
    }

    #[test]
    fn test_default_user_record_uses_placeholders() {
        let record = UserRecord::default();
        assert_eq!(record.name, NOT_PROVIDED);
        assert_eq!(record.notes, NOT_PROVIDED);
    }
}
