//! Lead-capture tools
//!
//! `record_user_detail` and `record_unknown_question` alert the site owner
//! through the notification sink. `remember_user_details` writes to session
//! memory and sends nothing.

use super::{parse_arguments, Tool};
use crate::error::AgentError;
use crate::memory::SessionMemory;
use crate::notify::NotificationSink;
use crate::Result;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

const NAME_NOT_PROVIDED: &str = "Name not provided";
const NOTES_NOT_PROVIDED: &str = "notes not provided";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ContactArgs {
    email: String,
    name: Option<String>,
    notes: Option<String>,
}

impl ContactArgs {
    fn parse(arguments: &str) -> Result<Self> {
        let args: Self = parse_arguments(arguments)?;
        if args.email.trim().is_empty() {
            return Err(AgentError::InvalidToolInput(
                "'email' must not be empty".to_string(),
            ));
        }
        Ok(args)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct QuestionArgs {
    question: String,
}

fn contact_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "email": {
                "type": "string",
                "description": "The user's email address."
            },
            "name": {
                "type": "string",
                "description": "The user's name."
            },
            "notes": {
                "type": "string",
                "description": "Additional notes about the user."
            }
        },
        "required": ["email"],
        "additionalProperties": false
    })
}

fn or_placeholder<'a>(value: &'a Option<String>, placeholder: &'a str) -> &'a str {
    value
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or(placeholder)
}

pub struct RecordUserDetailTool {
    sink: Arc<dyn NotificationSink>,
}

impl RecordUserDetailTool {
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self { sink }
    }
}

#[async_trait::async_trait]
impl Tool for RecordUserDetailTool {
    fn name(&self) -> &'static str {
        "record_user_detail"
    }

    fn description(&self) -> &'static str {
        "Use this tool to record user details for follow-up."
    }

    fn parameters(&self) -> Value {
        contact_schema()
    }

    async fn execute(&self, arguments: &str) -> Result<Value> {
        let args = ContactArgs::parse(arguments)?;

        self.sink
            .notify(&format!(
                "New user: {}\nEmail: {}\nNotes: {}",
                or_placeholder(&args.name, NAME_NOT_PROVIDED),
                args.email,
                or_placeholder(&args.notes, NOTES_NOT_PROVIDED),
            ))
            .await;

        Ok(json!({ "recorded": "ok" }))
    }
}

pub struct RecordUnknownQuestionTool {
    sink: Arc<dyn NotificationSink>,
}

impl RecordUnknownQuestionTool {
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self { sink }
    }
}

#[async_trait::async_trait]
impl Tool for RecordUnknownQuestionTool {
    fn name(&self) -> &'static str {
        "record_unknown_question"
    }

    fn description(&self) -> &'static str {
        "Use this tool to record a question that was not understood or couldn't be answered."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "question": {
                    "type": "string",
                    "description": "The question that was not understood."
                }
            },
            "required": ["question"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, arguments: &str) -> Result<Value> {
        let args: QuestionArgs = parse_arguments(arguments)?;

        self.sink
            .notify(&format!(
                "New question: {} asked that I couldn't answer.",
                args.question
            ))
            .await;

        Ok(json!({ "recorded": "ok" }))
    }
}

pub struct RememberUserDetailsTool {
    memory: Arc<dyn SessionMemory>,
}

impl RememberUserDetailsTool {
    pub fn new(memory: Arc<dyn SessionMemory>) -> Self {
        Self { memory }
    }
}

#[async_trait::async_trait]
impl Tool for RememberUserDetailsTool {
    fn name(&self) -> &'static str {
        "remember_user_details"
    }

    fn description(&self) -> &'static str {
        "Use this tool to remember user details for future interactions."
    }

    fn parameters(&self) -> Value {
        contact_schema()
    }

    async fn execute(&self, arguments: &str) -> Result<Value> {
        let args = ContactArgs::parse(arguments)?;

        let record = self
            .memory
            .upsert(&args.email, args.name.as_deref(), args.notes.as_deref())
            .await?;

        Ok(json!({
            "status": "User details updated",
            "email": args.email,
            "name": record.name,
            "notes": record.notes,
        }))
    }
}
