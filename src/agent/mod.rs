//! Conversation orchestrator - the tool-augmented turn loop
//!
//! BUILD_CONTEXT → AWAIT_MODEL → (DISPATCH_TOOLS → AWAIT_MODEL)* → DONE
//!
//! Within one turn the message sequence only ever grows: every model call
//! sees everything the previous call saw, plus what was appended since.

use crate::config::{Settings, DEFAULT_MAX_TOOL_ITERATIONS};
use crate::error::AgentError;
use crate::llm::{ChatModel, FinishReason, OpenAiClient};
use crate::memory::{InMemorySessionStore, SessionMemory};
use crate::models::{ConversationMessage, ToolResult};
use crate::notify::PushoverSink;
use crate::persona::Persona;
use crate::tools::{create_default_registry, ToolRegistry};
use crate::Result;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Final answer of a turn together with the full message sequence it produced
#[derive(Debug, Clone)]
pub struct TurnTranscript {
    pub answer: String,
    pub messages: Vec<ConversationMessage>,
}

/// Main orchestrator that runs one conversation turn at a time
pub struct Orchestrator {
    model: Arc<dyn ChatModel>,
    registry: ToolRegistry,
    memory: Arc<dyn SessionMemory>,
    persona: Persona,
    max_iterations: usize,
}

impl Orchestrator {
    pub fn new(
        model: Arc<dyn ChatModel>,
        registry: ToolRegistry,
        memory: Arc<dyn SessionMemory>,
        persona: Persona,
    ) -> Self {
        Self {
            model,
            registry,
            memory,
            persona,
            max_iterations: DEFAULT_MAX_TOOL_ITERATIONS,
        }
    }

    /// Production wiring: OpenAI backend, Pushover sink, in-memory session store
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let persona = Persona::load(
            &settings.persona_name,
            &settings.profile_path,
            &settings.biography_path,
        )?;

        let model = Arc::new(OpenAiClient::new(
            settings.openai_api_key.clone(),
            settings.openai_base_url.clone(),
            settings.openai_model.clone(),
            settings.model_timeout,
        )?);
        let sink = Arc::new(PushoverSink::new(
            settings.pushover_url.clone(),
            settings.pushover_user.clone(),
            settings.pushover_token.clone(),
            settings.notify_timeout,
        )?);
        let memory = Arc::new(InMemorySessionStore::new());
        let registry = create_default_registry(memory.clone(), sink)?;

        info!(
            persona = %persona.name,
            model = %settings.openai_model,
            tools = ?registry.list(),
            max_iterations = settings.max_tool_iterations,
            "Orchestrator initialized"
        );

        Ok(Self::new(model, registry, memory, persona)
            .with_max_iterations(settings.max_tool_iterations))
    }

    /// Cap on model calls per turn (at least one)
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    pub fn persona(&self) -> &Persona {
        &self.persona
    }

    /// Answer `user_message` given the prior dialogue
    pub async fn converse(
        &self,
        user_message: &str,
        history: Vec<ConversationMessage>,
    ) -> Result<String> {
        self.converse_transcript(user_message, history)
            .await
            .map(|transcript| transcript.answer)
    }

    /// Same as [`converse`](Self::converse), also returning every message of the turn
    pub async fn converse_transcript(
        &self,
        user_message: &str,
        history: Vec<ConversationMessage>,
    ) -> Result<TurnTranscript> {
        let turn_id = Uuid::new_v4();
        let start_time = Instant::now();

        info!(
            turn_id = %turn_id,
            history_len = history.len(),
            "Turn started"
        );

        // === BUILD_CONTEXT ===
        let mut messages = self.build_context(user_message, history).await?;
        let tools = self.registry.advertise();

        for iteration in 1..=self.max_iterations {
            // === AWAIT_MODEL ===
            debug!(
                turn_id = %turn_id,
                iteration,
                message_count = messages.len(),
                "Awaiting model"
            );

            let reply = self.model.complete(&messages, &tools).await?;

            match reply.finish_reason {
                FinishReason::ToolCalls => {
                    // === DISPATCH_TOOLS ===
                    if reply.message.tool_calls.is_empty() {
                        return Err(AgentError::LlmError(
                            "Model finished with tool_calls but requested no tools".to_string(),
                        ));
                    }

                    let calls = reply.message.tool_calls.clone();
                    messages.push(reply.message);

                    info!(
                        turn_id = %turn_id,
                        iteration,
                        tools = ?calls.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
                        "Dispatching tool calls"
                    );

                    let results = self.registry.dispatch(&calls).await?;
                    messages.extend(results.into_iter().map(ToolResult::into_message));
                }
                finish_reason => {
                    // === DONE ===
                    if finish_reason != FinishReason::Stop {
                        warn!(turn_id = %turn_id, ?finish_reason, "Model stopped early");
                    }

                    let answer = reply.message.text_content().to_string();
                    if answer.is_empty() {
                        warn!(turn_id = %turn_id, "Model returned an empty answer");
                    }
                    messages.push(reply.message);

                    info!(
                        turn_id = %turn_id,
                        iterations = iteration,
                        elapsed_ms = start_time.elapsed().as_millis() as u64,
                        "Turn complete"
                    );

                    return Ok(TurnTranscript { answer, messages });
                }
            }
        }

        warn!(
            turn_id = %turn_id,
            max_iterations = self.max_iterations,
            "Tool-call loop limit reached"
        );

        Err(AgentError::ToolLoopExceeded(self.max_iterations))
    }

    /// System instruction, then the history verbatim, then the new user message
    async fn build_context(
        &self,
        user_message: &str,
        history: Vec<ConversationMessage>,
    ) -> Result<Vec<ConversationMessage>> {
        let user_details = self.memory.formatted_details().await?;

        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ConversationMessage::system(
            self.persona.system_prompt(&user_details),
        ));
        messages.extend(history);
        messages.push(ConversationMessage::user(user_message));

        Ok(messages)
    }
}
