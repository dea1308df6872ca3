//! Tool trait, registry and dispatch
//!
//! The registry is built once at startup and handed to the orchestrator;
//! it never changes afterwards. Everything the model may call is advertised
//! from here, and every call it makes is dispatched from here.

pub mod lead;

pub use lead::{RecordUnknownQuestionTool, RecordUserDetailTool, RememberUserDetailsTool};

use crate::error::AgentError;
use crate::memory::SessionMemory;
use crate::models::{ToolCallRequest, ToolDefinition, ToolResult};
use crate::notify::NotificationSink;
use crate::Result;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Trait for a single callable tool
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    /// JSON schema of the argument object
    fn parameters(&self) -> Value;
    /// Run with the raw JSON argument payload from the model
    async fn execute(&self, arguments: &str) -> Result<Value>;
}

/// Tool registry for advertising and dispatching tools
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    by_name: HashMap<&'static str, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: Vec::new(),
            by_name: HashMap::new(),
        }
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<()> {
        let name = tool.name();
        if self.by_name.contains_key(name) {
            return Err(AgentError::Config(format!(
                "Tool '{}' registered twice",
                name
            )));
        }

        self.by_name.insert(name, self.tools.len());
        self.tools.push(tool);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.by_name.get(name).map(|&i| self.tools[i].clone())
    }

    pub fn list(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    /// Definitions handed to the model, in registration order
    pub fn advertise(&self) -> Vec<ToolDefinition> {
        self.tools
            .iter()
            .map(|tool| ToolDefinition {
                name: tool.name().to_string(),
                description: tool.description().to_string(),
                parameters: tool.parameters(),
            })
            .collect()
    }

    /// Run the requested calls one at a time, in order.
    ///
    /// Returns exactly one result per request, tagged with its call id.
    /// Argument and tool failures become error-shaped results; only an
    /// unknown tool name fails the batch, and it does so before any tool runs.
    pub async fn dispatch(&self, requests: &[ToolCallRequest]) -> Result<Vec<ToolResult>> {
        let resolved = requests
            .iter()
            .map(|request| {
                self.get(&request.name)
                    .map(|tool| (request, tool))
                    .ok_or_else(|| AgentError::ToolNotFound(request.name.clone()))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut results = Vec::with_capacity(resolved.len());

        for (request, tool) in resolved {
            let start = Instant::now();

            let result = match tool.execute(&request.arguments).await {
                Ok(content) => ToolResult::success(&request.id, &request.name, content),
                Err(e) => {
                    warn!(
                        call_id = %request.id,
                        tool_name = %request.name,
                        error = %e,
                        "Tool call failed"
                    );
                    ToolResult::failure(&request.id, &request.name, e)
                }
            };

            info!(
                call_id = %request.id,
                tool_name = %request.name,
                is_error = result.is_error,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Tool called"
            );

            results.push(result);
        }

        Ok(results)
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode a tool argument payload into its typed form.
///
/// An empty payload is read as `{}` so that missing required fields are
/// reported by name.
pub fn parse_arguments<T: DeserializeOwned>(arguments: &str) -> Result<T> {
    let raw = match arguments.trim() {
        "" => "{}",
        trimmed => trimmed,
    };

    serde_json::from_str(raw).map_err(|e| AgentError::InvalidToolInput(e.to_string()))
}

/// Registry with the three lead-capture tools.
pub fn create_default_registry(
    memory: Arc<dyn SessionMemory>,
    sink: Arc<dyn NotificationSink>,
) -> Result<ToolRegistry> {
    let mut registry = ToolRegistry::new();

    registry.register(Arc::new(RecordUserDetailTool::new(sink.clone())))?;
    registry.register(Arc::new(RecordUnknownQuestionTool::new(sink)))?;
    registry.register(Arc::new(RememberUserDetailsTool::new(memory)))?;

    Ok(registry)
}
