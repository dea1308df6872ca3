//! Error types for the persona agent

use thiserror::Error;

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;

#[derive(Error, Debug)]
pub enum AgentError {

    // =============================
    // Startup
    // =============================

    #[error("Configuration error: {0}")]
    Config(String),

    // =============================
    // Tool Dispatch
    // =============================

    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Invalid tool input: {0}")]
    InvalidToolInput(String),

    #[error("Tool error: {0}")]
    ToolError(String),

    // =============================
    // Turn Loop
    // =============================

    #[error("LLM error: {0}")]
    LlmError(String),

    #[error("tool-call loop exceeded {0} iterations")]
    ToolLoopExceeded(usize),

    // =============================
    // External Library Conversions
    // =============================

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
