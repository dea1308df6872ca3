//! Persona Agent
//!
//! A chat agent that answers questions on behalf of a named person:
//! - Speaks in character, grounded in their profile and biography
//! - Lets the model call lead-capture tools mid-conversation
//! - Remembers visitor details for the lifetime of the process
//! - Alerts the site owner about new leads and unanswered questions
//!
//! TURN LOOP:
//! BUILD_CONTEXT → AWAIT_MODEL → (DISPATCH_TOOLS → AWAIT_MODEL)* → DONE

pub mod agent;
pub mod api;
pub mod config;
pub mod error;
pub mod llm;
pub mod memory;
pub mod models;
pub mod notify;
pub mod persona;
pub mod tools;

pub use error::Result;

// Re-export common types
pub use models::*;
pub use agent::{Orchestrator, TurnTranscript};
pub use config::Settings;
